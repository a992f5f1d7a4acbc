use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;
use uuid::Uuid;

use newsdesk_db::models::UserRow;
use newsdesk_media::UploadOptions;
use newsdesk_types::api::{ArticleStatus, CreateArticleRequest, UpdateArticleRequest};
use newsdesk_types::content::{ContentBlock, TypedBlock, is_file_placeholder};
use newsdesk_types::envelope::Envelope;

use crate::convert::article_view;
use crate::error::{ApiError, blocking};
use crate::middleware::optional_auth;
use crate::state::AppState;

struct FilePart {
    bytes: Bytes,
    content_type: Option<String>,
    filename: Option<String>,
}

/// Accepts JSON or multipart/form-data. Author resolution: a valid bearer
/// token wins; without one, a JSON payload may name an `author` id (trusted
/// callers and tests); neither is a 401.
pub async fn create_article(
    State(state): State<AppState>,
    req: Request,
) -> Result<impl IntoResponse, ApiError> {
    let token_user = resolve_token_user(&state, req.headers()).await?;

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (mut payload, files) = if content_type.starts_with("multipart/form-data") {
        read_multipart(req).await?
    } else {
        let Json(body) = Json::<CreateArticleRequest>::from_request(req, &())
            .await
            .map_err(|e| ApiError::validation(format!("Invalid JSON body: {e}")))?;
        (body, HashMap::new())
    };
    payload.title = payload.title.trim().to_string();

    if payload.title.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    let blocks = parse_content(payload.content.take())?;

    let author = match token_user {
        Some(user) => user,
        None => match payload.author.as_deref() {
            Some(author_id) if !author_id.is_empty() => {
                let db = state.clone();
                let author_id = author_id.to_string();
                blocking(move || {
                    db.db
                        .get_user_by_id(&author_id)
                        .map_err(|e| ApiError::internal("Failed to create article", e))
                })
                .await?
                .ok_or_else(|| {
                    ApiError::validation("Author id provided but user not found")
                })?
            }
            _ => {
                return Err(ApiError::unauthorized(
                    "Author not specified and token not provided",
                ));
            }
        },
    };

    let mut media = seed_media(payload.media.take());
    let mut processed = Vec::with_capacity(blocks.len());
    for block in blocks {
        match block {
            ContentBlock::Typed(TypedBlock::Paragraph { value }) => {
                processed.push(ContentBlock::paragraph(value));
            }
            ContentBlock::Typed(TypedBlock::Image { value, caption }) => {
                match files.get(&value) {
                    Some(part) if is_file_placeholder(&value) => {
                        let opts = UploadOptions {
                            folder: Some(format!("articles/{}", author.id)),
                            filename: part.filename.clone(),
                            content_type: part.content_type.clone(),
                        };
                        // Best-effort by design: a failed upload leaves an
                        // empty image block, it does not fail the create.
                        match state.media.upload(part.bytes.clone(), opts).await {
                            Ok(asset) => {
                                media.push(asset.url.clone());
                                processed.push(ContentBlock::image(asset.url, caption));
                            }
                            Err(e) => {
                                warn!("article image upload failed: {}", e);
                                processed.push(ContentBlock::image("", caption));
                            }
                        }
                    }
                    _ => {
                        if !value.is_empty() {
                            media.push(value.clone());
                        }
                        processed.push(ContentBlock::image(value, caption));
                    }
                }
            }
            // unknown object blocks pass through; non-objects are dropped
            ContentBlock::Unknown(v) => {
                if v.is_object() {
                    processed.push(ContentBlock::Unknown(v));
                }
            }
        }
    }

    let content_json = serde_json::to_string(&processed)
        .map_err(|e| ApiError::internal("Failed to create article", e))?;
    let media_json = serde_json::to_string(&media)
        .map_err(|e| ApiError::internal("Failed to create article", e))?;

    let article_id = Uuid::new_v4().to_string();
    let db = state.clone();
    let row = {
        let article_id = article_id.clone();
        blocking(move || {
            db.db
                .create_article(
                    &article_id,
                    &payload.title,
                    &content_json,
                    &author.id,
                    &media_json,
                    &payload.category,
                    false,
                    ArticleStatus::Draft.as_str(),
                )
                .map_err(|e| ApiError::internal("Failed to create article", e))?;
            db.db
                .get_article(&article_id)
                .map_err(|e| ApiError::internal("Failed to create article", e))?
                .ok_or_else(|| {
                    ApiError::internal("Failed to create article", "row missing after insert")
                })
        })
        .await?
    };

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with(
            "Article created",
            json!({ "article": article_view(&row) }),
        )),
    ))
}

pub async fn get_articles(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || {
        db.db
            .list_articles()
            .map_err(|e| ApiError::internal("Failed to fetch articles", e))
    })
    .await?;
    Ok(Json(articles_envelope(&rows)))
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

pub async fn get_article_by_id(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("Article id required"))?;

    let db = state.clone();
    let row = blocking(move || {
        db.db
            .get_article(&id)
            .map_err(|e| ApiError::internal("Failed to fetch article", e))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("Article not found"))?;

    Ok(Json(Envelope::data(
        json!({ "article": article_view(&row) }),
    )))
}

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

pub async fn get_articles_by_category(
    State(state): State<AppState>,
    Query(query): Query<CategoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // An empty category is a legal filter; only a missing parameter is an error.
    let category = query
        .category
        .ok_or_else(|| ApiError::validation("Category required"))?;

    let db = state.clone();
    let rows = blocking(move || {
        db.db
            .list_articles_by_category(&category)
            .map_err(|e| ApiError::internal("Failed to fetch articles", e))
    })
    .await?;
    Ok(Json(articles_envelope(&rows)))
}

#[derive(Debug, Deserialize)]
pub struct AuthorQuery {
    pub author: Option<String>,
}

pub async fn get_articles_by_author(
    State(state): State<AppState>,
    Query(query): Query<AuthorQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let author = query
        .author
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::validation("Author id required"))?;

    let db = state.clone();
    let rows = blocking(move || {
        db.db
            .list_articles_by_author(&author)
            .map_err(|e| ApiError::internal("Failed to fetch articles", e))
    })
    .await?;
    Ok(Json(articles_envelope(&rows)))
}

/// Partial update. Only keys present in the body are touched, and an
/// empty/falsy incoming value keeps the existing one — a field cannot be
/// cleared through this endpoint (long-standing behavior the frontend relies
/// on; see DESIGN.md). `published` is the exception: any present value is
/// applied by truthiness.
pub async fn update_article(
    State(state): State<AppState>,
    body: Result<Json<UpdateArticleRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::validation(format!("Invalid JSON body: {e}")))?;

    let id = req
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("Article id is required"))?;

    if let Some(status) = req.status.as_deref() {
        if !status.is_empty() && status.parse::<ArticleStatus>().is_err() {
            return Err(ApiError::validation("Invalid status"));
        }
    }

    let db = state.clone();
    let row = blocking(move || {
        let current = db
            .db
            .get_article(&id)
            .map_err(|e| ApiError::internal("Failed to update article", e))?
            .ok_or_else(|| ApiError::not_found("Article not found"))?;

        let title = match req.title {
            Some(t) if !t.is_empty() => t,
            _ => current.title,
        };
        let content = match req.content {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(v @ (Value::Array(_) | Value::Object(_))) => serde_json::to_string(&v)
                .map_err(|e| ApiError::internal("Failed to update article", e))?,
            _ => current.content,
        };
        let media = match req.media {
            Some(Value::Array(items)) if !items.is_empty() => {
                serde_json::to_string(&items)
                    .map_err(|e| ApiError::internal("Failed to update article", e))?
            }
            _ => current.media,
        };
        let category = match req.category {
            Some(c) if !c.is_empty() => c,
            _ => current.category,
        };
        let published = match &req.published {
            Some(v) => truthy(v),
            None => current.published,
        };
        let status = match req.status {
            Some(s) if !s.is_empty() => s,
            _ => current.status,
        };

        db.db
            .update_article(&id, &title, &content, &media, &category, published, &status)
            .map_err(|e| ApiError::internal("Failed to update article", e))?;

        db.db
            .get_article(&id)
            .map_err(|e| ApiError::internal("Failed to update article", e))?
            .ok_or_else(|| ApiError::not_found("Article not found"))
    })
    .await?;

    Ok(Json(Envelope::with(
        "Article updated",
        json!({ "article": article_view(&row) }),
    )))
}

/// Hard delete; the id comes from the query string or a JSON body.
pub async fn delete_article(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = query
        .id
        .filter(|id| !id.is_empty())
        .or_else(|| {
            body.ok().and_then(|Json(v)| {
                v.get("id").and_then(|id| id.as_str()).map(String::from)
            })
        })
        .ok_or_else(|| ApiError::validation("Article id required"))?;

    let db = state.clone();
    let deleted = blocking(move || {
        db.db
            .delete_article(&id)
            .map_err(|e| ApiError::internal("Failed to delete article", e))
    })
    .await?;

    if !deleted {
        return Err(ApiError::not_found("Article not found"));
    }
    Ok(Json(Envelope::message("Article deleted")))
}

// -- helpers --

async fn resolve_token_user(
    state: &AppState,
    headers: &axum::http::HeaderMap,
) -> Result<Option<UserRow>, ApiError> {
    // An unverifiable token falls through to payload author resolution; a
    // verified token whose user is gone is a hard 401.
    let Some(auth) = optional_auth(state, headers) else {
        return Ok(None);
    };

    let db = state.clone();
    let user = blocking(move || {
        db.db
            .get_user_by_id(&auth.user_id)
            .map_err(|e| ApiError::internal("Failed to create article", e))
    })
    .await?
    .ok_or_else(|| ApiError::unauthorized("Token user not found"))?;

    Ok(Some(user))
}

async fn read_multipart(
    req: Request,
) -> Result<(CreateArticleRequest, HashMap<String, FilePart>), ApiError> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(|_| ApiError::validation("Invalid multipart body"))?;

    let mut payload = CreateArticleRequest {
        title: String::new(),
        content: None,
        category: String::new(),
        media: None,
        author: None,
    };
    let mut files = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            let filename = field.file_name().map(|s| s.to_string());
            let content_type = field.content_type().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?;
            files.insert(
                name,
                FilePart {
                    bytes,
                    content_type,
                    filename,
                },
            );
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?;
            match name.as_str() {
                "title" => payload.title = text,
                "content" => payload.content = Some(Value::String(text)),
                "category" => payload.category = text,
                "media" => payload.media = Some(Value::String(text)),
                _ => {}
            }
        }
    }

    Ok((payload, files))
}

fn parse_content(content: Option<Value>) -> Result<Vec<ContentBlock>, ApiError> {
    let value = match content {
        Some(Value::String(s)) => {
            if s.is_empty() {
                return Err(ApiError::validation("Content is required"));
            }
            serde_json::from_str::<Value>(&s)
                .map_err(|e| ApiError::validation(format!("Invalid content JSON: {e}")))?
        }
        Some(v) => v,
        None => return Err(ApiError::validation("Content is required")),
    };

    if !value.is_array() {
        return Err(ApiError::validation("Content must be a JSON array of blocks"));
    }

    serde_json::from_value(value)
        .map_err(|e| ApiError::validation(format!("Invalid content JSON: {e}")))
}

fn seed_media(media: Option<Value>) -> Vec<String> {
    match media {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        Some(Value::String(s)) => serde_json::from_str(&s).unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn articles_envelope(rows: &[newsdesk_db::models::ArticleRow]) -> Envelope {
    let articles: Vec<_> = rows.iter().map(article_view).collect();
    let total = articles.len();
    Envelope::data(json!({ "articles": articles, "total": total }))
}

/// Python-style truthiness, kept for the `published` coercion the frontend
/// depends on.
fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
