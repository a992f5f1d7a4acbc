use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use newsdesk_types::api::{AddCommentRequest, CountsRequest, InteractionRequest, InteractionState};
use newsdesk_types::envelope::Envelope;

use crate::convert::comment_view;
use crate::error::{ApiError, blocking};
use crate::state::AppState;

pub async fn add_like(
    State(state): State<AppState>,
    body: Result<Json<InteractionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::validation("Invalid JSON body"))?;
    let (article_id, user_id) = require_pair(req.article_id.as_deref(), req.user_id())?;

    let db = state.clone();
    let interaction_id = Uuid::new_v4().to_string();
    let (article_id, liked, likes_count) = blocking(move || {
        ensure_pair_exists(&db, &article_id, &user_id)?;

        let liked = db
            .db
            .toggle_like(&interaction_id, &article_id, &user_id)
            .map_err(|e| ApiError::internal("Failed to toggle like", e))?;
        let (likes_count, _) = db
            .db
            .interaction_counts(&article_id)
            .map_err(|e| ApiError::internal("Failed to toggle like", e))?;
        Ok((article_id, liked, likes_count))
    })
    .await?;

    let action = if liked { "liked" } else { "unliked" };
    Ok(Json(Envelope::with(
        format!("Article {action} successfully"),
        json!({ "article_id": article_id, "liked": liked, "likes_count": likes_count }),
    )))
}

pub async fn add_comment(
    State(state): State<AppState>,
    body: Result<Json<AddCommentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::validation("Invalid JSON body"))?;
    let (article_id, user_id) = require_pair(req.article_id.as_deref(), req.user_id())?;

    let comment = req.comment.trim().to_string();
    if comment.is_empty() {
        return Err(ApiError::validation("Comment text is required"));
    }

    let db = state.clone();
    let interaction_id = Uuid::new_v4().to_string();
    let (article_id, comment, comment_id, comments_count) = blocking(move || {
        ensure_pair_exists(&db, &article_id, &user_id)?;

        let comment_id = db
            .db
            .upsert_comment(&interaction_id, &article_id, &user_id, &comment)
            .map_err(|e| ApiError::internal("Failed to add comment", e))?;
        let (_, comments_count) = db
            .db
            .interaction_counts(&article_id)
            .map_err(|e| ApiError::internal("Failed to add comment", e))?;
        Ok((article_id, comment, comment_id, comments_count))
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with(
            "Comment added successfully",
            json!({
                "article_id": article_id,
                "comment_id": comment_id,
                "comment": comment,
                "comments_count": comments_count,
            }),
        )),
    ))
}

pub async fn toggle_save_article(
    State(state): State<AppState>,
    body: Result<Json<InteractionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::validation("Invalid JSON body"))?;
    let (article_id, user_id) = require_pair(req.article_id.as_deref(), req.user_id())?;

    let db = state.clone();
    let interaction_id = Uuid::new_v4().to_string();
    let (article_id, saved) = blocking(move || {
        ensure_pair_exists(&db, &article_id, &user_id)?;

        let saved = db
            .db
            .toggle_save(&interaction_id, &article_id, &user_id)
            .map_err(|e| ApiError::internal("Failed to toggle save", e))?;
        Ok((article_id, saved))
    })
    .await?;

    let action = if saved { "saved" } else { "unsaved" };
    Ok(Json(Envelope::with(
        format!("Article {action} successfully"),
        json!({ "article_id": article_id, "saved": saved }),
    )))
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    pub article_id: Option<String>,
}

pub async fn get_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let article_id = query
        .article_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("article_id required"))?;

    let db = state.clone();
    let (article_id, rows) = blocking(move || {
        if db
            .db
            .get_article(&article_id)
            .map_err(|e| ApiError::internal("Failed to fetch comments", e))?
            .is_none()
        {
            return Err(ApiError::not_found("Article not found"));
        }
        let rows = db
            .db
            .get_comments(&article_id)
            .map_err(|e| ApiError::internal("Failed to fetch comments", e))?;
        Ok((article_id, rows))
    })
    .await?;

    let comments: Vec<_> = rows.iter().map(comment_view).collect();
    let total = comments.len();
    Ok(Json(Envelope::data(json!({
        "article_id": article_id,
        "comments": comments,
        "comments_count": total,
    }))))
}

#[derive(Debug, Deserialize)]
pub struct UserInteractionQuery {
    pub article_id: Option<String>,
    pub user_id: Option<String>,
}

/// `{liked, saved, has_comment}` for one (article, user); no row means all
/// false.
pub async fn get_user_interaction(
    State(state): State<AppState>,
    Query(query): Query<UserInteractionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (article_id, user_id) =
        require_pair(query.article_id.as_deref(), query.user_id.as_deref())?;

    let db = state.clone();
    let row = blocking(move || {
        db.db
            .get_interaction(&article_id, &user_id)
            .map_err(|e| ApiError::internal("Failed to fetch user interaction", e))
    })
    .await?;

    let interaction = match row {
        Some(row) => InteractionState {
            liked: row.liked,
            saved: row.saved,
            has_comment: row
                .comment
                .as_deref()
                .is_some_and(|c| !c.trim().is_empty()),
        },
        None => InteractionState {
            liked: false,
            saved: false,
            has_comment: false,
        },
    };

    Ok(Json(Envelope::data(serde_json::to_value(interaction).map_err(
        |e| ApiError::internal("Failed to fetch user interaction", e),
    )?)))
}

pub async fn article_comments_likes(
    State(state): State<AppState>,
    body: Result<Json<CountsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::validation("Invalid JSON body"))?;
    let article_id = req
        .article_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::validation("article_id required"))?;

    let db = state.clone();
    let (article_id, likes_count, comments_count) = blocking(move || {
        if db
            .db
            .get_article(&article_id)
            .map_err(|e| ApiError::internal("Failed to get counts", e))?
            .is_none()
        {
            return Err(ApiError::not_found("Article not found"));
        }
        let (likes_count, comments_count) = db
            .db
            .interaction_counts(&article_id)
            .map_err(|e| ApiError::internal("Failed to get counts", e))?;
        Ok((article_id, likes_count, comments_count))
    })
    .await?;

    Ok(Json(Envelope::data(json!({
        "article_id": article_id,
        "likes_count": likes_count,
        "comments_count": comments_count,
    }))))
}

// -- helpers --

fn require_pair(
    article_id: Option<&str>,
    user_id: Option<&str>,
) -> Result<(String, String), ApiError> {
    match (article_id, user_id) {
        (Some(a), Some(u)) if !a.is_empty() && !u.is_empty() => {
            Ok((a.to_string(), u.to_string()))
        }
        _ => Err(ApiError::validation("article_id and user_id required")),
    }
}

/// Interactions are keyed by payload ids, so both sides are checked before
/// the upsert touches anything.
fn ensure_pair_exists(
    state: &AppState,
    article_id: &str,
    user_id: &str,
) -> Result<(), ApiError> {
    let article = state
        .db
        .get_article(article_id)
        .map_err(|e| ApiError::internal("Failed to load article", e))?;
    let user = state
        .db
        .get_user_by_id(user_id)
        .map_err(|e| ApiError::internal("Failed to load user", e))?;

    if article.is_none() || user.is_none() {
        return Err(ApiError::not_found("Article or User not found"));
    }
    Ok(())
}
