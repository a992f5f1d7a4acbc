use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use bytes::Bytes;
use serde_json::json;
use tracing::warn;

use newsdesk_media::UploadOptions;
use newsdesk_types::envelope::Envelope;

use crate::error::{ApiError, blocking};
use crate::middleware::AuthUser;
use crate::state::AppState;

/// Uploads here are a dedicated operation: a collaborator failure is
/// reported to the caller, unlike the best-effort uploads inside article
/// creation.
pub async fn upload_profile_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let file = first_file(multipart)
        .await?
        .ok_or_else(|| ApiError::validation("Image file is required"))?;

    let db = state.clone();
    let user_id = auth.user_id.clone();
    let user = blocking(move || {
        db.db
            .get_user_by_id(&user_id)
            .map_err(|e| ApiError::internal("Failed to upload image", e))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    let opts = UploadOptions {
        folder: Some(format!("profiles/{}", user.id)),
        filename: file.filename,
        content_type: file.content_type,
    };
    let asset = state.media.upload(file.bytes, opts).await?;

    let db = state.clone();
    let url = asset.url.clone();
    blocking(move || {
        db.db
            .set_profile_url(&user.id, &url)
            .map_err(|e| ApiError::internal("Failed to upload image", e))
    })
    .await?;

    Ok(Json(Envelope::with(
        "Profile image uploaded successfully",
        json!({ "profileUrl": asset.url, "publicId": asset.public_id }),
    )))
}

pub async fn upload_pdf(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let file = first_file(multipart)
        .await?
        .ok_or_else(|| ApiError::validation("PDF file is required"))?;

    let db = state.clone();
    let user_id = auth.user_id.clone();
    let user = blocking(move || {
        db.db
            .get_user_by_id(&user_id)
            .map_err(|e| ApiError::internal("Failed to upload PDF", e))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    let opts = UploadOptions {
        folder: Some(format!("pdfs/{}", user.id)),
        filename: file.filename,
        content_type: file.content_type,
    };
    let asset = state.media.upload(file.bytes, opts).await?;

    // Replacing a PDF leaves the old asset orphaned unless we delete it;
    // failure to delete is not the caller's problem.
    if !user.pdf_public_id.is_empty() {
        if let Err(e) = state.media.delete(&user.pdf_public_id).await {
            warn!("failed to delete previous PDF {}: {}", user.pdf_public_id, e);
        }
    }

    let db = state.clone();
    let url = asset.url.clone();
    let public_id = asset.public_id.clone();
    blocking(move || {
        db.db
            .set_pdf(&user.id, &url, &public_id)
            .map_err(|e| ApiError::internal("Failed to upload PDF", e))
    })
    .await?;

    Ok(Json(Envelope::with(
        "PDF uploaded successfully",
        json!({ "pdfUrl": asset.url, "publicId": asset.public_id }),
    )))
}

/// Standalone image upload for the article editor; returns the stored URL
/// for the caller to embed in a content block.
pub async fn upload_article_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let file = first_file(multipart)
        .await?
        .ok_or_else(|| ApiError::validation("Image file is required"))?;

    let opts = UploadOptions {
        folder: Some("articles".to_string()),
        filename: file.filename,
        content_type: file.content_type,
    };
    let asset = state.media.upload(file.bytes, opts).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with(
            "Image uploaded successfully",
            json!({ "url": asset.url, "public_id": asset.public_id }),
        )),
    ))
}

struct UploadedFile {
    bytes: Bytes,
    filename: Option<String>,
    content_type: Option<String>,
}

/// First field carrying a file, regardless of its field name.
async fn first_file(mut multipart: Multipart) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let filename = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?;
        if bytes.is_empty() {
            continue;
        }
        return Ok(Some(UploadedFile {
            bytes,
            filename,
            content_type,
        }));
    }
    Ok(None)
}
