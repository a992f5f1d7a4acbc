use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::state::AppState;
use crate::token;

/// Identity pulled out of a verified bearer token; handlers read this from
/// request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: String,
}

/// Extract and verify the bearer token from the Authorization header.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Authorization token required"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("Authorization token required"))?;

    let payload = token::verify(&state.token_secret, token.trim())
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    req.extensions_mut().insert(AuthUser {
        user_id: payload.user_id,
        email: payload.email,
    });
    Ok(next.run(req).await)
}

/// Bearer identity for routes where auth is optional (article create). A
/// missing header or an unverifiable token both yield `None`; the caller
/// falls back to its own author resolution.
pub fn optional_auth(state: &AppState, headers: &axum::http::HeaderMap) -> Option<AuthUser> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?;
    let payload = token::verify(&state.token_secret, token.trim())?;
    Some(AuthUser {
        user_id: payload.user_id,
        email: payload.email,
    })
}
