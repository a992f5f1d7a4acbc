use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde_json::json;
use uuid::Uuid;

use newsdesk_types::api::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, Role, UpdateProfileRequest,
};
use newsdesk_types::envelope::Envelope;

use crate::convert::public_user;
use crate::error::{ApiError, blocking};
use crate::middleware::AuthUser;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;
use crate::token;

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::validation("Invalid JSON data"))?;

    for (value, name) in [
        (&req.username, "username"),
        (&req.email, "email"),
        (&req.password, "password"),
        (&req.role, "role"),
    ] {
        if value.is_empty() {
            return Err(ApiError::validation(format!("{name} is required")));
        }
    }
    let role: Role = req
        .role
        .parse()
        .map_err(|_| ApiError::validation("Invalid role"))?;

    let hashed = hash_password(&req.password)
        .map_err(|e| ApiError::internal("Registration failed", e))?;

    let user_id = Uuid::new_v4();
    let db = state.clone();
    let row = blocking(move || {
        // The UNIQUE column backstops the race between this check and the
        // insert.
        if db
            .db
            .email_exists(&req.email)
            .map_err(|e| ApiError::internal("Registration failed", e))?
        {
            return Err(ApiError::conflict("User with this email already exists"));
        }

        db.db
            .create_user(
                &user_id.to_string(),
                &req.username,
                &req.email,
                hashed.as_str(),
                role.as_str(),
                &req.profile_url,
            )
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint failed: users.email") {
                    ApiError::conflict("User with this email already exists")
                } else {
                    ApiError::internal("Registration failed", e)
                }
            })?;

        db.db
            .get_user_by_id(&user_id.to_string())
            .map_err(|e| ApiError::internal("Registration failed", e))?
            .ok_or_else(|| ApiError::internal("Registration failed", "row missing after insert"))
    })
    .await?;

    let token = token::issue(&state.token_secret, user_id, &row.email);

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with(
            "User registered successfully",
            json!({ "user": public_user(&row), "token": token }),
        )),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::validation("Invalid JSON data"))?;

    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let db = state.clone();
    let email = req.email.clone();
    let user = blocking(move || {
        db.db
            .get_user_by_email(&email)
            .map_err(|e| ApiError::internal("Login failed", e))
    })
    .await?
    // Unknown email and wrong password answer identically.
    .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&req.password, &user.password) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| ApiError::internal("Login failed", e))?;
    let token = token::issue(&state.token_secret, user_id, &user.email);

    Ok(Json(Envelope::with(
        "Login successful",
        json!({ "user": public_user(&user), "token": token }),
    )))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let user = blocking(move || {
        db.db
            .get_user_by_id(&auth.user_id)
            .map_err(|e| ApiError::internal("Failed to get profile", e))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(Envelope::data(json!({ "user": public_user(&user) }))))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    body: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::validation("Invalid JSON data"))?;

    if let Some(username) = &req.username {
        if username.is_empty() {
            return Err(ApiError::validation("Username is required"));
        }
    }
    if let Some(role) = &req.role {
        role.parse::<Role>()
            .map_err(|_| ApiError::validation("Invalid role"))?;
    }

    let db = state.clone();
    let user = blocking(move || {
        let current = db
            .db
            .get_user_by_id(&auth.user_id)
            .map_err(|e| ApiError::internal("Failed to update profile", e))?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        let username = req.username.unwrap_or(current.username);
        let role = req.role.unwrap_or(current.role);
        let profile_url = req.profile_url.unwrap_or(current.profile_url);

        db.db
            .update_user_profile(&current.id, &username, &role, &profile_url)
            .map_err(|e| ApiError::internal("Failed to update profile", e))?;

        db.db
            .get_user_by_id(&current.id)
            .map_err(|e| ApiError::internal("Failed to update profile", e))?
            .ok_or_else(|| ApiError::not_found("User not found"))
    })
    .await?;

    Ok(Json(Envelope::with(
        "Profile updated successfully",
        json!({ "user": public_user(&user) }),
    )))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|_| ApiError::validation("Invalid JSON data"))?;

    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(ApiError::validation(
            "Current password and new password are required",
        ));
    }

    let db = state.clone();
    let user = blocking(move || {
        db.db
            .get_user_by_id(&auth.user_id)
            .map_err(|e| ApiError::internal("Failed to change password", e))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;

    if !verify_password(&req.current_password, &user.password) {
        return Err(ApiError::validation("Current password is incorrect"));
    }

    let hashed = hash_password(&req.new_password)
        .map_err(|e| ApiError::internal("Failed to change password", e))?;

    let db = state.clone();
    blocking(move || {
        db.db
            .set_password(&user.id, hashed.as_str())
            .map_err(|e| ApiError::internal("Failed to change password", e))
    })
    .await?;

    Ok(Json(Envelope::message("Password changed successfully")))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let deleted = blocking(move || {
        db.db
            .delete_user(&auth.user_id)
            .map_err(|e| ApiError::internal("Failed to delete account", e))
    })
    .await?;

    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(Envelope::message("Account deleted successfully")))
}

/// Any valid token may list users. The admin-only restriction exists in the
/// product design but is deliberately not enforced here; see DESIGN.md.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let rows = blocking(move || {
        db.db
            .list_users()
            .map_err(|e| ApiError::internal("Failed to list users", e))
    })
    .await?;

    let users: Vec<_> = rows.iter().map(public_user).collect();
    let total = users.len();
    Ok(Json(Envelope::data(json!({ "users": users, "total": total }))))
}
