//! Login handler

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use lendstack_common::{
    auth,
    db::Repository,
    errors::{AppError, Result},
};

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,

    /// Path the caller was sent here from, echoed back so the flow can
    /// resume where it left off
    #[serde(default)]
    pub next: Option<String>,
}

/// Login response carrying the session token
#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Verify credentials and issue a session token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let repo = Repository::new(state.db.clone());

    let user = repo
        .find_user_by_username(&request.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !auth::verify_password(&request.password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let scopes = user.scopes();
    let token = state
        .sessions
        .generate_token(user.id, &user.username, scopes.clone())?;

    tracing::info!(user_id = %user.id, username = %user.username, "User logged in");

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        scopes,
        next: request.next,
    }))
}
