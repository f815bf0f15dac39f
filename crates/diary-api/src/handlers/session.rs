//! Password login and bearer-token session lookup.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use diary_db::{User, UserRepository};

use super::non_blank;
use crate::auth::verify_password;
use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid credentials".to_string())
}

/// Exchange email (or display name) and password for a bearer token.
///
/// The token is issued on first login and reused afterwards.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let password = non_blank(req.password)
        .ok_or_else(|| ApiError::BadRequest("Password is required".to_string()))?;
    let login = non_blank(req.email)
        .or_else(|| non_blank(req.username))
        .ok_or_else(|| ApiError::BadRequest("Email or username is required".to_string()))?;

    let creds = state
        .db
        .users
        .find_by_login(login.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let stored = creds.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| ApiError::Internal(format!("Password check failed: {}", e)))?;
    if !valid {
        warn!(
            subsystem = "api",
            component = "session",
            op = "login",
            user_id = creds.user.id,
            "Rejected login"
        );
        return Err(invalid_credentials());
    }

    let token = match creds.magic_link_token {
        Some(token) if !token.is_empty() => token,
        _ => {
            let token = Uuid::new_v4().to_string();
            state.db.users.set_token(creds.user.id, &token).await?;
            token
        }
    };

    info!(
        subsystem = "api",
        component = "session",
        op = "login",
        user_id = creds.user.id,
        "User logged in"
    );
    Ok(Json(LoginResponse {
        token,
        user: creds.user,
    }))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The user owning the presented bearer token.
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<User>, ApiError> {
    let token =
        bearer_token(&headers).ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;
    state
        .db
        .users
        .find_by_token(token)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))
}
