//! Telegram webhook endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{ApiError, AppState};

/// Header Telegram sends when the webhook was registered with a secret.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Run one update through the ingestion pipeline and acknowledge it.
///
/// Processing failures are reported to the sender by the pipeline, so any
/// well-formed update is answered with `{ "ok": true }`.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let pipeline = state
        .ingestion
        .clone()
        .ok_or_else(|| ApiError::Internal("Bot Not Configured".to_string()))?;

    if let Some(expected) = state.webhook_secret.as_deref() {
        let presented = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected) {
            warn!(
                subsystem = "telegram",
                component = "webhook",
                op = "verify_secret",
                "Rejected webhook with bad secret token"
            );
            return Err(ApiError::Unauthorized("Unauthorized".to_string()));
        }
    }

    let update: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::BadRequest("Invalid JSON".to_string()))?;

    let outcome = pipeline.handle_update(&update).await;
    debug!(
        subsystem = "telegram",
        component = "webhook",
        op = "handle_update",
        outcome = ?outcome,
        "Update handled"
    );

    Ok(Json(json!({ "ok": true })))
}
