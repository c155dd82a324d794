use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use backend_application::commands::webhook_commands;
use backend_application::AppState;
use backend_domain::WebhookEnvelope;

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(Serialize)]
pub struct WebhookAck {
    pub status: String,
    pub message: String,
    pub event_id: String,
}

pub async fn receive_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<WebhookAck>, HttpError> {
    authorize(&state.config, &headers)?;

    // The raw value is kept for the audit column; the typed envelope is what
    // validation and the writes run against. Nothing is written on a parse error.
    let raw: Value = serde_json::from_slice(&body)
        .map_err(|err| HttpError::BadRequest(format!("invalid JSON body: {}", err)))?;
    let envelope: WebhookEnvelope = serde_json::from_value(raw.clone())
        .map_err(|err| HttpError::BadRequest(format!("invalid payload: {}", err)))?;

    let receipt = webhook_commands::process_webhook(&state, envelope, raw)
        .await
        .map_err(|err| {
            error!("failed to process webhook: {}", err);
            HttpError::from(err)
        })?;

    Ok(Json(WebhookAck {
        status: "success".to_string(),
        message: "webhook processed".to_string(),
        event_id: receipt.event_id,
    }))
}

/// Plain OPTIONS probes (non-preflight) still get a 200; actual CORS preflight
/// is answered by the CORS layer before it reaches this handler.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> HttpError {
    HttpError::MethodNotAllowed
}
