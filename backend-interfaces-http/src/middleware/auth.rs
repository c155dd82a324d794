use axum::http::HeaderMap;

use backend_domain::RuntimeConfig;

use crate::error::HttpError;

/// The webhook surface requires an exact bearer match. An unconfigured secret
/// is a server-side fault and never reported as a client error.
pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> Result<(), HttpError> {
    let Some(expected) = &config.webhook_token else {
        return Err(HttpError::Config(
            "webhook_token is not configured".to_string(),
        ));
    };
    match extract_bearer(headers) {
        Some(token) if token == *expected => Ok(()),
        _ => Err(HttpError::Unauthorized),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let prefix = "Bearer ";
    if !value.starts_with(prefix) {
        return None;
    }
    let token = value[prefix.len()..].trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
