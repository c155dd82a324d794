use axum::Router;

use backend_application::AppState;

use crate::handlers::{ops_handlers, webhook_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/webhooks/events",
            axum::routing::post(webhook_handlers::receive_event)
                .options(webhook_handlers::preflight)
                .fallback(webhook_handlers::method_not_allowed),
        )
        .route(
            "/v1/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/v1/ops/health/ready",
            axum::routing::get(ops_handlers::health_ready),
        )
        .route(
            "/v1/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tokio::sync::Mutex;
    use tower::util::ServiceExt;

    use backend_application::{AppState, Metrics};
    use backend_domain::ports::EventStore;
    use backend_domain::{EventRecord, IngestOutcome, RuntimeConfig};

    use super::*;

    #[derive(Default)]
    struct RecordingStore {
        seen_ids: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl EventStore for RecordingStore {
        async fn ensure_schema(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn persist_event(&self, record: &EventRecord) -> anyhow::Result<IngestOutcome> {
            let mut seen = self.seen_ids.lock().await;
            let inserted = !seen.contains(&record.event.id);
            if inserted {
                seen.push(record.event.id.clone());
            }
            Ok(IngestOutcome {
                event_inserted: inserted,
                showing_upserted: record.event.showing.is_some(),
                ..Default::default()
            })
        }

        async fn ping(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn test_state(store: Arc<RecordingStore>, token: Option<&str>) -> AppState {
        AppState {
            config: RuntimeConfig {
                bind_addr: "127.0.0.1:0".to_string(),
                webhook_token: token.map(ToString::to_string),
                max_body_bytes: 1024 * 1024,
                request_timeout_seconds: 5,
            },
            event_store: store,
            metrics: Arc::new(Metrics::default()),
        }
    }

    fn webhook_request(method: &str, auth: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri("/v1/webhooks/events")
            .header("content-type", "application/json");
        if let Some(auth) = auth {
            builder = builder.header("Authorization", auth);
        }
        builder.body(Body::from(body.to_string())).expect("request")
    }

    fn event_body(id: &str) -> String {
        format!(
            r#"{{"event": {{"id": "{id}", "action": "showing_scheduled", "created_at": "2026-05-01T12:00:00Z"}}}}"#
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn valid_delivery_returns_success_with_event_id() {
        let store = Arc::new(RecordingStore::default());
        let state = test_state(store.clone(), Some("s3cret"));

        let response = build_router(state)
            .oneshot(webhook_request("POST", Some("Bearer s3cret"), &event_body("evt_1")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["event_id"], "evt_1");
        assert_eq!(store.seen_ids.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_delivery_returns_success_and_stores_one_row() {
        let store = Arc::new(RecordingStore::default());
        let state = test_state(store.clone(), Some("s3cret"));

        for _ in 0..2 {
            let response = build_router(state.clone())
                .oneshot(webhook_request("POST", Some("Bearer s3cret"), &event_body("evt_dup")))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(store.seen_ids.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn missing_authorization_yields_401_even_for_valid_payload() {
        let store = Arc::new(RecordingStore::default());
        let state = test_state(store.clone(), Some("s3cret"));

        let response = build_router(state)
            .oneshot(webhook_request("POST", None, &event_body("evt_2")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "unauthorized");
        assert!(store.seen_ids.lock().await.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_token_yields_500() {
        let store = Arc::new(RecordingStore::default());
        let state = test_state(store, None);

        let response = build_router(state)
            .oneshot(webhook_request("POST", Some("Bearer anything"), &event_body("evt_3")))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "server configuration error");
    }

    #[tokio::test]
    async fn payload_without_event_yields_400_and_no_write() {
        let store = Arc::new(RecordingStore::default());
        let state = test_state(store.clone(), Some("s3cret"));

        let response = build_router(state)
            .oneshot(webhook_request("POST", Some("Bearer s3cret"), r#"{"ping": true}"#))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(store.seen_ids.lock().await.is_empty());
    }

    #[tokio::test]
    async fn get_on_webhook_route_yields_405_with_json_error() {
        let store = Arc::new(RecordingStore::default());
        let state = test_state(store, Some("s3cret"));

        let response = build_router(state)
            .oneshot(webhook_request("GET", None, ""))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "method not allowed");
    }

    #[tokio::test]
    async fn options_on_webhook_route_yields_200() {
        let store = Arc::new(RecordingStore::default());
        let state = test_state(store, Some("s3cret"));

        let response = build_router(state)
            .oneshot(webhook_request("OPTIONS", None, ""))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn liveness_needs_no_credentials() {
        let store = Arc::new(RecordingStore::default());
        let state = test_state(store, None);

        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/v1/ops/health/live")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
