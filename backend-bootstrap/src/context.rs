use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use backend_application::{AppState, Metrics};
use backend_domain::ports::EventStore;
use backend_infrastructure::{connect_pool, AppConfig, PostgresEventStore};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        // Presence only; secret values never reach the logs.
        info!(
            has_webhook_token = runtime_config.webhook_token.is_some(),
            has_database_url = !db_config.database_url.is_empty(),
            "configuration loaded"
        );

        info!("connecting to postgres");
        let store = Arc::new(PostgresEventStore::new(connect_pool(&db_config).await?));
        store.ensure_schema().await?;
        info!("database schema ensured");

        let state = AppState {
            config: runtime_config,
            event_store: store,
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
