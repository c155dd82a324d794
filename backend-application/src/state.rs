use std::sync::Arc;

use backend_domain::ports::EventStore;
use backend_domain::RuntimeConfig;

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub event_store: Arc<dyn EventStore>,
    pub metrics: Arc<Metrics>,
}
