use async_trait::async_trait;

use crate::entities::{EventRecord, IngestOutcome};

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    async fn persist_event(&self, record: &EventRecord) -> anyhow::Result<IngestOutcome>;
    async fn ping(&self) -> anyhow::Result<()>;
}
