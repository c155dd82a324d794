use serde_json::Value;
use tracing::{debug, info};

use backend_domain::{EventRecord, IngestOutcome, WebhookEnvelope};

use crate::{AppError, AppState};

#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub event_id: String,
    pub outcome: IngestOutcome,
}

/// Runs the full ingest pipeline for one delivery: normalize the typed event,
/// persist it (idempotently) together with its rollups, and account for the result.
pub async fn process_webhook(
    state: &AppState,
    envelope: WebhookEnvelope,
    raw_payload: Value,
) -> Result<IngestReceipt, AppError> {
    state.metrics.record_request();
    let record = EventRecord::new(envelope, raw_payload);

    let outcome = match state.event_store.persist_event(&record).await {
        Ok(outcome) => outcome,
        Err(err) => {
            state.metrics.record_error();
            return Err(AppError::Internal(err));
        }
    };

    if outcome.event_inserted {
        state.metrics.record_event();
    } else {
        state.metrics.record_duplicate();
        debug!(event_id = %record.event.id, "duplicate event id, insert skipped");
    }
    if outcome.showing_upserted {
        state.metrics.record_showing();
    }

    info!(
        event_id = %record.event.id,
        action = %record.event.action,
        inserted = outcome.event_inserted,
        listing_upserted = outcome.listing_upserted,
        prospect_upserted = outcome.prospect_upserted,
        showing_upserted = outcome.showing_upserted,
        "webhook processed"
    );

    Ok(IngestReceipt {
        event_id: record.event.id,
        outcome,
    })
}
