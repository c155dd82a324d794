use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    webhook_requests: AtomicU64,
    events_recorded: AtomicU64,
    events_deduplicated: AtomicU64,
    showings_recorded: AtomicU64,
    ingest_errors: AtomicU64,
}

impl Metrics {
    pub fn record_request(&self) {
        self.webhook_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self) {
        self.events_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.events_deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_showing(&self) {
        self.showings_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.ingest_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let requests = self.webhook_requests.load(Ordering::Relaxed);
        let events = self.events_recorded.load(Ordering::Relaxed);
        let duplicates = self.events_deduplicated.load(Ordering::Relaxed);
        let showings = self.showings_recorded.load(Ordering::Relaxed);
        let errors = self.ingest_errors.load(Ordering::Relaxed);

        format!(
            "# TYPE showfeed_webhook_requests_total counter\n\
showfeed_webhook_requests_total {}\n\
# TYPE showfeed_events_recorded_total counter\n\
showfeed_events_recorded_total {}\n\
# TYPE showfeed_events_deduplicated_total counter\n\
showfeed_events_deduplicated_total {}\n\
# TYPE showfeed_showings_recorded_total counter\n\
showfeed_showings_recorded_total {}\n\
# TYPE showfeed_ingest_errors_total counter\n\
showfeed_ingest_errors_total {}\n",
            requests, events, duplicates, showings, errors
        )
    }
}
