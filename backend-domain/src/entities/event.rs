// Webhook event entities
// Wire shape of scheduling-service notifications plus the record handed to storage

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Top-level webhook body. Deserialization fails when `event` is absent,
/// which is surfaced to the caller as a bad request before any write.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub event: EventPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub id: String,
    pub action: String,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub team_member_name: Option<String>,
    #[serde(default)]
    pub team_member_uid: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub showing: Option<ShowingPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShowingPayload {
    pub uid: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub showtime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub showing_time_zone: Option<String>,
    #[serde(default)]
    pub showing_time_zone_utc_offset: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub listing_uid: Option<String>,
    #[serde(default)]
    pub listing_full_address: Option<String>,
    #[serde(default)]
    pub is_self_show: Option<bool>,
    #[serde(default)]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub self_show_code_distributed_at: Option<DateTime<Utc>>,
}

impl EventPayload {
    /// Blank optional strings are treated the same as absent ones so that
    /// empty provider fields never overwrite stored values or pass presence checks.
    pub fn normalize(&mut self) {
        self.actor = clear_blank(self.actor.take());
        self.team_member_name = clear_blank(self.team_member_name.take());
        self.team_member_uid = clear_blank(self.team_member_uid.take());
        if let Some(showing) = &mut self.showing {
            showing.normalize();
        }
    }
}

impl ShowingPayload {
    pub fn normalize(&mut self) {
        self.showing_time_zone = clear_blank(self.showing_time_zone.take());
        self.showing_time_zone_utc_offset = clear_blank(self.showing_time_zone_utc_offset.take());
        self.name = clear_blank(self.name.take());
        self.phone = clear_blank(self.phone.take());
        self.email = clear_blank(self.email.take());
        self.notes = clear_blank(self.notes.take());
        self.listing_uid = clear_blank(self.listing_uid.take());
        self.listing_full_address = clear_blank(self.listing_full_address.take());
    }

    /// The listing rollup is only maintained when both identifier and address arrived.
    pub fn listing_reference(&self) -> Option<(&str, &str)> {
        match (&self.listing_uid, &self.listing_full_address) {
            (Some(uid), Some(address)) => Some((uid.as_str(), address.as_str())),
            _ => None,
        }
    }
}

/// What the event store persists: the typed event plus the untouched payload
/// kept alongside it for auditing.
#[derive(Debug, Clone)]
pub struct EventRecord {
    pub event: EventPayload,
    pub raw_payload: Value,
}

impl EventRecord {
    pub fn new(envelope: WebhookEnvelope, raw_payload: Value) -> Self {
        let mut event = envelope.event;
        event.normalize();
        Self { event, raw_payload }
    }
}

/// Which of the conditional writes actually ran for one webhook delivery.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestOutcome {
    pub event_inserted: bool,
    pub listing_upserted: bool,
    pub prospect_upserted: bool,
    pub showing_upserted: bool,
}

fn clear_blank(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_without_event_is_rejected() {
        let err = serde_json::from_str::<WebhookEnvelope>(r#"{"other": 1}"#).expect_err("reject");
        assert!(err.to_string().contains("event"));
    }

    #[test]
    fn minimal_event_parses_without_showing() {
        let envelope: WebhookEnvelope = serde_json::from_str(
            r#"{"event": {"id": "evt_1", "action": "showing_scheduled", "created_at": "2026-05-01T12:00:00Z"}}"#,
        )
        .expect("parse");
        assert_eq!(envelope.event.id, "evt_1");
        assert!(envelope.event.showing.is_none());
        assert!(envelope.event.actor.is_none());
    }

    #[test]
    fn full_showing_parses_with_unknown_fields_tolerated() {
        let envelope: WebhookEnvelope = serde_json::from_str(
            r#"{
                "event": {
                    "id": "evt_2",
                    "action": "showing_confirmed",
                    "actor": "prospect",
                    "created_at": "2026-05-01T12:00:00-05:00",
                    "future_field": true,
                    "showing": {
                        "uid": "show_9",
                        "showtime": "2026-05-02T15:30:00Z",
                        "showing_time_zone": "America/Chicago",
                        "showing_time_zone_utc_offset": "-05:00",
                        "email": "ada@example.com",
                        "listing_uid": "lst_4",
                        "listing_full_address": "12 Main St, Springfield",
                        "is_self_show": false,
                        "confirmed_at": "2026-05-01T12:01:00Z"
                    }
                }
            }"#,
        )
        .expect("parse");
        let showing = envelope.event.showing.expect("showing");
        assert_eq!(showing.uid, "show_9");
        assert_eq!(showing.listing_reference(), Some(("lst_4", "12 Main St, Springfield")));
        assert!(showing.canceled_at.is_none());
    }

    #[test]
    fn normalize_clears_blank_strings() {
        let envelope: WebhookEnvelope = serde_json::from_str(
            r#"{
                "event": {
                    "id": "evt_3",
                    "action": "showing_scheduled",
                    "actor": "  ",
                    "created_at": "2026-05-01T12:00:00Z",
                    "showing": {
                        "uid": "show_1",
                        "email": "",
                        "listing_uid": "lst_1",
                        "listing_full_address": "   "
                    }
                }
            }"#,
        )
        .expect("parse");
        let record = EventRecord::new(envelope, serde_json::json!({}));
        assert!(record.event.actor.is_none());
        let showing = record.event.showing.expect("showing");
        assert!(showing.email.is_none());
        // Address became blank, so no listing rollup should run.
        assert_eq!(showing.listing_reference(), None);
    }
}
