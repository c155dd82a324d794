use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::info;

use backend_domain::ports::EventStore;
use backend_domain::{DbConfig, EventRecord, IngestOutcome};

const CREATE_EVENTS: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id BIGSERIAL PRIMARY KEY,
    event_id TEXT NOT NULL UNIQUE,
    action TEXT NOT NULL,
    actor TEXT,
    team_member_name TEXT,
    team_member_uid TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    raw_payload JSONB NOT NULL,
    received_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_LISTINGS: &str = r#"
CREATE TABLE IF NOT EXISTS listings (
    uid TEXT PRIMARY KEY,
    full_address TEXT NOT NULL,
    first_seen_at TIMESTAMPTZ NOT NULL,
    last_seen_at TIMESTAMPTZ NOT NULL,
    total_showings BIGINT NOT NULL DEFAULT 0
)
"#;

const CREATE_PROSPECTS: &str = r#"
CREATE TABLE IF NOT EXISTS prospects (
    email TEXT PRIMARY KEY,
    name TEXT,
    phone TEXT,
    first_contact_at TIMESTAMPTZ NOT NULL,
    last_contact_at TIMESTAMPTZ NOT NULL,
    total_showings BIGINT NOT NULL DEFAULT 0
)
"#;

const CREATE_SHOWINGS: &str = r#"
CREATE TABLE IF NOT EXISTS showings (
    uid TEXT PRIMARY KEY,
    event_id TEXT NOT NULL,
    created_at TIMESTAMPTZ,
    showtime TIMESTAMPTZ,
    showing_time_zone TEXT,
    showing_time_zone_utc_offset TEXT,
    name TEXT,
    phone TEXT,
    email TEXT,
    notes TEXT,
    listing_uid TEXT,
    listing_full_address TEXT,
    is_self_show BOOLEAN,
    confirmed_at TIMESTAMPTZ,
    canceled_at TIMESTAMPTZ,
    self_show_code_distributed_at TIMESTAMPTZ,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const INSERT_EVENT: &str = r#"
INSERT INTO events (event_id, action, actor, team_member_name, team_member_uid, created_at, raw_payload)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (event_id) DO NOTHING
RETURNING id
"#;

const UPSERT_LISTING: &str = r#"
INSERT INTO listings (uid, full_address, first_seen_at, last_seen_at, total_showings)
VALUES ($1, $2, NOW(), NOW(), 1)
ON CONFLICT (uid) DO UPDATE SET
    last_seen_at = NOW(),
    total_showings = listings.total_showings + 1
"#;

const UPSERT_PROSPECT: &str = r#"
INSERT INTO prospects (email, name, phone, first_contact_at, last_contact_at, total_showings)
VALUES ($1, $2, $3, NOW(), NOW(), 1)
ON CONFLICT (email) DO UPDATE SET
    name = COALESCE($2, prospects.name),
    phone = COALESCE($3, prospects.phone),
    last_contact_at = NOW(),
    total_showings = prospects.total_showings + 1
"#;

const UPSERT_SHOWING: &str = r#"
INSERT INTO showings (
    uid, event_id, created_at, showtime, showing_time_zone,
    showing_time_zone_utc_offset, name, phone, email, notes,
    listing_uid, listing_full_address, is_self_show,
    confirmed_at, canceled_at, self_show_code_distributed_at
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
ON CONFLICT (uid) DO UPDATE SET
    showtime = COALESCE($4, showings.showtime),
    confirmed_at = COALESCE($14, showings.confirmed_at),
    canceled_at = COALESCE($15, showings.canceled_at),
    self_show_code_distributed_at = COALESCE($16, showings.self_show_code_distributed_at),
    updated_at = NOW()
"#;

/// Builds the startup pool. The statement timeout is applied server-side on
/// every pooled connection so a stuck query cannot hold a webhook open.
pub async fn connect_pool(config: &DbConfig) -> Result<PgPool> {
    let options = config
        .database_url
        .parse::<PgConnectOptions>()?
        .options([(
            "statement_timeout",
            config.statement_timeout_millis.to_string(),
        )]);
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .connect_with(options)
        .await?;
    info!(max_connections = config.max_connections, "postgres pool ready");
    Ok(pool)
}

#[derive(Clone)]
pub struct PostgresEventStore {
    pool: PgPool,
}

impl PostgresEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for PostgresEventStore {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in [CREATE_EVENTS, CREATE_LISTINGS, CREATE_PROSPECTS, CREATE_SHOWINGS] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// All writes for one delivery run in a single transaction: either the
    /// event row and every applicable rollup land together, or none do.
    async fn persist_event(&self, record: &EventRecord) -> Result<IngestOutcome> {
        let mut tx = self.pool.begin().await?;
        let event = &record.event;

        let inserted = sqlx::query(INSERT_EVENT)
            .bind(&event.id)
            .bind(&event.action)
            .bind(&event.actor)
            .bind(&event.team_member_name)
            .bind(&event.team_member_uid)
            .bind(event.created_at)
            .bind(&record.raw_payload)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

        let mut outcome = IngestOutcome {
            event_inserted: inserted,
            ..Default::default()
        };

        if let Some(showing) = &event.showing {
            if let Some((listing_uid, address)) = showing.listing_reference() {
                sqlx::query(UPSERT_LISTING)
                    .bind(listing_uid)
                    .bind(address)
                    .execute(&mut *tx)
                    .await?;
                outcome.listing_upserted = true;
            }

            if let Some(email) = &showing.email {
                sqlx::query(UPSERT_PROSPECT)
                    .bind(email)
                    .bind(&showing.name)
                    .bind(&showing.phone)
                    .execute(&mut *tx)
                    .await?;
                outcome.prospect_upserted = true;
            }

            sqlx::query(UPSERT_SHOWING)
                .bind(&showing.uid)
                .bind(&event.id)
                .bind(showing.created_at)
                .bind(showing.showtime)
                .bind(&showing.showing_time_zone)
                .bind(&showing.showing_time_zone_utc_offset)
                .bind(&showing.name)
                .bind(&showing.phone)
                .bind(&showing.email)
                .bind(&showing.notes)
                .bind(&showing.listing_uid)
                .bind(&showing.listing_full_address)
                .bind(showing.is_self_show)
                .bind(showing.confirmed_at)
                .bind(showing.canceled_at)
                .bind(showing.self_show_code_distributed_at)
                .execute(&mut *tx)
                .await?;
            outcome.showing_upserted = true;
        }

        tx.commit().await?;
        Ok(outcome)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
