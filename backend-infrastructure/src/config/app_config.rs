use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{DbConfig, RuntimeConfig};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub webhook_token: Option<String>,
    pub database_url: String,
    pub pg_max_connections: u32,
    pub pg_connect_timeout_seconds: u64,
    pub pg_statement_timeout_millis: u64,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3440".to_string(),
            webhook_token: None,
            database_url: String::new(),
            pg_max_connections: 5,
            pg_connect_timeout_seconds: 10,
            pg_statement_timeout_millis: 10_000,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("SHOWFEED_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        if !file_path.exists() {
            warn!("config.toml not found, using defaults");
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.normalize();
            config.validate()?;
            return Ok(config);
        }
        let content = fs::read_to_string(file_path).await?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        if let Some(token) = &self.webhook_token {
            if token.trim().is_empty() {
                self.webhook_token = None;
            }
        }
        self.database_url = self.database_url.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.database_url.is_empty() {
            return Err(anyhow!("database_url must be configured"));
        }
        if self.pg_max_connections == 0 {
            return Err(anyhow!("pg_max_connections must be greater than 0"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            webhook_token: self.webhook_token.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            database_url: self.database_url.clone(),
            max_connections: self.pg_max_connections,
            connect_timeout_seconds: self.pg_connect_timeout_seconds,
            statement_timeout_millis: self.pg_statement_timeout_millis,
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("SHOWFEED_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("SHOWFEED_WEBHOOK_TOKEN") {
            self.webhook_token = Some(value);
        }
        if let Ok(value) = env::var("SHOWFEED_DATABASE_URL") {
            self.database_url = value;
        }
        if let Ok(value) = env::var("SHOWFEED_PG_MAX_CONNECTIONS") {
            self.pg_max_connections = value.parse().unwrap_or(self.pg_max_connections);
        }
        if let Ok(value) = env::var("SHOWFEED_PG_CONNECT_TIMEOUT_SECONDS") {
            self.pg_connect_timeout_seconds =
                value.parse().unwrap_or(self.pg_connect_timeout_seconds);
        }
        if let Ok(value) = env::var("SHOWFEED_PG_STATEMENT_TIMEOUT_MILLIS") {
            self.pg_statement_timeout_millis =
                value.parse().unwrap_or(self.pg_statement_timeout_millis);
        }
        if let Ok(value) = env::var("SHOWFEED_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("SHOWFEED_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}
