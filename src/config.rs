use std::env;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::Deserialize;

use crate::db::DatabaseConfig;
use crate::i18n::Language;

/// Where session keys live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KvsBackend {
    /// Process memory; sessions are lost on restart.
    #[default]
    Memory,
    /// The `kv_entry` table of the configured SurrealDB.
    Surreal,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HS256 signing secret shared by access and refresh tokens.
    pub jwt_secret: String,
    pub bind: String,
    pub kvs: KvsBackend,
    pub default_language: Language,
    pub database: DatabaseConfig,
    /// Sweep interval for expired session keys; `None` disables the sweep.
    pub purge_interval: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: env::var("SPLITPAY_JWT_SECRET").unwrap_or_default(),
            bind: env::var("SPLITPAY_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            kvs: env::var("SPLITPAY_KVS")
                .ok()
                .and_then(|v| <KvsBackend as clap::ValueEnum>::from_str(&v, true).ok())
                .unwrap_or_default(),
            default_language: env::var("SPLITPAY_DEFAULT_LANGUAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            database: DatabaseConfig::default(),
            purge_interval: Some(Duration::from_secs(300)),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            bail!("SPLITPAY_JWT_SECRET must be set to a non-empty value");
        }
        if self.bind.trim().is_empty() {
            bail!("bind address must not be empty");
        }
        if self.purge_interval.is_some_and(|interval| interval.is_zero()) {
            bail!("purge interval must be greater than zero");
        }
        Ok(())
    }
}
