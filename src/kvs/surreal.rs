//! SurrealDB-backed key-value store.
//!
//! Entries live in the `kv_entry` table as `entry_key`/`entry_value` with an
//! absolute `expires_at` in Unix milliseconds. The key doubles as the record
//! id, so a key maps to at most one row. SurrealDB has no native TTL, so
//! liveness is decided at read time and dead rows are removed by
//! [`SurrealStore::purge_expired`].

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::{KeyValueStore, KvsError, KvsFuture};
use crate::db::Db;

#[derive(Debug, Deserialize)]
struct KeyRow {
    #[allow(dead_code)]
    entry_key: String,
}

#[derive(Clone)]
pub struct SurrealStore {
    db: Db,
}

impl SurrealStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Delete rows whose deadline has passed, returning how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, KvsError> {
        let query = r#"
            SELECT entry_key FROM kv_entry WHERE expires_at <= $now;
            DELETE kv_entry WHERE expires_at <= $now;
        "#;

        let mut res = self
            .db
            .query(query)
            .bind(("now", now_millis()))
            .await
            .map_err(backend)?;

        let expired: Vec<KeyRow> = res.take(0).map_err(backend)?;
        debug!(removed = expired.len(), "purged expired kv_entry rows");
        Ok(expired.len())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn backend(err: surrealdb::Error) -> KvsError {
    KvsError::Backend(err.to_string())
}

impl SurrealStore {
    async fn set_entry(&self, key: String, value: String, expires_at: i64) -> Result<(), KvsError> {
        let query = r#"
            UPSERT type::thing('kv_entry', $key) CONTENT {
                entry_key: $key,
                entry_value: $value,
                expires_at: $expires_at
            };
        "#;

        self.db
            .query(query)
            .bind(("key", key))
            .bind(("value", value))
            .bind(("expires_at", expires_at))
            .await
            .and_then(|res| res.check())
            .map_err(backend)?;

        Ok(())
    }

    async fn delete_entry(&self, key: String) -> Result<(), KvsError> {
        self.db
            .query("DELETE type::thing('kv_entry', $key)")
            .bind(("key", key))
            .await
            .and_then(|res| res.check())
            .map_err(backend)?;

        Ok(())
    }

    async fn count_live(&self, key: String) -> Result<u64, KvsError> {
        let mut res = self
            .db
            .query("SELECT entry_key FROM type::thing('kv_entry', $key) WHERE expires_at > $now")
            .bind(("key", key))
            .bind(("now", now_millis()))
            .await
            .map_err(backend)?;

        let rows: Vec<KeyRow> = res.take(0).map_err(backend)?;
        Ok(rows.len() as u64)
    }
}

impl KeyValueStore for SurrealStore {
    fn set(&self, key: &str, value: &str, ttl: Duration) -> KvsFuture<'_, ()> {
        let ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = now_millis().saturating_add(ttl_millis);

        Box::pin(self.set_entry(key.to_string(), value.to_string(), expires_at))
    }

    fn delete(&self, key: &str) -> KvsFuture<'_, ()> {
        Box::pin(self.delete_entry(key.to_string()))
    }

    fn exists(&self, key: &str) -> KvsFuture<'_, u64> {
        Box::pin(self.count_live(key.to_string()))
    }

    fn purge_expired(&self) -> KvsFuture<'_, usize> {
        Box::pin(SurrealStore::purge_expired(self))
    }
}
