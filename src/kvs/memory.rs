//! In-process key-value store with per-entry deadlines.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use super::{KeyValueStore, KvsFuture};

#[derive(Clone, Debug)]
struct Entry {
    #[allow(dead_code)]
    value: String,
    expires_at: Instant,
}

/// Thread-safe in-memory store. Entries past their deadline read as absent.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let initial_len = entries.len();

        entries.retain(|_, entry| entry.expires_at > now);

        let removed = initial_len - entries.len();
        debug!(removed, "purged expired kvs entries");
        removed
    }

    /// Number of entries currently held, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn set(&self, key: &str, value: &str, ttl: Duration) -> KvsFuture<'_, ()> {
        let key = key.to_string();
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };

        Box::pin(async move {
            self.entries.write().await.insert(key, entry);
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> KvsFuture<'_, ()> {
        let key = key.to_string();

        Box::pin(async move {
            self.entries.write().await.remove(&key);
            Ok(())
        })
    }

    fn exists(&self, key: &str) -> KvsFuture<'_, u64> {
        let key = key.to_string();

        Box::pin(async move {
            let mut entries = self.entries.write().await;

            match entries.get(&key) {
                Some(entry) if entry.expires_at > Instant::now() => Ok(1),
                Some(_) => {
                    entries.remove(&key);
                    Ok(0)
                }
                None => Ok(0),
            }
        })
    }

    fn purge_expired(&self) -> KvsFuture<'_, usize> {
        Box::pin(async move { Ok(MemoryStore::purge_expired(self).await) })
    }
}
