//! Key-value store abstraction backing the session registry.
//!
//! The registry only needs three primitives: SET with a TTL, DEL and EXISTS.
//! Each call is a single round-trip and atomic for its own key; nothing here
//! coordinates across keys.

mod memory;
mod surreal;

pub use memory::MemoryStore;
pub use surreal::SurrealStore;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum KvsError {
    #[error("key-value store error: {0}")]
    Backend(String),
}

/// Boxed future returned by [`KeyValueStore`] operations.
pub type KvsFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, KvsError>> + Send + 'a>>;

/// Minimal TTL-aware key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value, for `ttl`.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> KvsFuture<'_, ()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn delete(&self, key: &str) -> KvsFuture<'_, ()>;

    /// Number of live entries stored under `key` (0 or 1).
    fn exists(&self, key: &str) -> KvsFuture<'_, u64>;

    /// Drop entries whose TTL has lapsed, returning how many were removed.
    fn purge_expired(&self) -> KvsFuture<'_, usize>;
}
