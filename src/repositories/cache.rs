//! # Cache Store
//!
//! Key/value storage with per-entry TTL. The store is shared state outside
//! any single request, and callers must keep working when it is unreachable,
//! so connection problems are reported as [`CacheError::Unavailable`] and
//! never panic or block indefinitely.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Errors surfaced by a cache backend
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend could not be reached (refused, reset, timed out)
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with something we did not expect
    #[error("Cache protocol error: {0}")]
    Protocol(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

/// Shared key/value store with TTL support
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Get a value; `Ok(None)` on miss or expiry
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value, replacing any previous one
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// A cache entry with expiration support
#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(value: String, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: now.checked_add(ttl).unwrap_or(now + Duration::from_secs(86_400 * 365)),
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Process-local `CacheStore`.
///
/// Clones share the same map, so one instance can back every provider in the
/// process. Nothing is shared across processes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCacheStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl InMemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries.write().await;

        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };

        if entry.is_expired() {
            entries.remove(key);
            debug!("Cache entry expired and removed: {}", key);
            return Ok(None);
        }

        Ok(Some(entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        entries.retain(|_, entry| !entry.is_expired());
        debug!("Cached entry with key: {} (TTL: {:?})", key, ttl);
        Ok(())
    }
}
