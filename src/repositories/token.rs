//! # Token Cache
//!
//! Best-effort storage for short-lived bearer tokens. Reads treat an
//! unreachable or corrupt cache as a miss and writes report failure through
//! their return value only, so authentication keeps working without a cache.

use super::cache::CacheStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A bearer token and the instant it stops being valid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Token valid for `lifetime_secs` from `now`; `None` if the expiry is
    /// not representable
    #[must_use]
    pub fn issued_at(token: String, now: DateTime<Utc>, lifetime_secs: u64) -> Option<Self> {
        let lifetime = chrono::Duration::try_seconds(i64::try_from(lifetime_secs).ok()?)?;
        let expires_at = now.checked_add_signed(lifetime)?;
        Some(Self { token, expires_at })
    }

    /// Usable strictly before `expires_at`
    #[must_use]
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.is_usable_at(Utc::now())
    }
}

/// Named token storage on top of a shared [`CacheStore`]
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn CacheStore>,
}

impl std::fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCache")
            .field("store", &self.store.name())
            .finish()
    }
}

impl TokenCache {
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Cached token under `key`, whether or not it has expired
    pub async fn get(&self, key: &str) -> Option<CachedToken> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Token cache miss for {}", key);
                return None;
            }
            Err(e) => {
                warn!("Token cache read failed, treating as miss: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Discarding unreadable cached token for {}: {}", key, e);
                None
            }
        }
    }

    /// Store `token` under `key`; returns whether the write reached the cache
    pub async fn set(&self, key: &str, token: &CachedToken, ttl: Duration) -> bool {
        let raw = match serde_json::to_string(token) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize token for {}: {}", key, e);
                return false;
            }
        };

        match self.store.set(key, &raw, ttl).await {
            Ok(()) => {
                debug!("Cached token {} until {}", key, token.expires_at);
                true
            }
            Err(e) => {
                warn!("Token cache write failed, continuing without cache: {}", e);
                false
            }
        }
    }
}
