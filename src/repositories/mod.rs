//! # Cache Repositories
//!
//! Storage for state that outlives a single search: today that is only the
//! marketplace bearer token.
//!
//! - [`CacheStore`]: the key/value capability, with TTL
//! - [`InMemoryCacheStore`]: process-local backend, also the test double
//! - [`MemcachedCacheStore`]: shared backend on a memcached server
//! - [`TokenCache`]: typed, failure-tolerant token access on top of a store
//!
//! ## Usage Example
//!
//! ```no_run
//! use book_price_search::repositories::{CachedToken, InMemoryCacheStore, TokenCache};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() {
//! let tokens = TokenCache::new(Arc::new(InMemoryCacheStore::new()));
//! let token = CachedToken::issued_at("abc".to_string(), chrono::Utc::now(), 3600).unwrap();
//! tokens.set("auth_token", &token, Duration::from_secs(3600)).await;
//!
//! let cached = tokens.get("auth_token").await;
//! assert!(cached.is_some_and(|t| t.is_usable()));
//! # }
//! ```

pub mod cache;
pub mod memcached;
pub mod token;

pub use cache::{CacheError, CacheStore, InMemoryCacheStore};
pub use memcached::MemcachedCacheStore;
pub use token::{CachedToken, TokenCache};

use crate::config::{CacheBackend, CacheConfig};
use std::sync::Arc;
use tracing::info;

/// Build the configured cache backend
#[must_use]
pub fn build_cache_store(config: &CacheConfig) -> Arc<dyn CacheStore> {
    match config.backend {
        CacheBackend::Memory => {
            info!("Using in-memory token cache");
            Arc::new(InMemoryCacheStore::new())
        }
        CacheBackend::Memcached => {
            info!("Using memcached token cache at {}", config.memcached_address);
            Arc::new(MemcachedCacheStore::new(
                config.memcached_address.clone(),
                config.io_timeout(),
            ))
        }
    }
}
