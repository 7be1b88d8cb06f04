//! # Search Service Port
//!
//! The contract the HTTP layer and CLI depend on. It hides how providers are
//! reached and merged, so the web layer can be exercised against a stub.

use crate::tools::SearchResponse;
use crate::Result;
use async_trait::async_trait;

/// Port interface for grouped book price search
///
/// Implementations must absorb provider failures: a degraded provider only
/// shrinks the result. `Err` is reserved for:
/// - invalid input (`Error::InvalidInput`, a client error)
/// - failures that leave no meaningful result at all
#[async_trait]
pub trait SearchServicePort: Send + Sync {
    /// Search every provider for `phrase` and return offers grouped by ISBN
    async fn search(&self, phrase: &str) -> Result<SearchResponse>;
}
