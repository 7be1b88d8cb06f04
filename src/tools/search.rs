use super::grouping::{group_by_isbn, IsbnGroup};
use crate::client::MetaSearchClient;
use crate::ports::SearchServicePort;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Longest phrase forwarded to the providers (local policy, not an upstream limit)
pub const MAX_PHRASE_LEN: usize = 500;

/// Result of a grouped search, as served to clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<IsbnGroup>,
}

/// Book price search: validate, aggregate across providers, group by ISBN
#[derive(Clone)]
pub struct SearchTool {
    client: Arc<MetaSearchClient>,
}

impl std::fmt::Debug for SearchTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchTool")
            .field("client", &self.client)
            .finish()
    }
}

impl SearchTool {
    #[must_use]
    pub fn new(client: Arc<MetaSearchClient>) -> Self {
        info!("Initializing book price search tool");
        Self { client }
    }

    /// Search all providers and group the offers by ISBN
    #[instrument(skip(self))]
    pub async fn search(&self, phrase: &str) -> Result<SearchResponse> {
        let phrase = Self::validate_phrase(phrase)?;
        let start_time = Instant::now();

        let aggregated = self.client.search_all(phrase).await;
        let items = group_by_isbn(aggregated.items);

        info!(
            "Search completed in {}ms: {} ISBN groups",
            start_time.elapsed().as_millis(),
            items.len() - 1
        );

        Ok(SearchResponse { items })
    }

    /// Trim the phrase and reject input no provider should see.
    ///
    /// Only emptiness comes from the upstream contract; the length cap and
    /// the NUL/ESC check are local policy.
    fn validate_phrase(phrase: &str) -> Result<&str> {
        let phrase = phrase.trim();

        if phrase.is_empty() {
            return Err(crate::Error::InvalidInput {
                field: "query".to_string(),
                reason: "Query cannot be empty".to_string(),
            });
        }

        if phrase.chars().count() > MAX_PHRASE_LEN {
            return Err(crate::Error::InvalidInput {
                field: "query".to_string(),
                reason: format!("Query too long (max {MAX_PHRASE_LEN} characters)"),
            });
        }

        if phrase.contains('\0') || phrase.contains('\x1b') {
            return Err(crate::Error::InvalidInput {
                field: "query".to_string(),
                reason: "Query contains invalid characters".to_string(),
            });
        }

        Ok(phrase)
    }
}

#[async_trait]
impl SearchServicePort for SearchTool {
    async fn search(&self, phrase: &str) -> Result<SearchResponse> {
        Self::search(self, phrase).await
    }
}
