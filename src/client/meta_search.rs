use crate::client::providers::{AllegroProvider, GoogleBooksProvider, ProviderError, SourceProvider};
use crate::client::{sort_by_price, HttpClient, NormalizedItem};
use crate::repositories::{CacheStore, TokenCache};
use crate::Config;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{info, instrument, warn};

/// Configuration for meta-search behavior
#[derive(Debug, Clone)]
pub struct MetaSearchConfig {
    /// Upper bound on one provider's search, including authentication
    pub provider_timeout: Duration,
}

impl Default for MetaSearchConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
        }
    }
}

/// Merged provider results, sorted by ascending price
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedItems {
    pub items: Vec<NormalizedItem>,
}

/// Fans a search out to every provider and merges the results.
///
/// Providers are queried concurrently. A provider that fails or times out
/// contributes nothing; the others are unaffected.
pub struct MetaSearchClient {
    providers: Vec<Arc<dyn SourceProvider>>,
    config: MetaSearchConfig,
}

impl std::fmt::Debug for MetaSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaSearchClient")
            .field("providers", &self.providers())
            .field("config", &self.config)
            .finish()
    }
}

impl MetaSearchClient {
    /// Create the client with the marketplace and the book catalog, in that order
    #[must_use]
    pub fn new(app_config: &Config, http: Arc<dyn HttpClient>, cache: Arc<dyn CacheStore>) -> Self {
        let providers: Vec<Arc<dyn SourceProvider>> = vec![
            Arc::new(AllegroProvider::new(
                Arc::clone(&http),
                TokenCache::new(cache),
                app_config.allegro.clone(),
            )),
            Arc::new(GoogleBooksProvider::new(http, app_config.google_books.clone())),
        ];

        let meta_config = MetaSearchConfig {
            provider_timeout: Duration::from_secs(app_config.search.provider_timeout_secs),
        };

        Self::with_providers(providers, meta_config)
    }

    /// Create the client with an explicit provider list; result order on
    /// price ties follows this list
    #[must_use]
    pub fn with_providers(providers: Vec<Arc<dyn SourceProvider>>, config: MetaSearchConfig) -> Self {
        info!(
            "Initialized meta-search client with {} providers",
            providers.len()
        );
        Self { providers, config }
    }

    /// Get list of available providers
    #[must_use]
    pub fn providers(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Search every provider and merge the results by ascending price
    #[instrument(skip(self))]
    pub async fn search_all(&self, phrase: &str) -> AggregatedItems {
        let start_time = Instant::now();

        let searches = self
            .providers
            .iter()
            .map(|provider| self.search_isolated(provider.as_ref(), phrase));
        let mut items: Vec<NormalizedItem> = join_all(searches).await.into_iter().flatten().collect();

        sort_by_price(&mut items);

        info!(
            "Meta-search completed: {} items in {:?}",
            items.len(),
            start_time.elapsed()
        );

        AggregatedItems { items }
    }

    async fn search_isolated(&self, provider: &dyn SourceProvider, phrase: &str) -> Vec<NormalizedItem> {
        let outcome = timeout(self.config.provider_timeout, provider.search(phrase))
            .await
            .unwrap_or(Err(ProviderError::Timeout(self.config.provider_timeout)));

        match outcome {
            Ok(mut items) => {
                let returned = items.len();
                let source = provider.source();
                items.retain(|item| item.source == source);
                if items.len() < returned {
                    warn!(
                        "Provider {} returned {} items not tagged {}, dropping them",
                        provider.name(),
                        returned - items.len(),
                        source
                    );
                }

                info!("Provider {} returned {} items", provider.name(), items.len());
                items
            }
            Err(e) => {
                warn!("Provider {} failed, dropping its results: {}", provider.name(), e);
                Vec::new()
            }
        }
    }
}
