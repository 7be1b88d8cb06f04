pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod ports;
pub mod repositories;
pub mod server;
pub mod tools;

pub use client::{
    HttpClient, HttpResponse, ItemSource, MetaSearchClient, MetaSearchConfig, NormalizedItem,
    ReqwestHttpClient,
};
pub use config::{Config, Credentials};
pub use error::{Error, Result};
pub use ports::SearchServicePort;
pub use repositories::{CacheStore, CachedToken, InMemoryCacheStore, TokenCache};
pub use server::Server;
pub use tools::{group_by_isbn, IsbnGroup, SearchResponse, SearchTool};

use std::sync::Arc;

/// Wire the production search stack from configuration.
///
/// Builds the reqwest-backed HTTP client, the configured cache backend and
/// both providers, and returns the tool the HTTP layer and CLI call into.
pub fn build_search_tool(config: &Config) -> Result<SearchTool> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new(&config.http)?);
    let cache = repositories::build_cache_store(&config.cache);
    let meta_client = MetaSearchClient::new(config, http, cache);
    Ok(SearchTool::new(Arc::new(meta_client)))
}
