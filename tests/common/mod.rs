#![allow(dead_code)]

use async_trait::async_trait;
use book_price_search::config::HttpConfig;
use book_price_search::repositories::CacheError;
use book_price_search::{
    CacheStore, Config, HttpClient, InMemoryCacheStore, MetaSearchClient, ReqwestHttpClient,
    SearchTool,
};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

pub const TOKEN_PATH: &str = "/auth/oauth/token";
pub const LISTING_PATH: &str = "/offers/listing";
pub const VOLUMES_PATH: &str = "/books/v1/volumes";

/// Configuration with every upstream pointed at the mock server
pub fn config_for(server: &MockServer, with_credentials: bool) -> Config {
    let mut config = Config::default();
    config.allegro.token_url = format!("{}{}", server.uri(), TOKEN_PATH);
    config.allegro.listing_url = format!("{}{}", server.uri(), LISTING_PATH);
    config.google_books.volumes_url = format!("{}{}", server.uri(), VOLUMES_PATH);
    config.search.provider_timeout_secs = 5;
    if with_credentials {
        config.allegro.client_id = Some("test-client".to_string());
        config.allegro.client_secret = Some("test-secret".to_string());
    }
    config
}

pub fn http_client() -> Arc<dyn HttpClient> {
    let config = HttpConfig {
        timeout_secs: 5,
        ..HttpConfig::default()
    };
    Arc::new(ReqwestHttpClient::new(&config).unwrap())
}

pub fn search_tool(config: &Config, cache: Arc<dyn CacheStore>) -> SearchTool {
    let client = MetaSearchClient::new(config, http_client(), cache);
    SearchTool::new(Arc::new(client))
}

pub fn memory_tool(config: &Config) -> SearchTool {
    search_tool(config, Arc::new(InMemoryCacheStore::new()))
}

/// Cache backend whose every call fails as if the server were down
pub struct UnreachableCache;

#[async_trait]
impl CacheStore for UnreachableCache {
    fn name(&self) -> &'static str {
        "unreachable"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".to_string()))
    }
}
