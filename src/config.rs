//! # Configuration
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `BOOK_SEARCH__`-prefixed environment variables (`__` separates nesting,
//! e.g. `BOOK_SEARCH__SERVER__PORT=9000`). Allegro credentials are read
//! separately from `ALLEGRO_CLIENT_ID` / `ALLEGRO_CLIENT_SECRET`; their absence
//! is a valid state that disables the marketplace provider.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Environment prefix for layered settings
pub const ENV_PREFIX: &str = "BOOK_SEARCH";

/// Environment prefix for marketplace credentials
pub const CREDENTIALS_ENV_PREFIX: &str = "ALLEGRO_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub allegro: AllegroConfig,
    pub google_books: GoogleBooksConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Auction marketplace settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AllegroConfig {
    /// OAuth token endpoint (client-credentials grant)
    pub token_url: String,
    /// Offer listing endpoint
    pub listing_url: String,
    /// Prefix an offer id is appended to when building item links
    pub offer_url_prefix: String,
    /// Category the keyword search is scoped to
    pub category_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl Default for AllegroConfig {
    fn default() -> Self {
        Self {
            token_url: "https://allegro.pl/auth/oauth/token".to_string(),
            listing_url: "https://api.allegro.pl/offers/listing".to_string(),
            offer_url_prefix: "https://allegro.pl/oferta/".to_string(),
            category_id: "7".to_string(),
            client_id: None,
            client_secret: None,
        }
    }
}

impl std::fmt::Debug for AllegroConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllegroConfig")
            .field("token_url", &self.token_url)
            .field("listing_url", &self.listing_url)
            .field("offer_url_prefix", &self.offer_url_prefix)
            .field("category_id", &self.category_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AllegroConfig {
    /// Client id and secret, only when both are present and non-empty
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let id = self.client_id.as_deref().filter(|s| !s.is_empty())?;
        let secret = self.client_secret.as_deref().filter(|s| !s.is_empty())?;
        Some((id, secret))
    }
}

/// Book catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleBooksConfig {
    pub volumes_url: String,
    /// Locale the catalog prices and availability are resolved for
    pub country: String,
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            volumes_url: "https://www.googleapis.com/books/v1/volumes".to_string(),
            country: "pl".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local store; tokens are not shared between processes
    #[default]
    Memory,
    /// Shared memcached server
    Memcached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub memcached_address: String,
    pub io_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            memcached_address: "127.0.0.1:11211".to_string(),
            io_timeout_ms: 500,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

/// Outbound HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 8,
            connect_timeout_secs: 3,
            user_agent: concat!("book-price-search/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Upper bound on a single provider's search, token exchange included
    pub provider_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Marketplace credentials as found in the process environment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Credentials {
    /// Read `ALLEGRO_CLIENT_ID` and `ALLEGRO_CLIENT_SECRET`
    pub fn from_env() -> Result<Self> {
        Ok(envy::prefixed(CREDENTIALS_ENV_PREFIX).from_env::<Self>()?)
    }
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.apply_credentials(Credentials::from_env()?);
        config.validate()?;
        Ok(config)
    }

    /// Overlay credentials; empty values never replace configured ones
    pub fn apply_credentials(&mut self, credentials: Credentials) {
        if let Some(id) = credentials.client_id.filter(|s| !s.is_empty()) {
            self.allegro.client_id = Some(id);
        }
        if let Some(secret) = credentials.client_secret.filter(|s| !s.is_empty()) {
            self.allegro.client_secret = Some(secret);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "Port must be non-zero"));
        }
        if self.http.timeout_secs == 0 || self.http.connect_timeout_secs == 0 {
            return Err(invalid("http", "Timeouts must be greater than zero"));
        }
        if self.search.provider_timeout_secs == 0 {
            return Err(invalid(
                "search.provider_timeout_secs",
                "Provider timeout must be greater than zero",
            ));
        }
        if self.cache.io_timeout_ms == 0 {
            return Err(invalid("cache.io_timeout_ms", "Cache timeout must be greater than zero"));
        }
        if self.cache.backend == CacheBackend::Memcached && self.cache.memcached_address.is_empty()
        {
            return Err(invalid("cache.memcached_address", "Address cannot be empty"));
        }

        for (field, value) in [
            ("allegro.token_url", &self.allegro.token_url),
            ("allegro.listing_url", &self.allegro.listing_url),
            ("allegro.offer_url_prefix", &self.allegro.offer_url_prefix),
            ("google_books.volumes_url", &self.google_books.volumes_url),
        ] {
            Url::parse(value).map_err(|e| invalid(field, &format!("Invalid URL '{value}': {e}")))?;
        }

        if self.allegro.category_id.trim().is_empty() {
            return Err(invalid("allegro.category_id", "Category cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::InvalidInput {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.allegro.category_id, "7");
        assert_eq!(config.google_books.country, "pl");
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(config.allegro.credentials().is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidInput { .. })));

        let mut config = Config::default();
        config.allegro.listing_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidInput { field, .. }) if field == "allegro.listing_url"));

        let mut config = Config::default();
        config.search.provider_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_credentials_require_both_values() {
        let mut config = Config::default();
        config.allegro.client_id = Some("id".to_string());
        assert!(config.allegro.credentials().is_none());

        config.allegro.client_secret = Some(String::new());
        assert!(config.allegro.credentials().is_none());

        config.allegro.client_secret = Some("secret".to_string());
        assert_eq!(config.allegro.credentials(), Some(("id", "secret")));
    }

    #[test]
    fn test_apply_credentials_ignores_empty_values() {
        let mut config = Config::default();
        config.allegro.client_id = Some("from-file".to_string());

        config.apply_credentials(Credentials {
            client_id: Some(String::new()),
            client_secret: Some("secret".to_string()),
        });

        assert_eq!(config.allegro.client_id.as_deref(), Some("from-file"));
        assert_eq!(config.allegro.client_secret.as_deref(), Some("secret"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut config = AllegroConfig::default();
        config.client_secret = Some("hunter2".to_string());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
