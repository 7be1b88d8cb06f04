use super::traits::{Amount, ProviderError, SourceProvider};
use crate::client::{HttpClient, ItemSource, NormalizedItem};
use crate::config::AllegroConfig;
use crate::repositories::{CachedToken, TokenCache};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Cache key the marketplace bearer token is stored under
pub const TOKEN_CACHE_KEY: &str = "auth_token";

const PUBLIC_API_MEDIA_TYPE: &str = "application/vnd.allegro.public.v1+json";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    items: Option<ListingItems>,
}

#[derive(Debug, Deserialize)]
struct ListingItems {
    #[serde(default)]
    promoted: Vec<Offer>,
    #[serde(default)]
    regular: Vec<Offer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Offer {
    id: String,
    name: String,
    selling_mode: SellingMode,
}

#[derive(Debug, Deserialize)]
struct SellingMode {
    price: OfferPrice,
}

#[derive(Debug, Deserialize)]
struct OfferPrice {
    amount: Amount,
    currency: String,
}

/// Allegro marketplace provider.
///
/// Authenticates with the OAuth client-credentials grant and reuses the
/// bearer token through the shared [`TokenCache`] until it expires.
pub struct AllegroProvider {
    http: Arc<dyn HttpClient>,
    tokens: TokenCache,
    config: AllegroConfig,
}

impl std::fmt::Debug for AllegroProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllegroProvider")
            .field("tokens", &self.tokens)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AllegroProvider {
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, tokens: TokenCache, config: AllegroConfig) -> Self {
        Self {
            http,
            tokens,
            config,
        }
    }

    /// Cached bearer token, or a fresh one from the token endpoint.
    ///
    /// `None` means the provider cannot authenticate right now (no
    /// credentials, or the exchange failed); the reason is logged.
    #[instrument(skip(self))]
    pub async fn get_or_create_token(&self) -> Option<String> {
        if let Some(cached) = self.tokens.get(TOKEN_CACHE_KEY).await {
            if cached.is_usable() {
                debug!("Using cached Allegro token valid until {}", cached.expires_at);
                return Some(cached.token);
            }
            debug!("Cached Allegro token expired at {}", cached.expires_at);
        }

        let Some((client_id, client_secret)) = self.config.credentials() else {
            info!("Allegro credentials not configured, skipping marketplace search");
            return None;
        };

        match self.request_token(client_id, client_secret).await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("Allegro authentication failed: {}", e);
                None
            }
        }
    }

    async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, ProviderError> {
        let mut url = parse_url(&self.config.token_url)?;
        url.query_pairs_mut()
            .append_pair("grant_type", "client_credentials");

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            header_value(&format!(
                "Basic {}",
                basic_credentials(client_id, client_secret)
            ))?,
        );

        let response = self.http.post(&url, headers).await?;
        if !response.is_success() {
            return Err(ProviderError::Auth(format!(
                "token endpoint returned HTTP {}: {}",
                response.status, response.body
            )));
        }

        let grant: TokenResponse = serde_json::from_value(response.body)
            .map_err(|e| ProviderError::Auth(format!("malformed token response: {e}")))?;
        let access_token = grant
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::Auth("token response has no access_token".to_string()))?;

        let Some(expires_in) = grant.expires_in else {
            warn!("Allegro token response has no expires_in, token will not be cached");
            return Ok(access_token);
        };

        match CachedToken::issued_at(access_token.clone(), Utc::now(), expires_in) {
            Some(cached) => {
                self.tokens
                    .set(TOKEN_CACHE_KEY, &cached, Duration::from_secs(expires_in))
                    .await;
            }
            None => warn!("Allegro token lifetime {}s out of range, not caching", expires_in),
        }

        info!("Obtained new Allegro token (expires in {}s)", expires_in);
        Ok(access_token)
    }

    fn build_search_url(&self, phrase: &str) -> Result<Url, ProviderError> {
        let mut url = parse_url(&self.config.listing_url)?;
        url.query_pairs_mut()
            .append_pair("category.id", &self.config.category_id)
            .append_pair("phrase", phrase);
        Ok(url)
    }

    /// Map a listing body to normalized items.
    ///
    /// A body without an `items` container is an empty result. Any offer
    /// missing a required field fails the whole listing.
    fn parse_listing(&self, body: Value) -> Result<Vec<NormalizedItem>, ProviderError> {
        if !body.is_object() {
            debug!("Allegro listing body is not an object, treating as empty");
            return Ok(Vec::new());
        }

        let listing: ListingResponse = serde_json::from_value(body)?;
        let Some(items) = listing.items else {
            debug!("Allegro listing has no items container");
            return Ok(Vec::new());
        };

        items
            .promoted
            .into_iter()
            .chain(items.regular)
            .map(|offer| {
                Ok::<_, ProviderError>(NormalizedItem {
                    link: Some(format!("{}{}", self.config.offer_url_prefix, offer.id)),
                    name: offer.name,
                    price: offer.selling_mode.price.amount.to_price()?,
                    currency: Some(offer.selling_mode.price.currency),
                    isbn: None,
                    source: ItemSource::AuctionMarketplace,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SourceProvider for AllegroProvider {
    fn name(&self) -> &str {
        "allegro"
    }

    fn source(&self) -> ItemSource {
        ItemSource::AuctionMarketplace
    }

    #[instrument(skip(self))]
    async fn search(&self, phrase: &str) -> Result<Vec<NormalizedItem>, ProviderError> {
        let Some(token) = self.get_or_create_token().await else {
            return Ok(Vec::new());
        };

        let url = self.build_search_url(phrase)?;
        debug!("Allegro search URL: {}", url);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        headers.insert(ACCEPT, HeaderValue::from_static(PUBLIC_API_MEDIA_TYPE));

        let response = self.http.get(&url, headers).await?;
        if !response.is_success() {
            warn!(
                "Allegro listing returned HTTP {}: {}",
                response.status, response.body
            );
        }

        self.parse_listing(response.body)
    }
}

/// `base64("id:secret")` for a Basic authorization header
fn basic_credentials(client_id: &str, client_secret: &str) -> String {
    BASE64.encode(format!("{client_id}:{client_secret}"))
}

fn parse_url(raw: &str) -> Result<Url, ProviderError> {
    Url::parse(raw).map_err(|e| ProviderError::Other(format!("Invalid URL '{raw}': {e}")))
}

fn header_value(raw: &str) -> Result<HeaderValue, ProviderError> {
    HeaderValue::from_str(raw)
        .map_err(|e| ProviderError::Other(format!("Invalid header value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::InMemoryCacheStore;
    use serde_json::json;

    struct NoNetwork;

    #[async_trait]
    impl HttpClient for NoNetwork {
        async fn get(
            &self,
            url: &Url,
            _headers: HeaderMap,
        ) -> Result<crate::client::HttpResponse, ProviderError> {
            Err(ProviderError::Network(format!("unexpected GET {url}")))
        }

        async fn post(
            &self,
            url: &Url,
            _headers: HeaderMap,
        ) -> Result<crate::client::HttpResponse, ProviderError> {
            Err(ProviderError::Network(format!("unexpected POST {url}")))
        }
    }

    fn provider() -> AllegroProvider {
        AllegroProvider::new(
            Arc::new(NoNetwork),
            TokenCache::new(Arc::new(InMemoryCacheStore::new())),
            AllegroConfig::default(),
        )
    }

    #[test]
    fn test_basic_credentials() {
        assert_eq!(basic_credentials("abc", "def"), "YWJjOmRlZg==");
    }

    #[test]
    fn test_search_url_encodes_phrase() {
        let url = provider().build_search_url("clean code").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.allegro.pl/offers/listing?category.id=7&phrase=clean+code"
        );
    }

    #[test]
    fn test_parse_listing_concatenates_promoted_then_regular() {
        let body = json!({
            "items": {
                "promoted": [
                    {"id": "1", "name": "Clean Code", "sellingMode": {"price": {"amount": "45.00", "currency": "PLN"}}}
                ],
                "regular": [
                    {"id": "2", "name": "Clean Code (used)", "sellingMode": {"price": {"amount": "19.99", "currency": "PLN"}}}
                ]
            }
        });

        let items = provider().parse_listing(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Clean Code");
        assert_eq!(items[0].link.as_deref(), Some("https://allegro.pl/oferta/1"));
        assert!((items[0].price - 45.0).abs() < f64::EPSILON);
        assert_eq!(items[1].currency.as_deref(), Some("PLN"));
        assert!(items.iter().all(|i| i.isbn.is_none()));
        assert!(items.iter().all(|i| i.source == ItemSource::AuctionMarketplace));
    }

    #[test]
    fn test_parse_listing_empty_containers() {
        let body = json!({"items": {"promoted": [], "regular": []}});
        assert!(provider().parse_listing(body).unwrap().is_empty());

        let body = json!({"items": {}});
        assert!(provider().parse_listing(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_listing_without_items() {
        assert!(provider().parse_listing(json!({"invalid": {}})).unwrap().is_empty());
        assert!(provider().parse_listing(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_parse_listing_missing_price_is_data_shape_error() {
        let body = json!({
            "items": {
                "promoted": [],
                "regular": [{"id": "2", "name": "No price", "sellingMode": {}}]
            }
        });

        let result = provider().parse_listing(body);
        assert!(matches!(result, Err(ProviderError::DataShape(_))));
    }

    #[tokio::test]
    async fn test_missing_credentials_returns_empty_without_network() {
        let items = provider().search("clean code").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_usable_cached_token_skips_exchange() {
        let store = Arc::new(InMemoryCacheStore::new());
        let tokens = TokenCache::new(store);
        let cached = CachedToken::issued_at("cached".to_string(), Utc::now(), 3600).unwrap();
        tokens
            .set(TOKEN_CACHE_KEY, &cached, Duration::from_secs(3600))
            .await;

        let provider = AllegroProvider::new(Arc::new(NoNetwork), tokens, AllegroConfig::default());
        assert_eq!(provider.get_or_create_token().await.as_deref(), Some("cached"));
    }
}
