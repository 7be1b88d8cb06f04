use super::traits::{Amount, ProviderError, SourceProvider};
use crate::client::{HttpClient, ItemSource, NormalizedItem};
use crate::config::GoogleBooksConfig;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

const ISBN_13: &str = "ISBN_13";

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: VolumeInfo,
    sale_info: SaleInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: String,
    industry_identifiers: Option<Vec<IndustryIdentifier>>,
}

/// Identifier entries are read leniently: a malformed entry is skipped,
/// it never fails the volume
#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: Option<String>,
    identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaleInfo {
    buy_link: Option<String>,
    list_price: Option<ListPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPrice {
    amount: Amount,
    currency_code: String,
}

impl Volume {
    fn isbn_13(&self) -> Option<String> {
        self.volume_info
            .industry_identifiers
            .as_deref()?
            .iter()
            .find(|id| id.kind.as_deref() == Some(ISBN_13))
            .and_then(|id| id.identifier.clone())
            .filter(|isbn| !isbn.is_empty())
    }

    fn into_item(self) -> Result<NormalizedItem, ProviderError> {
        let isbn = self.isbn_13();
        let (price, currency) = match self.sale_info.list_price {
            Some(list_price) => (list_price.amount.to_price()?, Some(list_price.currency_code)),
            None => (0.0, None),
        };

        Ok(NormalizedItem {
            name: self.volume_info.title,
            link: self.sale_info.buy_link,
            price,
            currency,
            isbn,
            source: ItemSource::BookCatalog,
        })
    }
}

/// Google Books catalog provider; unauthenticated
pub struct GoogleBooksProvider {
    http: Arc<dyn HttpClient>,
    config: GoogleBooksConfig,
}

impl std::fmt::Debug for GoogleBooksProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleBooksProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GoogleBooksProvider {
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>, config: GoogleBooksConfig) -> Self {
        Self { http, config }
    }

    fn build_search_url(&self, phrase: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.config.volumes_url).map_err(|e| {
            ProviderError::Other(format!(
                "Invalid URL '{}': {e}",
                self.config.volumes_url
            ))
        })?;
        url.query_pairs_mut()
            .append_pair("q", phrase)
            .append_pair("country", &self.config.country);
        Ok(url)
    }

    fn parse_volumes(body: Value) -> Result<Vec<NormalizedItem>, ProviderError> {
        if !body.is_object() {
            debug!("Google Books body is not an object, treating as empty");
            return Ok(Vec::new());
        }

        let response: VolumesResponse = serde_json::from_value(body)?;
        let Some(volumes) = response.items else {
            debug!("Google Books response has no items");
            return Ok(Vec::new());
        };

        volumes.into_iter().map(Volume::into_item).collect()
    }
}

#[async_trait]
impl SourceProvider for GoogleBooksProvider {
    fn name(&self) -> &str {
        "google_books"
    }

    fn source(&self) -> ItemSource {
        ItemSource::BookCatalog
    }

    #[instrument(skip(self))]
    async fn search(&self, phrase: &str) -> Result<Vec<NormalizedItem>, ProviderError> {
        let url = self.build_search_url(phrase)?;
        debug!("Google Books search URL: {}", url);

        let response = self.http.get(&url, HeaderMap::new()).await?;
        if !response.is_success() {
            warn!(
                "Google Books returned HTTP {}: {}",
                response.status, response.body
            );
        }

        Self::parse_volumes(response.body)
    }
}
