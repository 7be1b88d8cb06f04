pub mod http;
pub mod meta_search;
pub mod providers;

pub use http::{HttpClient, HttpResponse, ReqwestHttpClient};
pub use meta_search::{AggregatedItems, MetaSearchClient, MetaSearchConfig};

use serde::{Deserialize, Serialize};

/// Catalog an item was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemSource {
    /// Allegro, the auction marketplace
    #[serde(rename = "Allegro")]
    AuctionMarketplace,
    /// Google Books, the book catalog
    #[serde(rename = "Google Books")]
    BookCatalog,
}

impl std::fmt::Display for ItemSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuctionMarketplace => write!(f, "Allegro"),
            Self::BookCatalog => write!(f, "Google Books"),
        }
    }
}

/// An offer in the shape every provider normalizes to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub name: String,
    /// Product page, if the provider exposes one
    pub link: Option<String>,
    /// Non-negative; `0.0` when the provider gives no price
    pub price: f64,
    pub currency: Option<String>,
    /// ISBN-13, if resolvable
    pub isbn: Option<String>,
    pub source: ItemSource,
}

/// Stable in-place sort by ascending price.
///
/// Ties keep their relative order, which is what makes provider order
/// observable after merging.
pub fn sort_by_price(items: &mut [NormalizedItem]) {
    items.sort_by(|a, b| a.price.total_cmp(&b.price));
}
