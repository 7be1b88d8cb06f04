use crate::client::{ItemSource, NormalizedItem};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during provider operations
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The provider answered, but not in the shape we decode
    #[error("Unexpected response shape: {0}")]
    DataShape(String),

    #[error("Timeout occurred after {0:?}")]
    Timeout(Duration),

    #[error("Provider error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::DataShape(err.to_string())
    }
}

/// A catalog that can be searched by phrase.
///
/// Degraded outcomes (no credentials, rejected token exchange) are `Ok` with
/// an empty list. `Err` is reserved for failures the aggregator should log
/// before discarding this provider's contribution.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Unique name/identifier for this provider
    fn name(&self) -> &str;

    /// Source tag every returned item must carry; the aggregator drops items
    /// tagged otherwise
    fn source(&self) -> ItemSource;

    async fn search(&self, phrase: &str) -> Result<Vec<NormalizedItem>, ProviderError>;
}

/// A price amount that providers send either as a decimal string or a number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Decode into a finite, non-negative price
    pub fn to_price(&self) -> Result<f64, ProviderError> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| ProviderError::DataShape(format!("Invalid price amount '{s}': {e}")))?,
        };

        if !value.is_finite() || value < 0.0 {
            return Err(ProviderError::DataShape(format!(
                "Price amount out of range: {value}"
            )));
        }

        Ok(value)
    }
}
