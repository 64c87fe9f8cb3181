//! Fetcher trait for retrieving release documents from the vendor

#[cfg(test)]
use mockall::automock;

use crate::config::ProductConfig;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Release document not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Trait for fetching the raw releases document of a product
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the releases document for a product
    ///
    /// # Returns
    /// * `Ok(String)` - Raw JSON text of the releases document
    /// * `Err(FetchError)` - If the fetch fails
    async fn fetch_releases(&self, product: &ProductConfig) -> Result<String, FetchError>;
}
