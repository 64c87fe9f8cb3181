//! HTTP implementation of the release fetcher

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{DEFAULT_RELEASES_BASE_URL, FETCH_TIMEOUT_SECS, ProductConfig};
use crate::release::fetcher::{FetchError, Fetcher};

/// Fetches `{base_url}/{cloud}/releases.json` for each product
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    /// Creates a new HttpFetcher with a custom base URL
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent("release-matrix")
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_default_url() -> Result<Self, FetchError> {
        Self::new(DEFAULT_RELEASES_BASE_URL)
    }

    fn releases_url(&self, product: &ProductConfig) -> String {
        format!("{}/{}/releases.json", self.base_url, product.cloud)
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_releases(&self, product: &ProductConfig) -> Result<String, FetchError> {
        let url = self.releases_url(product);
        debug!("Fetching releases for {}: {}", product.product, url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(url));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(FetchError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            warn!("Release server returned status {}: {}", status, url);
            return Err(FetchError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::types::ProductId;
    use mockito::Server;

    fn product(cloud: &str) -> ProductConfig {
        ProductConfig {
            product: ProductId::new("NxWitness"),
            cloud: cloud.to_string(),
            release_product: "vms".to_string(),
        }
    }

    #[tokio::test]
    async fn fetch_releases_returns_document_body() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/default/releases.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"releases": []}"#)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&server.url()).unwrap();
        let body = fetcher.fetch_releases(&product("default")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(body, r#"{"releases": []}"#);
    }

    #[tokio::test]
    async fn fetch_releases_returns_not_found_for_unknown_cloud() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/missing/releases.json")
            .with_status(404)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&server.url()).unwrap();
        let result = fetcher.fetch_releases(&product("missing")).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn fetch_releases_reports_rate_limit_with_retry_after() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/hanwha/releases.json")
            .with_status(429)
            .with_header("retry-after", "120")
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&server.url()).unwrap();
        let result = fetcher.fetch_releases(&product("hanwha")).await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(FetchError::RateLimited {
                retry_after_secs: Some(120)
            })
        ));
    }

    #[tokio::test]
    async fn fetch_releases_rejects_server_error() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/default/releases.json")
            .with_status(503)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(&server.url()).unwrap();
        let result = fetcher.fetch_releases(&product("default")).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
    }

    #[test]
    fn releases_url_ignores_trailing_slash() {
        let fetcher = HttpFetcher::new("https://updates.example.com/").unwrap();
        assert_eq!(
            fetcher.releases_url(&product("metavms")),
            "https://updates.example.com/metavms/releases.json"
        );
    }
}
