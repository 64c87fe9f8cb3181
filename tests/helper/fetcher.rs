//! Release source test utilities

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use release_matrix::config::ProductConfig;
use release_matrix::release::fetcher::{FetchError, Fetcher};

/// Stub fetcher serving canned releases documents per cloud
pub struct StubFetcher {
    documents: Mutex<HashMap<String, String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_document(self, cloud: &str, document: String) -> Self {
        self.set_document(cloud, document);
        self
    }

    /// Replace the document served for `cloud` between runs
    pub fn set_document(&self, cloud: &str, document: String) {
        self.documents
            .lock()
            .unwrap()
            .insert(cloud.to_string(), document);
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch_releases(&self, product: &ProductConfig) -> Result<String, FetchError> {
        self.documents
            .lock()
            .unwrap()
            .get(&product.cloud)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(product.cloud.clone()))
    }
}

/// A release record as served by the vendor
pub struct Release {
    pub version: &'static str,
    pub publication_type: &'static str,
    pub published: bool,
}

pub fn release(version: &'static str, publication_type: &'static str, published: bool) -> Release {
    Release {
        version,
        publication_type,
        published,
    }
}

/// Build a releases document for the `vms` product
pub fn releases_document(releases: &[Release]) -> String {
    let records: Vec<_> = releases
        .iter()
        .map(|r| {
            json!({
                "product": "vms",
                "version": r.version,
                "publication_type": r.publication_type,
                "release_date": if r.published { 1700000000 } else { 0 },
                "release_delivery_days": if r.published { 14 } else { -1 },
            })
        })
        .collect();

    json!({ "releases": records }).to_string()
}
