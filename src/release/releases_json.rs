//! Vendor `releases.json` document parser

use serde::Deserialize;
use tracing::debug;

use crate::release::types::RawRelease;

#[derive(Debug, thiserror::Error)]
pub enum ParseReleasesError {
    #[error("Invalid releases document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level releases document
#[derive(Debug, Deserialize)]
struct ReleasesDocument {
    #[serde(default)]
    releases: Vec<RawRelease>,
}

/// Parse a releases document, keeping records for `release_product` in
/// document order.
pub fn parse_releases(
    content: &str,
    release_product: &str,
) -> Result<Vec<RawRelease>, ParseReleasesError> {
    let document: ReleasesDocument = serde_json::from_str(content)?;
    let total = document.releases.len();

    let releases: Vec<RawRelease> = document
        .releases
        .into_iter()
        .filter(|release| release.product == release_product)
        .collect();

    debug!(
        "Kept {} of {} release records for product {:?}",
        releases.len(),
        total,
        release_product
    );

    Ok(releases)
}
