//! Release matrix consumed by the Dockerfile and Compose generators

use serde::Serialize;

use crate::release::types::ProductId;
use crate::version::label::Label;
use crate::version::store::VersionRecord;

/// One image to build: a product version and the tags it is published under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixImage {
    pub product: ProductId,
    pub version: String,
    pub labels: Vec<Label>,
    /// Version plus lower-cased labels, e.g. ["5.1.2.37996", "stable", "latest"]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseMatrix {
    pub images: Vec<MatrixImage>,
}

/// Flatten a version record into matrix rows, sorted by product then version.
pub fn build_matrix(record: &VersionRecord) -> ReleaseMatrix {
    let mut sets: Vec<_> = record.products().collect();
    sets.sort_by(|a, b| a.product().cmp(b.product()));

    let images = sets
        .into_iter()
        .flat_map(|set| {
            set.entries().iter().map(|entry| {
                let labels: Vec<Label> = entry.labels.iter().copied().collect();
                let tags = std::iter::once(entry.version.to_string())
                    .chain(labels.iter().map(|label| label.as_str().to_lowercase()))
                    .collect();

                MatrixImage {
                    product: set.product().clone(),
                    version: entry.version.to_string(),
                    labels,
                    tags,
                }
            })
        })
        .collect();

    ReleaseMatrix { images }
}
