//! Version set builders

use release_matrix::release::ProductId;
use release_matrix::version::{Label, ProductVersionSet, Version, VersionEntry};

/// Build a version set from `(version, labels)` pairs
pub fn version_set(product: &str, entries: &[(&str, &[Label])]) -> ProductVersionSet {
    ProductVersionSet::new(
        ProductId::new(product),
        entries
            .iter()
            .map(|(version, labels)| {
                VersionEntry::new(Version::parse(version).unwrap(), labels.iter().copied())
            })
            .collect(),
    )
}

/// `(version, labels)` pairs of a set, for readable assertions
pub fn labels_of(set: &ProductVersionSet) -> Vec<(String, Vec<Label>)> {
    set.entries()
        .iter()
        .map(|entry| {
            (
                entry.version.to_string(),
                entry.labels.iter().copied().collect(),
            )
        })
        .collect()
}
