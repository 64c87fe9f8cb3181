//! Labeled version entries and per-product version sets

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::release::types::ProductId;
use crate::version::comparator::Version;
use crate::version::error::InvariantError;
use crate::version::label::Label;

/// One version of a product and the channels pointing at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub version: Version,
    pub labels: BTreeSet<Label>,
}

impl VersionEntry {
    pub fn new(version: Version, labels: impl IntoIterator<Item = Label>) -> Self {
        Self {
            version,
            labels: labels.into_iter().collect(),
        }
    }

    pub fn has_label(&self, label: Label) -> bool {
        self.labels.contains(&label)
    }

    /// Same version text and label set
    fn is_identical(&self, other: &Self) -> bool {
        self.version.as_str() == other.version.as_str() && self.labels == other.labels
    }
}

/// The labeled versions of one product
///
/// Entries are kept sorted by version. A set is never mutated in place;
/// reconciliation builds a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVersionSet {
    product: ProductId,
    #[serde(rename = "versions")]
    entries: Vec<VersionEntry>,
}

impl ProductVersionSet {
    pub fn new(product: ProductId, mut entries: Vec<VersionEntry>) -> Self {
        entries.sort_by(|a, b| a.version.cmp(&b.version));
        Self { product, entries }
    }

    pub fn empty(product: ProductId) -> Self {
        Self::new(product, Vec::new())
    }

    pub fn product(&self) -> &ProductId {
        &self.product
    }

    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry carrying `label`, if any
    pub fn entry_for(&self, label: Label) -> Option<&VersionEntry> {
        self.entries.iter().find(|entry| entry.has_label(label))
    }

    /// The version `label` points at, if any
    pub fn version_for(&self, label: Label) -> Option<&Version> {
        self.entry_for(label).map(|entry| &entry.version)
    }

    /// Exact equality including version spelling, used for change detection
    pub fn is_identical(&self, other: &Self) -> bool {
        self.product == other.product
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| a.is_identical(b))
    }

    /// Check label and version uniqueness and that no entry is label-less.
    pub fn validate(&self) -> Result<(), InvariantError> {
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.labels.is_empty() {
                return Err(InvariantError::UnlabeledEntry {
                    version: entry.version.clone(),
                });
            }
            if self.entries[..i].iter().any(|e| e.version == entry.version) {
                return Err(InvariantError::DuplicateVersion {
                    version: entry.version.clone(),
                });
            }
        }

        for label in Label::ALL {
            let count = self.entries.iter().filter(|e| e.has_label(label)).count();
            if count > 1 {
                return Err(InvariantError::DuplicateLabel { label, count });
            }
        }

        Ok(())
    }
}
