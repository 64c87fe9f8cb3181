//! Folds raw release records of one product into a labeled version set

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::release::types::{ProductId, RawRelease};
use crate::version::comparator::Version;
use crate::version::error::AggregateError;
use crate::version::label::{Label, resolve_labels};
use crate::version::types::{ProductVersionSet, VersionEntry};

/// Aggregate the release records of one product.
///
/// Records with a malformed version or an unknown publication type are
/// excluded and logged. Each label ends up on exactly one entry, the highest
/// version carrying it; entries left without labels are dropped. When no
/// published release exists, `Stable` falls back to the `Latest` entry.
pub fn aggregate(
    product: &ProductId,
    releases: &[RawRelease],
) -> Result<ProductVersionSet, AggregateError> {
    let mut grouped: BTreeMap<Version, BTreeSet<Label>> = BTreeMap::new();

    for release in releases {
        let version = match Version::parse(&release.version) {
            Ok(version) => version,
            Err(e) => {
                warn!(
                    product = %product,
                    version = %release.version,
                    "Excluding release with malformed version: {}", e
                );
                continue;
            }
        };

        let labels = match resolve_labels(release) {
            Ok(labels) => labels,
            Err(e) => {
                warn!(
                    product = %product,
                    version = %release.version,
                    "Excluding release: {}", e
                );
                continue;
            }
        };

        // First spelling of a version wins as the map key
        grouped.entry(version).or_default().extend(labels);
    }

    for label in Label::ALL {
        let Some(owner) = grouped
            .iter()
            .rev()
            .find(|(_, labels)| labels.contains(&label))
            .map(|(version, _)| version.clone())
        else {
            continue;
        };

        for (version, labels) in grouped.iter_mut() {
            if *version != owner && labels.remove(&label) {
                debug!(
                    product = %product,
                    label = %label,
                    old_version = %version,
                    new_version = %owner,
                    "Label superseded by newer build"
                );
            }
        }
    }

    let mut entries: Vec<VersionEntry> = grouped
        .into_iter()
        .filter(|(_, labels)| !labels.is_empty())
        .map(|(version, labels)| VersionEntry { version, labels })
        .collect();

    let has_stable = entries.iter().any(|entry| entry.has_label(Label::Stable));

    let Some(latest) = entries.iter_mut().find(|entry| entry.has_label(Label::Latest)) else {
        return Err(AggregateError::NoLatestCandidate {
            product: product.clone(),
        });
    };

    if !has_stable {
        warn!(
            product = %product,
            version = %latest.version,
            "No published Stable release, using Latest"
        );
        latest.labels.insert(Label::Stable);
    }

    Ok(ProductVersionSet::new(product.clone(), entries))
}
