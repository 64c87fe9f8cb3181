//! Channel labels and their resolution from raw release records

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::release::types::{PublicationType, RawRelease};
use crate::version::error::{ParseLabelError, ResolveError};

/// A named release channel
///
/// Labels carry no ordering semantics; `Ord` is derived so label sets have a
/// stable iteration order in logs and persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    Stable,
    Latest,
    Beta,
    #[serde(rename = "RC")]
    Rc,
}

impl Label {
    /// The fixed label set, in reconciliation order
    pub const ALL: [Label; 4] = [Label::Stable, Label::Latest, Label::Beta, Label::Rc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Stable => "Stable",
            Label::Latest => "Latest",
            Label::Beta => "Beta",
            Label::Rc => "RC",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseLabelError::Unknown(s.to_string()))
    }
}

/// Whether a release has entered its public rollout window
pub fn is_published(release: &RawRelease) -> bool {
    let released = release.release_date.is_some_and(|date| date > 0);
    let delivering = release.release_delivery_days.is_some_and(|days| days >= 0);
    released && delivering
}

/// Map one raw release record to its channel labels.
///
/// - `rc` -> {RC}
/// - `beta` -> {Beta}
/// - `release` -> {Stable, Latest} when published, otherwise {Latest}
pub fn resolve_labels(release: &RawRelease) -> Result<BTreeSet<Label>, ResolveError> {
    let publication_type = release
        .publication_type
        .parse::<PublicationType>()
        .map_err(|_| ResolveError::UnknownPublicationType {
            product: release.product.clone(),
            version: release.version.clone(),
            publication_type: release.publication_type.clone(),
        })?;

    let labels = match publication_type {
        PublicationType::Rc => BTreeSet::from([Label::Rc]),
        PublicationType::Beta => BTreeSet::from([Label::Beta]),
        PublicationType::Release if is_published(release) => {
            BTreeSet::from([Label::Stable, Label::Latest])
        }
        PublicationType::Release => BTreeSet::from([Label::Latest]),
    };

    Ok(labels)
}
