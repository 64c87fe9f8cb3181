//! Forward guard: keeps published channels from moving backwards across runs
//!
//! Reconciliation compares a freshly aggregated candidate set against the
//! previously accepted baseline, label by label:
//!
//! - label missing on either side: warn and skip
//! - candidate >= baseline: accept
//! - candidate < baseline: revert the whole entry when both sides agree on
//!   its label set, otherwise discard the candidate and keep the baseline
//!
//! `Stable` regressions are logged as warnings, every other label as an
//! error. Minimum-version floors are checked on the candidate beforehand and
//! are always fatal.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::release::types::ProductId;
use crate::version::comparator::{Version, compare};
use crate::version::error::{ParseLabelError, ReconcileError};
use crate::version::label::Label;
use crate::version::types::{ProductVersionSet, VersionEntry};

/// Product selector of a minimum-version rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProductMatch {
    Any,
    Product(ProductId),
}

impl ProductMatch {
    fn matches(&self, product: &ProductId) -> bool {
        match self {
            ProductMatch::Any => true,
            ProductMatch::Product(p) => p == product,
        }
    }
}

impl From<String> for ProductMatch {
    fn from(value: String) -> Self {
        if value == "Any" {
            ProductMatch::Any
        } else {
            ProductMatch::Product(ProductId::new(value))
        }
    }
}

impl From<ProductMatch> for String {
    fn from(value: ProductMatch) -> Self {
        match value {
            ProductMatch::Any => "Any".to_string(),
            ProductMatch::Product(p) => p.as_str().to_string(),
        }
    }
}

/// Label selector of a minimum-version rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LabelMatch {
    Any,
    Label(Label),
}

impl LabelMatch {
    fn matches(&self, label: Label) -> bool {
        match self {
            LabelMatch::Any => true,
            LabelMatch::Label(l) => *l == label,
        }
    }
}

impl TryFrom<String> for LabelMatch {
    type Error = ParseLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "Any" {
            Ok(LabelMatch::Any)
        } else {
            value.parse().map(LabelMatch::Label)
        }
    }
}

impl From<LabelMatch> for String {
    fn from(value: LabelMatch) -> Self {
        match value {
            LabelMatch::Any => "Any".to_string(),
            LabelMatch::Label(l) => l.as_str().to_string(),
        }
    }
}

/// Operator-declared version floor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinVersionRule {
    pub product: ProductMatch,
    pub label: LabelMatch,
    pub minimum_version: Version,
}

/// What reconciliation did to a product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Accepted set equals the baseline
    Unchanged,
    /// Candidate accepted, at least one channel moved
    Advanced,
    /// At least one regressed entry was swapped back to its baseline value
    Reverted,
    /// Candidate discarded wholesale in favour of the baseline
    Discarded,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Unchanged => "unchanged",
            Outcome::Advanced => "advanced",
            Outcome::Reverted => "reverted",
            Outcome::Discarded => "discarded",
        };
        f.write_str(name)
    }
}

/// Result of reconciling one product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub accepted: ProductVersionSet,
    pub changed: bool,
    pub outcome: Outcome,
}

/// Forward guard configured with a minimum-version rule table
///
/// Rules are evaluated in table order, first match wins.
#[derive(Debug, Clone, Default)]
pub struct ForwardGuard {
    rules: Vec<MinVersionRule>,
}

impl ForwardGuard {
    pub fn new(rules: Vec<MinVersionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[MinVersionRule] {
        &self.rules
    }

    /// Check the candidate against the minimum-version table.
    pub fn check_minimum_versions(
        &self,
        candidate: &ProductVersionSet,
    ) -> Result<(), ReconcileError> {
        let product = candidate.product();

        for label in Label::ALL {
            let Some(rule) = self
                .rules
                .iter()
                .find(|rule| rule.product.matches(product) && rule.label.matches(label))
            else {
                continue;
            };

            if rule.label == LabelMatch::Any {
                continue;
            }

            let Some(version) = candidate.version_for(label) else {
                warn!(
                    product = %product,
                    label = %label,
                    minimum = %rule.minimum_version,
                    "No candidate entry to check against minimum version"
                );
                continue;
            };

            if compare(version, &rule.minimum_version) == Ordering::Less {
                error!(
                    product = %product,
                    label = %label,
                    version = %version,
                    minimum = %rule.minimum_version,
                    "Candidate version is below minimum version"
                );
                return Err(ReconcileError::MinVersionViolation {
                    product: product.clone(),
                    label,
                    version: version.clone(),
                    minimum: rule.minimum_version.clone(),
                });
            }
        }

        Ok(())
    }

    /// Reconcile a candidate set against the previously accepted baseline.
    pub fn reconcile(
        &self,
        baseline: &ProductVersionSet,
        candidate: &ProductVersionSet,
    ) -> Result<Reconciliation, ReconcileError> {
        self.check_minimum_versions(candidate)?;

        let product = candidate.product();

        if baseline.is_empty() {
            info!(product = %product, "No baseline, accepting candidate");
            return Ok(Reconciliation {
                accepted: candidate.clone(),
                changed: !candidate.is_empty(),
                outcome: if candidate.is_empty() {
                    Outcome::Unchanged
                } else {
                    Outcome::Advanced
                },
            });
        }

        let mut working: Vec<VersionEntry> = candidate.entries().to_vec();
        let mut swapped: BTreeSet<Label> = BTreeSet::new();

        for label in Label::ALL {
            // Already moved together with a dual-labeled entry
            if swapped.contains(&label) {
                continue;
            }
            let Some(base) = baseline.entry_for(label) else {
                warn!(product = %product, label = %label, "Label missing from baseline, skipping");
                continue;
            };
            let Some(cand) = candidate.entry_for(label) else {
                warn!(product = %product, label = %label, "Label missing from candidate, skipping");
                continue;
            };

            match compare(&cand.version, &base.version) {
                Ordering::Greater => {
                    info!(
                        product = %product,
                        label = %label,
                        old_version = %base.version,
                        new_version = %cand.version,
                        "Channel advanced"
                    );
                    continue;
                }
                Ordering::Equal => continue,
                Ordering::Less => {}
            }

            if label == Label::Stable {
                warn!(
                    product = %product,
                    label = %label,
                    old_version = %base.version,
                    new_version = %cand.version,
                    "Stable version regressed"
                );
            } else {
                error!(
                    product = %product,
                    label = %label,
                    old_version = %base.version,
                    new_version = %cand.version,
                    "Version regressed"
                );
            }

            if cand.labels != base.labels {
                // TODO: unwind only the conflicting version-label pairs once a
                // policy for partial conflicts exists.
                warn!(
                    product = %product,
                    label = %label,
                    old_version = %base.version,
                    new_version = %cand.version,
                    "Label sets disagree, discarding candidate and keeping baseline"
                );
                return Ok(Reconciliation {
                    accepted: baseline.clone(),
                    changed: false,
                    outcome: Outcome::Discarded,
                });
            }

            revert_entry(&mut working, product, label, base, cand)?;
            swapped.extend(base.labels.iter().copied());
        }

        let accepted = ProductVersionSet::new(product.clone(), working);
        let changed = !accepted.is_identical(baseline);
        let outcome = if !swapped.is_empty() {
            Outcome::Reverted
        } else if changed {
            Outcome::Advanced
        } else {
            Outcome::Unchanged
        };

        debug!(product = %product, outcome = %outcome, changed, "Reconciled");

        Ok(Reconciliation {
            accepted,
            changed,
            outcome,
        })
    }
}

/// Swap the regressed entry's labels back onto the baseline entry.
///
/// The baseline labels are taken off whichever working entries hold them,
/// entries left without labels are dropped, and the baseline entry is then
/// inserted, or merged into a working entry with the same version so entries
/// stay unique by version.
///
/// Fails with `UnrecoverableRegression` when `label` is no longer held by any
/// working entry. Each label is swapped at most once, so this cannot happen
/// while the candidate keeps every label on a single entry.
fn revert_entry(
    working: &mut Vec<VersionEntry>,
    product: &ProductId,
    label: Label,
    base: &VersionEntry,
    cand: &VersionEntry,
) -> Result<(), ReconcileError> {
    if !working.iter().any(|entry| entry.has_label(label)) {
        error!(
            product = %product,
            label = %label,
            old_version = %base.version,
            new_version = %cand.version,
            "Regressed entry vanished, cannot revert"
        );
        return Err(ReconcileError::UnrecoverableRegression {
            product: product.clone(),
            label,
            baseline: base.version.clone(),
            candidate: cand.version.clone(),
        });
    }

    warn!(
        product = %product,
        label = %label,
        old_version = %base.version,
        new_version = %cand.version,
        "Reverting to baseline version"
    );

    for entry in working.iter_mut() {
        entry.labels.retain(|l| !base.labels.contains(l));
    }
    working.retain(|entry| !entry.labels.is_empty());

    match working.iter_mut().find(|entry| entry.version == base.version) {
        Some(existing) => existing.labels.extend(base.labels.iter().copied()),
        None => working.push(base.clone()),
    }

    Ok(())
}
