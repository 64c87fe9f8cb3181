//! Update run: fetch, aggregate, reconcile and persist every product

use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{FETCH_STAGGER_DELAY_MS, MatrixConfig, ProductConfig};
use crate::release::fetcher::Fetcher;
use crate::release::releases_json::parse_releases;
use crate::release::types::ProductId;
use crate::version::aggregator::aggregate;
use crate::version::error::{ReconcileError, RunError};
use crate::version::guard::{ForwardGuard, Outcome};
use crate::version::store::{CURRENT_SCHEMA_VERSION, VersionRecord, VersionStore};
use crate::version::types::ProductVersionSet;

/// Freshly aggregated data for one product; `set` is `None` when the
/// product could not be fetched, parsed or aggregated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub product: ProductId,
    pub set: Option<ProductVersionSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Reconciled(Outcome),
    /// No candidate, baseline kept as is
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductOutcome {
    pub product: ProductId,
    pub status: ProductStatus,
}

/// Result of reconciling a whole run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Record to persist
    pub record: VersionRecord,
    pub outcomes: Vec<ProductOutcome>,
    /// True when any product's accepted set differs from its baseline
    pub changed: bool,
}

/// Fetch, parse and aggregate one product
///
/// Errors are logged and turn into an absent candidate.
async fn fetch_candidate(fetcher: &dyn Fetcher, product: &ProductConfig) -> Candidate {
    let name = &product.product;

    let set = match fetcher.fetch_releases(product).await {
        Ok(content) => match parse_releases(&content, &product.release_product) {
            Ok(releases) => {
                info!("Fetched {} release records for {}", releases.len(), name);
                aggregate(name, &releases)
                    .inspect_err(|e| error!("Failed to aggregate {}: {}", name, e))
                    .ok()
            }
            Err(e) => {
                error!("Failed to parse releases for {}: {}", name, e);
                None
            }
        },
        Err(e) => {
            error!("Failed to fetch releases for {}: {}", name, e);
            None
        }
    };

    Candidate {
        product: name.clone(),
        set,
    }
}

/// Fetch candidates for all products
///
/// Fetches run concurrently with staggered start times to avoid rate
/// limiting. Results keep the order of `products`.
pub async fn fetch_candidates(fetcher: &dyn Fetcher, products: &[ProductConfig]) -> Vec<Candidate> {
    let futures = products.iter().enumerate().map(|(i, product)| {
        let delay = Duration::from_millis(FETCH_STAGGER_DELAY_MS * i as u64);
        async move {
            sleep(delay).await;
            fetch_candidate(fetcher, product).await
        }
    });

    join_all(futures).await
}

/// Reconcile every candidate against the baseline record.
///
/// Products are processed one at a time in candidate order. Products without
/// a candidate keep their baseline. A run-level error aborts the whole run so
/// no partially reconciled record is ever persisted.
pub fn reconcile_all(
    baseline: &VersionRecord,
    candidates: Vec<Candidate>,
    guard: &ForwardGuard,
) -> Result<RunReport, ReconcileError> {
    let mut record = baseline.clone().with_current_schema();
    let mut outcomes = Vec::with_capacity(candidates.len());
    let mut changed = false;

    for Candidate { product, set } in candidates {
        let Some(candidate) = set else {
            warn!("No candidate for {}, keeping baseline", product);
            outcomes.push(ProductOutcome {
                product,
                status: ProductStatus::Skipped,
            });
            continue;
        };

        let base = baseline
            .get(&product)
            .cloned()
            .unwrap_or_else(|| ProductVersionSet::empty(product.clone()));

        let result = guard.reconcile(&base, &candidate)?;

        info!("{}: {}", product, result.outcome);
        changed |= result.changed;
        record.insert(result.accepted);
        outcomes.push(ProductOutcome {
            product,
            status: ProductStatus::Reconciled(result.outcome),
        });
    }

    Ok(RunReport {
        record,
        outcomes,
        changed,
    })
}

/// Run a full update against `store`.
///
/// The record is saved when something changed or the stored schema tag is
/// older than the current one, unless `dry_run` is set.
pub async fn run_update<S: VersionStore + ?Sized>(
    store: &S,
    fetcher: &dyn Fetcher,
    config: &MatrixConfig,
    dry_run: bool,
) -> Result<RunReport, RunError> {
    let baseline = store.load()?.unwrap_or_default();
    let candidates = fetch_candidates(fetcher, &config.products).await;

    let guard = ForwardGuard::new(config.minimum_versions.clone());
    let report = reconcile_all(&baseline, candidates, &guard)?;

    let schema_upgraded = baseline.schema_version() != CURRENT_SCHEMA_VERSION;

    if dry_run {
        info!("Dry run, not saving (changed: {})", report.changed);
    } else if report.changed || schema_upgraded {
        store.save(&report.record)?;
    } else {
        info!("No version changes");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::fetcher::{FetchError, MockFetcher};
    use crate::version::comparator::Version;
    use crate::version::error::ReconcileError;
    use crate::version::label::Label;
    use crate::version::types::VersionEntry;

    fn set(product: &str, entries: &[(&str, &[Label])]) -> ProductVersionSet {
        ProductVersionSet::new(
            ProductId::new(product),
            entries
                .iter()
                .map(|(v, labels)| {
                    VersionEntry::new(Version::parse(v).unwrap(), labels.iter().copied())
                })
                .collect(),
        )
    }

    fn candidate(product: &str, set: Option<ProductVersionSet>) -> Candidate {
        Candidate {
            product: ProductId::new(product),
            set,
        }
    }

    #[tokio::test]
    async fn fetch_candidates_aggregates_each_product() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch_releases().returning(|product| {
            if product.cloud == "default" {
                Ok(r#"{"releases": [
                    {"product": "vms", "version": "5.1.2.37996", "publication_type": "release",
                     "release_date": 1, "release_delivery_days": 0},
                    {"product": "vms", "version": "6.0.0.37710", "publication_type": "beta"}
                ]}"#
                .to_string())
            } else {
                Err(FetchError::NotFound(product.cloud.clone()))
            }
        });

        let products = vec![
            ProductConfig::new("NxWitness", "default"),
            ProductConfig::new("NxMeta", "metavms"),
        ];

        let candidates = fetch_candidates(&fetcher, &products).await;

        assert_eq!(
            candidates,
            vec![
                candidate(
                    "NxWitness",
                    Some(set(
                        "NxWitness",
                        &[
                            ("5.1.2.37996", &[Label::Stable, Label::Latest]),
                            ("6.0.0.37710", &[Label::Beta]),
                        ]
                    ))
                ),
                candidate("NxMeta", None),
            ]
        );
    }

    #[tokio::test]
    async fn fetch_candidates_drops_product_without_latest() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch_releases().returning(|_| {
            Ok(r#"{"releases": [{"product": "vms", "version": "6.0", "publication_type": "rc"}]}"#
                .to_string())
        });

        let products = vec![ProductConfig::new("NxGo", "nxgo")];
        let candidates = fetch_candidates(&fetcher, &products).await;

        assert_eq!(candidates, vec![candidate("NxGo", None)]);
    }

    #[test]
    fn reconcile_all_keeps_baseline_for_skipped_products() {
        let mut baseline = VersionRecord::default();
        baseline.insert(set("NxGo", &[("1.0", &[Label::Stable, Label::Latest])]));
        baseline.insert(set("NxMeta", &[("5.0", &[Label::Stable, Label::Latest])]));

        let candidates = vec![
            candidate("NxGo", None),
            candidate("NxMeta", Some(set("NxMeta", &[("5.1", &[Label::Stable, Label::Latest])]))),
            candidate("NxWitness", Some(set("NxWitness", &[("6.0", &[Label::Stable, Label::Latest])]))),
        ];

        let report = reconcile_all(&baseline, candidates, &ForwardGuard::default()).unwrap();

        assert!(report.changed);
        assert_eq!(
            report.outcomes.iter().map(|o| o.status).collect::<Vec<_>>(),
            vec![
                ProductStatus::Skipped,
                ProductStatus::Reconciled(Outcome::Advanced),
                ProductStatus::Reconciled(Outcome::Advanced),
            ]
        );
        let order: Vec<&str> = report.record.products().map(|s| s.product().as_str()).collect();
        assert_eq!(order, vec!["NxGo", "NxMeta", "NxWitness"]);
        assert_eq!(
            report
                .record
                .get(&ProductId::new("NxGo"))
                .and_then(|s| s.version_for(Label::Latest))
                .map(|v| v.as_str()),
            Some("1.0")
        );
    }

    #[test]
    fn reconcile_all_is_unchanged_when_everything_reverts() {
        let mut baseline = VersionRecord::default();
        baseline.insert(set("NxGo", &[("2.0", &[Label::Stable, Label::Latest])]));

        let candidates = vec![candidate(
            "NxGo",
            Some(set("NxGo", &[("1.0", &[Label::Stable, Label::Latest])])),
        )];

        let report = reconcile_all(&baseline, candidates, &ForwardGuard::default()).unwrap();

        assert!(!report.changed);
        assert_eq!(report.record, baseline);
    }

    #[test]
    fn reconcile_all_aborts_on_minimum_version_violation() {
        let guard: ForwardGuard = ForwardGuard::new(vec![
            serde_json::from_value(serde_json::json!({
                "product": "NxMeta", "label": "Latest", "minimumVersion": "5.0"
            }))
            .unwrap(),
        ]);

        let candidates = vec![
            candidate("NxGo", Some(set("NxGo", &[("1.0", &[Label::Stable, Label::Latest])]))),
            candidate("NxMeta", Some(set("NxMeta", &[("4.0", &[Label::Stable, Label::Latest])]))),
        ];

        let result = reconcile_all(&VersionRecord::default(), candidates, &guard);

        assert!(matches!(
            result,
            Err(ReconcileError::MinVersionViolation { .. })
        ));
    }
}
