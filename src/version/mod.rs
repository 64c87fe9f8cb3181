//! Version reconciliation layer
//!
//! This module turns raw vendor release records into labeled version sets
//! and guards the persisted record against channels moving backwards.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ RawRelease  │────▶│    Label    │────▶│ Aggregator  │──▶ candidate
//! │  (fetched)  │     │  (resolve)  │     │(per product)│        │
//! └─────────────┘     └─────────────┘     └─────────────┘        ▼
//! ┌─────────────┐                                         ┌─────────────┐
//! │    Store    │──────────────── baseline ──────────────▶│ForwardGuard │
//! │   (JSON)    │◀─────────────── accepted ───────────────│ (reconcile) │
//! └─────────────┘                                         └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`comparator`]: Dotted numeric version parsing and ordering
//! - [`label`]: Channel labels and label resolution
//! - [`aggregator`]: Per-product folding into a label-unique version set
//! - [`guard`]: Forward guard and minimum-version rules
//! - [`store`]: Persisted version record
//! - [`types`]: `VersionEntry` and `ProductVersionSet`
//! - [`error`]: Error types for every stage

pub mod aggregator;
pub mod comparator;
pub mod error;
pub mod guard;
pub mod label;
pub mod store;
pub mod types;

pub use aggregator::aggregate;
pub use comparator::{Version, compare, compare_versions};
pub use guard::{ForwardGuard, LabelMatch, MinVersionRule, Outcome, ProductMatch, Reconciliation};
pub use label::{Label, resolve_labels};
pub use store::{JsonStore, VersionRecord, VersionStore};
pub use types::{ProductVersionSet, VersionEntry};
