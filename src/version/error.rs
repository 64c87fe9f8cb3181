use thiserror::Error;

use crate::release::types::ProductId;
use crate::version::comparator::Version;
use crate::version::label::Label;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseVersionError {
    #[error("Empty version string")]
    Empty,

    #[error("Version {version:?} has {count} components, at most 4 are allowed")]
    TooManyComponents { version: String, count: usize },

    #[error("Version {version:?} has non-numeric component {component:?}")]
    InvalidComponent { version: String, component: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseLabelError {
    #[error("Unknown label {0:?}")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Unknown publication type {publication_type:?} for {product} {version}")]
    UnknownPublicationType {
        product: String,
        version: String,
        publication_type: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("No Latest candidate for {product}")]
    NoLatestCandidate { product: ProductId },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("{product} {label} version {version} is below the minimum version {minimum}")]
    MinVersionViolation {
        product: ProductId,
        label: Label,
        version: Version,
        minimum: Version,
    },

    #[error("{product} {label} regressed from {baseline} to {candidate} and cannot be reverted")]
    UnrecoverableRegression {
        product: ProductId,
        label: Label,
        baseline: Version,
        candidate: Version,
    },
}

impl ReconcileError {
    pub fn product(&self) -> &ProductId {
        match self {
            ReconcileError::MinVersionViolation { product, .. }
            | ReconcileError::UnrecoverableRegression { product, .. } => product,
        }
    }

    pub fn label(&self) -> Label {
        match self {
            ReconcileError::MinVersionViolation { label, .. }
            | ReconcileError::UnrecoverableRegression { label, .. } => *label,
        }
    }
}

/// A version set or record breaking label or version uniqueness
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("version {version} has no labels")]
    UnlabeledEntry { version: Version },

    #[error("version {version} appears more than once")]
    DuplicateVersion { version: Version },

    #[error("label {label} is carried by {count} versions")]
    DuplicateLabel { label: Label, count: usize },

    #[error("product appears more than once")]
    DuplicateProduct,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid version record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported schema version {found}, this build supports up to {supported}")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("Corrupt version record for {product}: {reason}")]
    Corrupt {
        product: ProductId,
        #[source]
        reason: InvariantError,
    },
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
