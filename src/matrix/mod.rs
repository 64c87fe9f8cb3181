//! Run orchestration layer
//!
//! Drives one batch run across all configured products and produces the
//! release matrix for downstream image generation.
//!
//! # Modules
//!
//! - [`refresh`]: Fetch candidates, reconcile against the stored record, persist
//! - [`output`]: Flatten the version record into the release matrix

pub mod output;
pub mod refresh;

pub use output::{MatrixImage, ReleaseMatrix, build_matrix};
pub use refresh::{
    Candidate, ProductOutcome, ProductStatus, RunReport, fetch_candidates, reconcile_all,
    run_update,
};
