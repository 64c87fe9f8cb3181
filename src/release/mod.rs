//! Release source layer
//! - types.rs: Common types (ProductId, RawRelease, PublicationType)
//! - fetcher.rs: Fetcher trait definition
//! - http.rs: reqwest-backed fetcher for vendor release documents
//! - releases_json.rs: releases.json parser

pub mod fetcher;
pub mod http;
pub mod releases_json;
pub mod types;

pub use fetcher::{FetchError, Fetcher};
pub use http::HttpFetcher;
pub use releases_json::{ParseReleasesError, parse_releases};
pub use types::{ProductId, PublicationType, RawRelease};
