#![allow(dead_code)]

mod fetcher;
mod version_set;

// Each test binary uses a different subset
#[allow(unused_imports)]
pub use fetcher::{Release, StubFetcher, release, releases_document};
#[allow(unused_imports)]
pub use version_set::{labels_of, version_set};
