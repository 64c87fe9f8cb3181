//! Common types for release records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a product in the family (e.g. "NxWitness", "DWSpectrum")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Publication type of a vendor release record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationType {
    Release,
    Rc,
    Beta,
}

impl PublicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationType::Release => "release",
            PublicationType::Rc => "rc",
            PublicationType::Beta => "beta",
        }
    }
}

impl FromStr for PublicationType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "release" => Ok(PublicationType::Release),
            "rc" => Ok(PublicationType::Rc),
            "beta" => Ok(PublicationType::Beta),
            _ => Err(()),
        }
    }
}

/// One release record as published by the vendor
///
/// `publication_type` is kept as text so an unrecognized value reaches label
/// resolution and is reported there instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawRelease {
    /// Upstream product name (e.g. "vms")
    pub product: String,
    /// Version string, possibly with a build qualifier ("5.1.0.35151 R1")
    pub version: String,
    pub publication_type: String,
    /// Release timestamp; zero or absent means not yet released
    #[serde(default)]
    pub release_date: Option<i64>,
    /// Rollout window in days; negative or absent means not delivering
    #[serde(default)]
    pub release_delivery_days: Option<i64>,
}
