//! Dotted numeric version parsing and ordering
//!
//! Vendor builds are versioned as `major.minor.patch.revision`, sometimes
//! followed by a build qualifier (`"5.1.0.35151 R1"`). The qualifier carries
//! no ordering information and is stripped before parsing.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::version::error::ParseVersionError;

/// Maximum number of dotted components (`major.minor.patch.revision`)
pub const MAX_COMPONENTS: usize = 4;

static BUILD_QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+R\d+$").expect("build qualifier pattern is valid"));

/// Strip a trailing build qualifier and surrounding whitespace.
///
/// Examples:
/// - "5.1.0.35151 R1" -> "5.1.0.35151"
/// - "5.1.0.35151 r10" -> "5.1.0.35151"
/// - " 4.2 " -> "4.2"
pub fn clean_version(input: &str) -> String {
    let trimmed = input.trim();
    BUILD_QUALIFIER.replace(trimmed, "").trim().to_string()
}

/// A parsed product version.
///
/// Ordering and equality only look at the numeric components, so `"5.0"`
/// and `"5.0.0.0"` are equal. The cleaned source text is kept for display
/// and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    text: String,
    parts: [u64; MAX_COMPONENTS],
}

impl Version {
    /// Parse a version string, padding missing components with zero.
    pub fn parse(input: &str) -> Result<Self, ParseVersionError> {
        let text = clean_version(input);
        if text.is_empty() {
            return Err(ParseVersionError::Empty);
        }

        let pieces: Vec<&str> = text.split('.').collect();
        if pieces.len() > MAX_COMPONENTS {
            return Err(ParseVersionError::TooManyComponents {
                count: pieces.len(),
                version: text,
            });
        }

        let mut parts = [0u64; MAX_COMPONENTS];
        for (slot, piece) in parts.iter_mut().zip(&pieces) {
            if piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseVersionError::InvalidComponent {
                    component: piece.to_string(),
                    version: text.clone(),
                });
            }
            *slot = piece
                .parse()
                .map_err(|_| ParseVersionError::InvalidComponent {
                    component: piece.to_string(),
                    version: text.clone(),
                })?;
        }

        Ok(Self { text, parts })
    }

    /// Cleaned source text, e.g. "5.1.0.35151"
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Numeric components, zero padded
    pub fn parts(&self) -> [u64; MAX_COMPONENTS] {
        self.parts
    }
}

/// Total order over versions: first unequal component decides.
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.parts.cmp(&b.parts)
}

/// Parse and compare two version strings.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, ParseVersionError> {
    Ok(compare(&Version::parse(a)?, &Version::parse(b)?))
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare(self, other)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ParseVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.text
    }
}
