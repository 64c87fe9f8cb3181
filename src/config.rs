use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::release::types::ProductId;
use crate::version::guard::MinVersionRule;

// =============================================================================
// Fetch-related constants
// =============================================================================

/// Base URL serving `{cloud}/releases.json`
pub const DEFAULT_RELEASES_BASE_URL: &str = "https://updates.vmsproxy.com";

/// Timeout for a single fetch in seconds
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Delay between starting each fetch request to avoid rate limiting (10ms)
pub const FETCH_STAGGER_DELAY_MS: u64 = 10;

/// Upstream product name of the server builds in a releases document
pub const DEFAULT_RELEASE_PRODUCT: &str = "vms";

pub const VERSION_FILE_NAME: &str = "Version.json";
pub const LOG_FILE_NAME: &str = "release-matrix.log";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MatrixConfig {
    pub releases: ReleasesConfig,
    pub products: Vec<ProductConfig>,
    /// Evaluated in order, first match wins
    pub minimum_versions: Vec<MinVersionRule>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            releases: ReleasesConfig::default(),
            products: default_products(),
            minimum_versions: Vec::new(),
        }
    }
}

impl MatrixConfig {
    /// Load from a JSON file, or use defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Release source configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReleasesConfig {
    pub base_url: String,
}

impl Default for ReleasesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RELEASES_BASE_URL.to_string(),
        }
    }
}

/// One product of the family
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductConfig {
    pub product: ProductId,
    /// Cloud host name used in the releases URL
    pub cloud: String,
    /// Product name of the records to keep from the releases document
    #[serde(default = "default_release_product")]
    pub release_product: String,
}

impl ProductConfig {
    pub fn new(product: &str, cloud: &str) -> Self {
        Self {
            product: ProductId::new(product),
            cloud: cloud.to_string(),
            release_product: default_release_product(),
        }
    }
}

fn default_release_product() -> String {
    DEFAULT_RELEASE_PRODUCT.to_string()
}

fn default_products() -> Vec<ProductConfig> {
    vec![
        ProductConfig::new("NxGo", "nxgo"),
        ProductConfig::new("NxMeta", "metavms"),
        ProductConfig::new("NxWitness", "default"),
        ProductConfig::new("DWSpectrum", "digitalwatchdog"),
        ProductConfig::new("WisenetWAVE", "hanwha"),
    ]
}

/// Returns the path to the data directory for release-matrix.
/// Uses $XDG_DATA_HOME/release-matrix if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/release-matrix,
/// or ./release-matrix if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path to the version record.
pub fn version_path() -> PathBuf {
    data_dir().join(VERSION_FILE_NAME)
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("release-matrix")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::comparator::Version;
    use crate::version::guard::{LabelMatch, ProductMatch};
    use crate::version::label::Label;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn matrix_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<MatrixConfig>(json!({
            "releases": {
                "baseUrl": "http://localhost:8080"
            }
        }))
        .unwrap();

        assert_eq!(result.releases.base_url, "http://localhost:8080");
        assert_eq!(result.products, default_products());
        assert!(result.minimum_versions.is_empty());
    }

    #[test]
    fn matrix_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<MatrixConfig>(json!({
            "releases": { "baseUrl": "https://example.com" },
            "products": [
                { "product": "NxWitness", "cloud": "default" },
                { "product": "NxMeta", "cloud": "metavms", "releaseProduct": "meta" }
            ],
            "minimumVersions": [
                { "product": "Any", "label": "Stable", "minimumVersion": "5.0" }
            ]
        }))
        .unwrap();

        assert_eq!(
            result,
            MatrixConfig {
                releases: ReleasesConfig {
                    base_url: "https://example.com".to_string()
                },
                products: vec![
                    ProductConfig::new("NxWitness", "default"),
                    ProductConfig {
                        product: ProductId::new("NxMeta"),
                        cloud: "metavms".to_string(),
                        release_product: "meta".to_string(),
                    },
                ],
                minimum_versions: vec![MinVersionRule {
                    product: ProductMatch::Any,
                    label: LabelMatch::Label(Label::Stable),
                    minimum_version: Version::parse("5.0").unwrap(),
                }],
            }
        );
    }

    #[test]
    fn load_without_path_returns_defaults() {
        assert_eq!(MatrixConfig::load(None).unwrap(), MatrixConfig::default());
    }

    #[test]
    fn load_reports_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            MatrixConfig::load(Some(path.as_path())),
            Err(ConfigError::Json { .. })
        ));
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/release-matrix"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(path, PathBuf::from("/home/user/.local/share/release-matrix"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./release-matrix"));
    }
}
