//! Persisted version record and its JSON file store

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::release::types::ProductId;
use crate::version::error::{InvariantError, StoreError};
use crate::version::types::ProductVersionSet;

/// Schema tag written to every record
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Accepted version sets of all products, in product order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordFile", into = "RecordFile")]
pub struct VersionRecord {
    schema_version: u32,
    products: IndexMap<ProductId, ProductVersionSet>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordFile {
    schema_version: u32,
    #[serde(default)]
    products: Vec<ProductVersionSet>,
}

impl TryFrom<RecordFile> for VersionRecord {
    type Error = StoreError;

    fn try_from(file: RecordFile) -> Result<Self, Self::Error> {
        let mut products = IndexMap::with_capacity(file.products.len());

        for set in file.products {
            // Re-sort entries that may have been edited by hand
            let set = ProductVersionSet::new(set.product().clone(), set.entries().to_vec());
            let product = set.product().clone();
            if products.insert(product.clone(), set).is_some() {
                return Err(StoreError::Corrupt {
                    product,
                    reason: InvariantError::DuplicateProduct,
                });
            }
        }

        Ok(Self {
            schema_version: file.schema_version,
            products,
        })
    }
}

impl From<VersionRecord> for RecordFile {
    fn from(record: VersionRecord) -> Self {
        Self {
            schema_version: record.schema_version,
            products: record.products.into_values().collect(),
        }
    }
}

impl Default for VersionRecord {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            products: IndexMap::new(),
        }
    }
}

impl VersionRecord {
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    pub fn get(&self, product: &ProductId) -> Option<&ProductVersionSet> {
        self.products.get(product)
    }

    /// Insert or replace a product's set, keeping its position if present
    pub fn insert(&mut self, set: ProductVersionSet) {
        self.products.insert(set.product().clone(), set);
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductVersionSet> {
        self.products.values()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Check the schema tag and every product's invariants.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                found: self.schema_version,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for set in self.products.values() {
            set.validate().map_err(|reason| StoreError::Corrupt {
                product: set.product().clone(),
                reason,
            })?;
        }

        Ok(())
    }

    /// Same record with the current schema tag
    pub fn with_current_schema(mut self) -> Self {
        self.schema_version = CURRENT_SCHEMA_VERSION;
        self
    }
}

/// Trait for loading and persisting the version record
pub trait VersionStore: Send + Sync {
    /// Load the record, `None` when nothing has been persisted yet
    fn load(&self) -> Result<Option<VersionRecord>, StoreError>;

    /// Replace the persisted record
    fn save(&self, record: &VersionRecord) -> Result<(), StoreError>;
}

/// Stores the record as pretty-printed JSON
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl VersionStore for JsonStore {
    fn load(&self) -> Result<Option<VersionRecord>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No version record at {:?}, starting empty", self.path);
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let file: RecordFile = serde_json::from_str(&content)?;
        let record = VersionRecord::try_from(file)?;
        record.validate()?;

        debug!(
            "Loaded {} products from {:?} (schema v{})",
            record.len(),
            self.path,
            record.schema_version()
        );

        Ok(Some(record))
    }

    fn save(&self, record: &VersionRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut content = serde_json::to_string_pretty(record)?;
        content.push('\n');

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))?;

        info!("Saved {} products to {:?}", record.len(), self.path);
        Ok(())
    }
}
