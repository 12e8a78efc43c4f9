//! Category catalog
//!
//! Human-readable details per category (description, typical resolution
//! time, ...). Informational only; never used for scoring.
//!
//! ```json
//! { "categories": { "password_reset": { "description": "...", "typical_resolution_time": "15 minutes" } } }
//! ```

use crate::category::Category;
use crate::error::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Details for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typical_resolution_time: Option<String>,
    /// Any other keys, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryCatalog {
    #[serde(default)]
    categories: BTreeMap<String, CategoryInfo>,
}

impl CategoryCatalog {
    pub fn from_json(json: &str) -> TriageResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> TriageResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| TriageError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Load, falling back to an empty catalog on any failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(e) if e.is_not_found() => {
                warn!(path = %path.display(), "category catalog not found, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "category catalog unreadable, using defaults");
                Self::default()
            }
        }
    }

    pub fn info(&self, category: Category) -> Option<&CategoryInfo> {
        self.categories.get(category.as_str())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
