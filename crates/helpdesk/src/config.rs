//! Help-desk configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then `HELPDESK_*`
//! environment variables. CLI flags are applied last by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use triage::NoMatchPolicy;

/// Documents requested from the retriever per question.
pub const DEFAULT_SEARCH_LIMIT: usize = 7;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Runtime configuration for [`crate::HelpDesk`] and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpDeskConfig {
    /// Category catalog JSON (descriptions, resolution times)
    pub categories_path: Option<PathBuf>,
    /// Knowledge base JSON for the local keyword retriever
    pub knowledge_path: Option<PathBuf>,
    /// Remote retrieval service; takes precedence over `knowledge_path`
    pub retriever_url: Option<String>,
    pub search_limit: usize,
    pub no_match: NoMatchPolicy,
    /// Replaces the built-in category rules
    pub category_rules_path: Option<PathBuf>,
    /// Replaces the built-in escalation rules
    pub escalation_rules_path: Option<PathBuf>,
    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for HelpDeskConfig {
    fn default() -> Self {
        Self {
            categories_path: None,
            knowledge_path: None,
            retriever_url: None,
            search_limit: DEFAULT_SEARCH_LIMIT,
            no_match: NoMatchPolicy::default(),
            category_rules_path: None,
            escalation_rules_path: None,
            log_level: "info".into(),
        }
    }
}

impl HelpDeskConfig {
    /// Defaults, then `path` (if any), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply `HELPDESK_*` overrides read through `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("HELPDESK_CATEGORIES_PATH") {
            self.categories_path = Some(v.into());
        }
        if let Some(v) = lookup("HELPDESK_KNOWLEDGE_PATH") {
            self.knowledge_path = Some(v.into());
        }
        if let Some(v) = lookup("HELPDESK_RETRIEVER_URL") {
            self.retriever_url = Some(v);
        }
        if let Some(v) = lookup("HELPDESK_CATEGORY_RULES") {
            self.category_rules_path = Some(v.into());
        }
        if let Some(v) = lookup("HELPDESK_ESCALATION_RULES") {
            self.escalation_rules_path = Some(v.into());
        }
        if let Some(v) = lookup("HELPDESK_LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = lookup("HELPDESK_SEARCH_LIMIT") {
            self.search_limit = parse_search_limit("HELPDESK_SEARCH_LIMIT", &v)?;
        }
        if let Some(v) = lookup("HELPDESK_NO_MATCH") {
            self.no_match = v.parse().map_err(|reason| ConfigError::InvalidValue {
                key: "HELPDESK_NO_MATCH".into(),
                value: v.clone(),
                reason,
            })?;
        }
        Ok(self)
    }
}

fn parse_search_limit(key: &str, value: &str) -> Result<usize, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
        reason: reason.into(),
    };
    match value.trim().parse::<usize>() {
        Ok(0) => Err(invalid("must be at least 1")),
        Ok(n) => Ok(n),
        Err(_) => Err(invalid("not a positive integer")),
    }
}
