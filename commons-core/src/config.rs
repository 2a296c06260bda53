//! Configuration parsing and management.

use commons_filter::TieBreak;
use commons_incremental::SearchPolicy;
use commons_types::{AllowedStatuses, AvailabilityStatus};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("availability.allowed_statuses must name at least one status")]
    EmptyAllowList,
}

/// Main configuration struct matching the commons-search.yml schema
///
/// Every section is optional; an empty file yields the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Catalog used when the command line does not name one
    #[serde(default)]
    pub catalog: Option<PathBuf>,

    #[serde(default)]
    pub availability: AvailabilityConfig,

    #[serde(default)]
    pub ranking: RankingConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    #[serde(default = "default_allowed_statuses")]
    pub allowed_statuses: AllowedStatuses,
}

fn default_allowed_statuses() -> AllowedStatuses {
    AllowedStatuses::new([AvailabilityStatus::Available])
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            allowed_statuses: default_allowed_statuses(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl SearchConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&contents)?;

        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        // serde_yaml rejects an empty document
        let config: SearchConfig = if contents.trim().is_empty() {
            SearchConfig::default()
        } else {
            serde_yaml::from_str(contents)?
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let allowed = &self.availability.allowed_statuses;
        if allowed.is_empty() {
            return Err(ConfigError::EmptyAllowList);
        }
        if allowed.contains(AvailabilityStatus::Unknown) {
            tracing::warn!("allowed_statuses contains an unrecognized status; it matches every unknown status in the catalog");
        }
        Ok(())
    }

    /// Catalog path, resolved relative to the config file
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog.as_ref().map(|p| self.resolve_path(p))
    }

    pub fn policy(&self) -> SearchPolicy {
        SearchPolicy {
            allowed: self.availability.allowed_statuses.clone(),
            tie_break: self.ranking.tie_break,
        }
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.config_path.as_ref().and_then(|p| p.parent()) {
            Some(parent) => parent.join(path),
            None => path.to_path_buf(),
        }
    }
}
