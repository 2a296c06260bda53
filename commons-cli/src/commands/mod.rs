//! CLI command implementations.

pub mod search;
pub mod validate;

pub use search::{search_catalog, SearchOptions};
pub use validate::validate_catalog;

use anyhow::{Context, Result};
use commons_core::{load_catalog, Catalog, SearchConfig};
use std::path::Path;

/// Load the config file if it exists, otherwise fall back to defaults
pub(crate) fn load_config(path: &Path) -> Result<SearchConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(SearchConfig::default());
    }
    SearchConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Catalog from the command line, else the one named in the config
pub(crate) fn resolve_catalog(config: &SearchConfig, explicit: Option<&Path>) -> Result<Catalog> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config
            .catalog_path()
            .context("No catalog given; pass --catalog or set `catalog` in the config")?,
    };
    load_catalog(&path).with_context(|| format!("Failed to load catalog {}", path.display()))
}
