//! Check catalog integrity.

use super::{load_config, resolve_catalog};
use anyhow::Result;
use commons_core::CatalogSummary;
use std::path::Path;

/// Load the catalog (which validates it) and print a summary
pub fn validate_catalog(config_path: &Path, catalog: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let catalog = resolve_catalog(&config, catalog)?;
    let summary = CatalogSummary::of(&catalog);

    if json {
        let payload = serde_json::to_string_pretty(&summary)?;
        println!("{payload}");
    } else {
        println!(
            "Catalog OK: {} commons, {} locations, {} categories, {} availability entries",
            summary.commons, summary.locations, summary.categories, summary.availabilities
        );
        println!("fingerprint: {}", summary.fingerprint);
    }

    Ok(())
}
