//! # commons-search CLI
//!
//! Command-line interface for filtering and ranking a commons catalog.

mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use commons_types::Coordinate;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "commons-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (optional; defaults apply when missing)
    #[arg(long, default_value = "commons-search.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Filter the catalog and rank the matches
    Search {
        /// Catalog JSON file (defaults to `catalog` from the config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Filter criteria JSON file; flags below are applied on top
        #[arg(long)]
        criteria: Option<PathBuf>,

        /// Required category id (repeatable; all must match)
        #[arg(long = "category", value_name = "ID")]
        categories: Vec<u64>,

        /// Required location id
        #[arg(long)]
        location: Option<String>,

        /// Only commons available today
        #[arg(long)]
        today: bool,

        /// Evaluate "today" as this date instead of the system date
        #[arg(long, value_name = "DATE")]
        as_of: Option<NaiveDate>,

        /// First day of the availability range
        #[arg(long, value_name = "DATE")]
        from: Option<NaiveDate>,

        /// Last day of the availability range
        #[arg(long, value_name = "DATE")]
        to: Option<NaiveDate>,

        /// Rank by distance from this position
        #[arg(long, value_name = "LAT,LNG", value_parser = parse_coordinate)]
        near: Option<Coordinate>,

        /// Rank by distance from this map center (used when --near is absent)
        #[arg(long, value_name = "LAT,LNG", value_parser = parse_coordinate)]
        center: Option<Coordinate>,

        /// Maximum commons to print
        #[arg(long)]
        limit: Option<usize>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Print query metrics to stderr
        #[arg(long)]
        metrics: bool,
    },

    /// Check catalog integrity and print a summary
    Validate {
        /// Catalog JSON file (defaults to `catalog` from the config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn parse_coordinate(raw: &str) -> Result<Coordinate, String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LNG, got '{raw}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
    let lng: f64 = lng
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude '{lng}': {e}"))?;

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(format!("coordinate out of range: {lat},{lng}"));
    }
    Ok(Coordinate::new(lat, lng))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for results
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Search {
            catalog,
            criteria,
            categories,
            location,
            today,
            as_of,
            from,
            to,
            near,
            center,
            limit,
            json,
            metrics,
        } => {
            let opts = commands::SearchOptions {
                catalog,
                criteria,
                categories,
                location,
                today,
                as_of,
                from,
                to,
                near,
                center,
                limit,
                json,
                metrics,
            };
            commands::search_catalog(&cli.config, opts)
        }
        Commands::Validate { catalog, json } => {
            commands::validate_catalog(&cli.config, catalog.as_deref(), json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(
            parse_coordinate("52.52, 13.405"),
            Ok(Coordinate::new(52.52, 13.405))
        );
        assert!(parse_coordinate("52.52").is_err());
        assert!(parse_coordinate("north,13").is_err());
        assert!(parse_coordinate("91,0").is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
