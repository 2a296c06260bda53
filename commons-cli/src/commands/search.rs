//! Search command implementation

use super::{load_config, resolve_catalog};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use commons_core::{Clock, CommonsSearch, FixedClock, SearchResults, SystemClock};
use commons_filter::{distance, LocationIndex, ReferencePoint};
use commons_types::{CategoryId, Common, Coordinate, FilterCriteria, Location, LocationId};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub catalog: Option<PathBuf>,
    pub criteria: Option<PathBuf>,
    pub categories: Vec<u64>,
    pub location: Option<String>,
    pub today: bool,
    pub as_of: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub near: Option<Coordinate>,
    pub center: Option<Coordinate>,
    pub limit: Option<usize>,
    pub json: bool,
    pub metrics: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommonHit<'a> {
    #[serde(flatten)]
    common: &'a Common,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance_meters: Option<f64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchOutput<'a> {
    criteria: &'a FilterCriteria,
    total: usize,
    commons: Vec<CommonHit<'a>>,
    locations: &'a [Location],
}

/// Filter and rank the catalog, printing the results
pub fn search_catalog(config_path: &Path, opts: SearchOptions) -> Result<()> {
    let config = load_config(config_path)?;
    let catalog = resolve_catalog(&config, opts.catalog.as_deref())?;
    let criteria = build_criteria(&opts)?;

    let results = match opts.as_of {
        Some(day) => {
            let search = CommonsSearch::with_clock(&config, FixedClock::new(day));
            run(search, catalog, &criteria, opts.metrics)
        }
        None => {
            let search = CommonsSearch::with_clock(&config, SystemClock);
            run(search, catalog, &criteria, opts.metrics)
        }
    };

    let index = LocationIndex::build(results.locations.iter());
    let reference = ReferencePoint::select(&criteria);
    let shown = opts.limit.unwrap_or(usize::MAX);
    let hits: Vec<CommonHit<'_>> = results
        .commons
        .iter()
        .take(shown)
        .map(|common| CommonHit {
            common,
            distance_meters: reference.and_then(|r| {
                index
                    .get(&common.location_id)
                    .map(|l| distance(r.coordinate(), l.coordinates))
            }),
        })
        .collect();

    if opts.json {
        let payload = SearchOutput {
            criteria: &criteria,
            total: results.commons.len(),
            commons: hits,
            locations: &results.locations,
        };
        let json = serde_json::to_string_pretty(&payload)?;
        println!("{json}");
        return Ok(());
    }

    if results.commons.is_empty() {
        println!("No commons match the current filters");
        return Ok(());
    }

    println!(
        "Found {} commons at {} locations:\n",
        results.commons.len(),
        results.locations.len()
    );
    for hit in &hits {
        print_hit(hit);
    }
    if results.commons.len() > hits.len() {
        println!("\n  ... and {} more", results.commons.len() - hits.len());
    }

    Ok(())
}

fn run<C: Clock>(
    search: CommonsSearch<C>,
    catalog: commons_core::Catalog,
    criteria: &FilterCriteria,
    metrics: bool,
) -> SearchResults {
    search.set_catalog(catalog);
    search.set_criteria(criteria.clone());
    let results = search.results();

    if metrics {
        eprint!("{}", search.metrics());
    }
    results
}

/// Criteria file first, then the individual flags on top
fn build_criteria(opts: &SearchOptions) -> Result<FilterCriteria> {
    let mut criteria = match &opts.criteria {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read criteria {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse criteria JSON")?
        }
        None => FilterCriteria::default(),
    };

    criteria
        .categories
        .extend(opts.categories.iter().copied().map(CategoryId));
    if let Some(location) = &opts.location {
        criteria.location = Some(LocationId::new(location.as_str()));
    }
    if opts.today {
        criteria.available_today = true;
    }
    if opts.from.is_some() || opts.to.is_some() {
        criteria.available_between.start = opts.from.or(criteria.available_between.start);
        criteria.available_between.end = opts.to.or(criteria.available_between.end);
    }
    if opts.near.is_some() {
        criteria.user_location = opts.near;
    }
    if opts.center.is_some() {
        criteria.map_center = opts.center;
    }

    if criteria.available_between.start.is_none() && criteria.available_between.end.is_some() {
        tracing::warn!("a date range without a start date is ignored");
    }

    Ok(criteria)
}

fn print_hit(hit: &CommonHit<'_>) {
    let name = hit
        .common
        .name
        .as_deref()
        .map(|n| format!(" {n}"))
        .unwrap_or_default();
    let distance = hit
        .distance_meters
        .map(|m| format!("  {:.1} km", m / 1000.0))
        .unwrap_or_default();

    println!("[{}]{} @ {}{}", hit.common.id, name, hit.common.location_id, distance);
}
