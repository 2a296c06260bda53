//! Catalog ingestion and integrity checks.
//!
//! The filtering core tolerates inconsistent data (an unknown location only
//! stops a common from being ranked). Structural problems are reported here,
//! once, when a snapshot is loaded.

use chrono::NaiveDate;
use commons_types::{Catalog, CommonId, LocationId};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("common {common} references unknown location {location}")]
    DanglingLocation {
        common: CommonId,
        location: LocationId,
    },

    #[error("common {common} has more than one availability entry for {date}")]
    DuplicateAvailability { common: CommonId, date: NaiveDate },

    #[error("duplicate common id {0}")]
    DuplicateCommon(CommonId),

    #[error("duplicate location id {0}")]
    DuplicateLocation(LocationId),
}

/// Parse and validate a catalog from JSON
pub fn parse_catalog(json: &str) -> Result<Catalog, CatalogError> {
    let catalog: Catalog = serde_json::from_str(json)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

/// Read, parse and validate a catalog file
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let catalog = parse_catalog(&contents)?;

    tracing::info!(
        path = %path.display(),
        commons = catalog.commons.len(),
        locations = catalog.locations.len(),
        "loaded catalog"
    );
    Ok(catalog)
}

/// Check the invariants the data supplier is responsible for
///
/// Availability entries are expected in date order; out-of-order entries
/// are accepted with a warning since the filters do not depend on order.
pub fn validate_catalog(catalog: &Catalog) -> Result<(), CatalogError> {
    let mut location_ids = BTreeSet::new();
    for location in &catalog.locations {
        if !location_ids.insert(&location.id) {
            return Err(CatalogError::DuplicateLocation(location.id.clone()));
        }
    }

    let mut common_ids = BTreeSet::new();
    for common in &catalog.commons {
        if !common_ids.insert(&common.id) {
            return Err(CatalogError::DuplicateCommon(common.id.clone()));
        }
        if !location_ids.contains(&common.location_id) {
            return Err(CatalogError::DanglingLocation {
                common: common.id.clone(),
                location: common.location_id.clone(),
            });
        }

        let mut dates = BTreeSet::new();
        for availability in &common.availabilities {
            if !dates.insert(availability.date) {
                return Err(CatalogError::DuplicateAvailability {
                    common: common.id.clone(),
                    date: availability.date,
                });
            }
        }

        if !common
            .availabilities
            .windows(2)
            .all(|pair| pair[0].date < pair[1].date)
        {
            tracing::warn!(common = %common.id, "availabilities are not ordered by date");
        }
    }

    Ok(())
}

/// Counts and content fingerprint of a catalog snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub commons: usize,
    pub locations: usize,
    pub categories: usize,
    pub availabilities: usize,
    pub fingerprint: String,
}

impl CatalogSummary {
    pub fn of(catalog: &Catalog) -> Self {
        let categories: BTreeSet<_> = catalog
            .commons
            .iter()
            .flat_map(|c| c.category_ids.iter().copied())
            .collect();

        Self {
            commons: catalog.commons.len(),
            locations: catalog.locations.len(),
            categories: categories.len(),
            availabilities: catalog.commons.iter().map(|c| c.availabilities.len()).sum(),
            fingerprint: fingerprint(catalog),
        }
    }
}

/// blake3 hash over the catalog content, hex encoded
///
/// Two snapshots with the same fingerprint produce the same search results.
pub fn fingerprint(catalog: &Catalog) -> String {
    let mut hasher = blake3::Hasher::new();

    hasher.update(&(catalog.locations.len() as u64).to_le_bytes());
    for location in &catalog.locations {
        update_str(&mut hasher, location.id.as_str());
        hasher.update(&location.coordinates.lat.to_bits().to_le_bytes());
        hasher.update(&location.coordinates.lng.to_bits().to_le_bytes());
    }

    hasher.update(&(catalog.commons.len() as u64).to_le_bytes());
    for common in &catalog.commons {
        update_str(&mut hasher, common.id.as_str());
        update_str(&mut hasher, common.location_id.as_str());

        hasher.update(&(common.category_ids.len() as u64).to_le_bytes());
        for category in &common.category_ids {
            hasher.update(&category.0.to_le_bytes());
        }

        hasher.update(&(common.availabilities.len() as u64).to_le_bytes());
        for availability in &common.availabilities {
            update_str(&mut hasher, &availability.date.to_string());
            update_str(&mut hasher, availability.status.as_str());
        }
    }

    hasher.finalize().to_hex().to_string()
}

/// Length-prefixed so adjacent strings cannot run together
fn update_str(hasher: &mut blake3::Hasher, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use commons_types::{AvailabilityStatus, Common, Coordinate, Location};

    const CATALOG: &str = r#"{
        "commons": [
            {
                "id": "cargo-bike",
                "name": "Cargo bike",
                "locationId": "garage",
                "categoryIds": [1, 4],
                "availabilities": [
                    {"date": "2024-03-01", "status": "available"},
                    {"date": "2024-03-02", "status": "booked"}
                ]
            },
            {"id": "trailer", "locationId": "yard", "categoryIds": [4]}
        ],
        "locations": [
            {"id": "garage", "coordinates": {"lat": 52.52, "lng": 13.40}},
            {"id": "yard", "name": "Back yard", "coordinates": {"lat": 52.50, "lng": 13.45}}
        ]
    }"#;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_parse_catalog() {
        let catalog = parse_catalog(CATALOG).unwrap();

        assert_eq!(catalog.commons.len(), 2);
        assert_eq!(catalog.commons[0].name.as_deref(), Some("Cargo bike"));
        assert_eq!(
            catalog.commons[0].availability_on(day(2)).map(|a| a.status),
            Some(AvailabilityStatus::Booked)
        );
        assert!(catalog.commons[1].availabilities.is_empty());
    }

    #[test]
    fn test_timestamp_dates_reduce_to_calendar_days() {
        let json = r#"{
            "commons": [{
                "id": "c1",
                "locationId": "l1",
                "availabilities": [
                    {"date": "2024-03-01T10:00:00+01:00", "status": "available"},
                    {"date": "2024-03-02T00:00:00Z", "status": "booked"}
                ]
            }],
            "locations": [{"id": "l1", "coordinates": {"lat": 0.0, "lng": 0.0}}]
        }"#;
        let catalog = parse_catalog(json).unwrap();
        let common = &catalog.commons[0];

        assert_eq!(
            common.availability_on(day(1)).map(|a| a.status),
            Some(AvailabilityStatus::Available)
        );
        assert_eq!(
            common.availability_on(day(2)).map(|a| a.status),
            Some(AvailabilityStatus::Booked)
        );
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_catalog("{\"commons\": [").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_dangling_location() {
        let catalog = Catalog::new(
            vec![Common::new("c1", "nowhere")],
            vec![Location::new("l1", Coordinate::new(0.0, 0.0))],
        );

        let err = validate_catalog(&catalog).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"common c1 references unknown location nowhere");
    }

    #[test]
    fn test_duplicate_availability_date() {
        let catalog = Catalog::new(
            vec![Common::new("c1", "l1")
                .with_availability(day(1), AvailabilityStatus::Available)
                .with_availability(day(1), AvailabilityStatus::Booked)],
            vec![Location::new("l1", Coordinate::new(0.0, 0.0))],
        );

        let err = validate_catalog(&catalog).unwrap_err();
        insta::assert_snapshot!(err.to_string(), @"common c1 has more than one availability entry for 2024-03-01");
    }

    #[test]
    fn test_duplicate_ids() {
        let location = Location::new("l1", Coordinate::new(0.0, 0.0));

        let commons = Catalog::new(
            vec![Common::new("c1", "l1"), Common::new("c1", "l1")],
            vec![location.clone()],
        );
        assert!(matches!(
            validate_catalog(&commons),
            Err(CatalogError::DuplicateCommon(id)) if id.as_str() == "c1"
        ));

        let locations = Catalog::new(vec![], vec![location.clone(), location]);
        assert!(matches!(
            validate_catalog(&locations),
            Err(CatalogError::DuplicateLocation(_))
        ));
    }

    #[test]
    fn test_load_catalog_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, CATALOG).unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.locations.len(), 2);

        let err = load_catalog(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Read(_)));
    }

    #[test]
    fn test_summary() {
        let catalog = parse_catalog(CATALOG).unwrap();
        let summary = CatalogSummary::of(&catalog);

        assert_eq!(summary.commons, 2);
        assert_eq!(summary.locations, 2);
        assert_eq!(summary.categories, 2);
        assert_eq!(summary.availabilities, 2);
        assert_eq!(summary.fingerprint.len(), 64);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let catalog = parse_catalog(CATALOG).unwrap();
        assert_eq!(fingerprint(&catalog), fingerprint(&catalog.clone()));

        let mut edited = catalog.clone();
        edited.commons[1].category_ids.clear();
        assert_ne!(fingerprint(&catalog), fingerprint(&edited));
    }
}
