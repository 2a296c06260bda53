//! Catalog model: commons, locations and their availability records.

use crate::{CategoryId, CommonId, Coordinate, LocationId};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Booking state of a common on one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
    Booked,
    PartiallyBooked,
    Locked,
    LocationHoliday,
    NoTimeframe,
    #[serde(other)]
    Unknown,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Booked => "booked",
            Self::PartiallyBooked => "partially-booked",
            Self::Locked => "locked",
            Self::LocationHoliday => "location-holiday",
            Self::NoTimeframe => "no-timeframe",
            Self::Unknown => "unknown",
        }
    }
}

/// One availability record: the status of a common on a calendar day
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Availability {
    #[serde(deserialize_with = "deserialize_calendar_day")]
    pub date: NaiveDate,
    pub status: AvailabilityStatus,
}

impl Availability {
    pub fn new(date: NaiveDate, status: AvailabilityStatus) -> Self {
        Self { date, status }
    }
}

/// Reduce a supplier date to its calendar day
///
/// Accepts plain dates (`2024-03-01`) and timestamps with or without an
/// offset. A timestamp keeps the day as written in its own offset.
fn parse_calendar_day(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

fn deserialize_calendar_day<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_day(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid availability date `{raw}`")))
}

/// A shared bookable resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Common {
    pub id: CommonId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub location_id: LocationId,

    #[serde(default)]
    pub category_ids: Vec<CategoryId>,

    /// One entry per calendar day, ordered by date
    #[serde(default)]
    pub availabilities: Vec<Availability>,
}

impl Common {
    pub fn new(id: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            id: CommonId::new(id),
            name: None,
            location_id: LocationId::new(location_id),
            category_ids: Vec::new(),
            availabilities: Vec::new(),
        }
    }

    pub fn with_categories(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.category_ids = ids.into_iter().map(CategoryId).collect();
        self
    }

    pub fn with_availability(mut self, date: NaiveDate, status: AvailabilityStatus) -> Self {
        self.availabilities.push(Availability::new(date, status));
        self
    }

    /// Availability record for a given day, if any
    pub fn availability_on(&self, date: NaiveDate) -> Option<&Availability> {
        self.availabilities.iter().find(|a| a.date == date)
    }
}

/// A physical place with a coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub coordinates: Coordinate,
}

impl Location {
    pub fn new(id: impl Into<String>, coordinates: Coordinate) -> Self {
        Self {
            id: LocationId::new(id),
            name: None,
            coordinates,
        }
    }
}

/// Point-in-time snapshot of everything the data supplier knows about
///
/// A catalog is always replaced as a whole, never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub commons: Vec<Common>,

    #[serde(default)]
    pub locations: Vec<Location>,
}

impl Catalog {
    pub fn new(commons: Vec<Common>, locations: Vec<Location>) -> Self {
        Self { commons, locations }
    }

    pub fn is_empty(&self) -> bool {
        self.commons.is_empty() && self.locations.is_empty()
    }
}

/// Statuses that count as a positive availability match
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowedStatuses(BTreeSet<AvailabilityStatus>);

impl AllowedStatuses {
    pub fn new(statuses: impl IntoIterator<Item = AvailabilityStatus>) -> Self {
        Self(statuses.into_iter().collect())
    }

    pub fn contains(&self, status: AvailabilityStatus) -> bool {
        self.0.contains(&status)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AvailabilityStatus> + '_ {
        self.0.iter().copied()
    }
}

impl Default for AllowedStatuses {
    fn default() -> Self {
        Self::new([AvailabilityStatus::Available])
    }
}
