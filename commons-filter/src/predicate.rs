//! Predicate library
//!
//! Every predicate is an independent, pure test over a single entity. The
//! common predicates are plain data ([`CommonFilter`]) so an active filter
//! set can be hashed, compared and memoized like any other value.
//!
//! Constructors that would install "no constraint" return `None` instead of
//! a predicate that always passes; [`crate::compose::apply`] skips `None`.

use crate::day::{is_day_in_range, CalendarDay};
use chrono::NaiveDate;
use commons_types::{AllowedStatuses, CategoryId, Common, FilterCriteria, Location, LocationId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A pure boolean test over one entity
pub trait Predicate<T: ?Sized> {
    fn test(&self, item: &T) -> bool;
}

impl<T: ?Sized, F> Predicate<T> for F
where
    F: Fn(&T) -> bool,
{
    fn test(&self, item: &T) -> bool {
        self(item)
    }
}

/// One filter dimension over commons
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommonFilter {
    /// Every listed category must be present on the common
    Categories(BTreeSet<CategoryId>),
    /// The common must sit at this location
    Location(LocationId),
    /// The common has an allowed status on this day
    AvailableOn {
        day: NaiveDate,
        allowed: AllowedStatuses,
    },
    /// No recorded day within `[start, end]` has a disallowed status
    AvailableThroughout {
        start: NaiveDate,
        end: NaiveDate,
        allowed: AllowedStatuses,
    },
}

impl CommonFilter {
    /// Evaluate this filter against a common
    pub fn evaluate(&self, common: &Common) -> bool {
        match self {
            CommonFilter::Categories(required) => required
                .iter()
                .all(|id| common.category_ids.contains(id)),
            CommonFilter::Location(target) => common.location_id == *target,
            CommonFilter::AvailableOn { day, allowed } => common
                .availability_on(*day)
                .is_some_and(|a| allowed.contains(a.status)),
            CommonFilter::AvailableThroughout {
                start,
                end,
                allowed,
            } => common
                .availabilities
                .iter()
                .filter(|a| is_day_in_range(*start, *end, a.date))
                .all(|a| allowed.contains(a.status)),
        }
    }

    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            CommonFilter::Categories(_) => "categories",
            CommonFilter::Location(_) => "location",
            CommonFilter::AvailableOn { .. } => "available-on",
            CommonFilter::AvailableThroughout { .. } => "available-throughout",
        }
    }
}

impl Predicate<Common> for CommonFilter {
    fn test(&self, item: &Common) -> bool {
        self.evaluate(item)
    }
}

/// Keeps locations whose id is in a relevant set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelevantLocations(pub Arc<BTreeSet<LocationId>>);

impl Predicate<Location> for RelevantLocations {
    fn test(&self, item: &Location) -> bool {
        self.0.contains(&item.id)
    }
}

/// Intersection-subset category match; `None` when nothing is required
pub fn filter_by_categories(required: &BTreeSet<CategoryId>) -> Option<CommonFilter> {
    if required.is_empty() {
        None
    } else {
        Some(CommonFilter::Categories(required.clone()))
    }
}

pub fn filter_by_location(target: &LocationId) -> CommonFilter {
    CommonFilter::Location(target.clone())
}

pub fn filter_by_relevant_locations(ids: Arc<BTreeSet<LocationId>>) -> RelevantLocations {
    RelevantLocations(ids)
}

/// Single-day availability; a common with no record for the day fails
pub fn filter_by_date_availability(
    date: impl CalendarDay,
    allowed: &AllowedStatuses,
) -> CommonFilter {
    CommonFilter::AvailableOn {
        day: date.calendar_day(),
        allowed: allowed.clone(),
    }
}

/// Range availability, inclusive on both ends
///
/// Passes vacuously when the common has no record inside the range.
pub fn filter_by_availability_range(
    start: impl CalendarDay,
    end: impl CalendarDay,
    allowed: &AllowedStatuses,
) -> CommonFilter {
    CommonFilter::AvailableThroughout {
        start: start.calendar_day(),
        end: end.calendar_day(),
        allowed: allowed.clone(),
    }
}

/// Filter slots derived from the current criteria, inactive ones as `None`
///
/// `today` is only consulted when `available_today` is set. A range with
/// only a start acts as a single-day query; a range with only an end is
/// ignored.
pub fn criteria_filters(
    criteria: &FilterCriteria,
    today: Option<NaiveDate>,
    allowed: &AllowedStatuses,
) -> Vec<Option<CommonFilter>> {
    let today = today.filter(|_| criteria.available_today);
    let range = criteria.available_between;

    vec![
        today.map(|day| filter_by_date_availability(day, allowed)),
        match (range.start, range.end) {
            (Some(start), None) => Some(filter_by_date_availability(start, allowed)),
            _ => None,
        },
        match (range.start, range.end) {
            (Some(start), Some(end)) => Some(filter_by_availability_range(start, end, allowed)),
            _ => None,
        },
        filter_by_categories(&criteria.categories),
        criteria.location.as_ref().map(filter_by_location),
    ]
}
