//! The user-facing query object.

use crate::{CategoryId, Coordinate, LocationId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Optional date interval; either bound may be absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub start: Option<NaiveDate>,

    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Current search constraints, mutated incrementally by the UI layer
///
/// The default value engages no filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    /// Every listed category must be present on a common (empty = no constraint)
    pub categories: BTreeSet<CategoryId>,

    pub location: Option<LocationId>,

    /// "My position"; takes precedence over `map_center` for ranking
    pub user_location: Option<Coordinate>,

    pub map_center: Option<Coordinate>,

    pub available_today: bool,

    pub available_between: DateRange,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.categories = ids.into_iter().map(CategoryId).collect();
        self
    }

    pub fn with_location(mut self, id: impl Into<String>) -> Self {
        self.location = Some(LocationId::new(id));
        self
    }

    pub fn with_user_location(mut self, coordinate: Coordinate) -> Self {
        self.user_location = Some(coordinate);
        self
    }

    pub fn with_map_center(mut self, coordinate: Coordinate) -> Self {
        self.map_center = Some(coordinate);
        self
    }

    pub fn with_available_today(mut self, available_today: bool) -> Self {
        self.available_today = available_today;
        self
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.available_between = DateRange::new(start, end);
        self
    }

    /// True when no dimension is engaged
    pub fn is_unconstrained(&self) -> bool {
        self.categories.is_empty()
            && self.location.is_none()
            && !self.available_today
            && self.available_between.is_unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unconstrained() {
        assert!(FilterCriteria::default().is_unconstrained());
        assert!(!FilterCriteria::new().with_categories([1]).is_unconstrained());
        // ranking references do not constrain the result set
        assert!(FilterCriteria::new()
            .with_map_center(Coordinate::new(0.0, 0.0))
            .is_unconstrained());
    }

    #[test]
    fn test_criteria_json() {
        let json = r#"{
            "categories": [1],
            "availableBetween": { "start": "2024-03-01", "end": "2024-03-03" }
        }"#;
        let criteria: FilterCriteria = serde_json::from_str(json).unwrap();

        assert_eq!(criteria.categories.len(), 1);
        assert!(!criteria.available_today);
        assert_eq!(
            criteria.available_between.end,
            NaiveDate::from_ymd_opt(2024, 3, 3)
        );
        assert!(criteria.location.is_none());
    }
}
