//! # commons-filter
//!
//! Pure building blocks of the commons search engine:
//! - great-circle distance between coordinates
//! - calendar-day normalization for date comparisons
//! - independent predicates over commons and locations
//! - AND-composition of optional predicates over a collection
//! - distance ranking against a reference coordinate
//!
//! Nothing in this crate keeps state or performs I/O. The memoized
//! derivation pipeline that wires these pieces together lives in
//! `commons-incremental`.
//!
//! ## Example
//!
//! ```
//! use commons_filter::{apply, filter_by_categories};
//! use commons_types::{Common, FilterCriteria};
//!
//! let commons = vec![
//!     Common::new("a", "l1").with_categories([1]),
//!     Common::new("b", "l2").with_categories([2]),
//! ];
//! let criteria = FilterCriteria::new().with_categories([1]);
//!
//! let filtered = apply(&commons, [filter_by_categories(&criteria.categories)]);
//! assert_eq!(filtered.len(), 1);
//! ```

pub mod compose;
pub mod day;
pub mod geo;
pub mod index;
pub mod predicate;
pub mod rank;

pub use compose::{active, apply};
pub use day::CalendarDay;
pub use geo::{distance, EARTH_RADIUS_METERS};
pub use index::LocationIndex;
pub use predicate::{
    criteria_filters, filter_by_availability_range, filter_by_categories,
    filter_by_date_availability, filter_by_location, filter_by_relevant_locations, CommonFilter,
    Predicate, RelevantLocations,
};
pub use rank::{rank_by_distance, sort_by_distance, ReferencePoint, TieBreak};

// Re-export shared types from commons-types
pub use commons_types::{
    AllowedStatuses, Availability, AvailabilityStatus, CategoryId, Common, CommonId, Coordinate,
    FilterCriteria, Location, LocationId,
};
