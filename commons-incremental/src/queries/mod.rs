//! The search pipeline as queries
//!
//! ```text
//! CatalogInput ─┬─ LocationIndexQuery ───────────────────┐
//!               └─ MatchingCommonsQuery ─┬─ FilteredCommonsQuery ─┐
//! CriteriaInput ─┬─ ActiveFiltersQuery ──┘         │              ├─ SearchResultsQuery
//! TodayInput ────┤                                 │              │
//! PolicyInput ───┘  RankingReferenceQuery ─────────┘              │
//!                   RelevantLocationIdsQuery ─ FilteredLocationsQuery
//! ```
//!
//! Filtering and ranking are separate queries, so moving the map only
//! re-ranks and changing categories only re-filters when the reference
//! point stays put.

pub mod filter;
pub mod inputs;
pub mod results;

pub use filter::{
    ActiveFiltersQuery, FilteredCommonsQuery, LocationIndexQuery, MatchingCommonsQuery,
    RankingReferenceQuery,
};
pub use inputs::{CatalogInput, CriteriaInput, PolicyInput, SearchPolicy, TodayInput};
pub use results::{
    FilteredLocationsQuery, RelevantLocationIdsQuery, SearchResults, SearchResultsQuery,
};
