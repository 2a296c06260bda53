//! Commons Search Incremental Computation Engine
//!
//! A small Salsa-style query database that keeps the search results
//! derived from a catalog and a set of filter criteria up to date.
//!
//! # Architecture
//!
//! Every pipeline stage is a **query**: a pure, memoized function of the
//! queries it reads. Reads are tracked automatically, so after an input
//! changes only the stages that actually read it are revalidated.
//!
//! ## Search pipeline
//!
//! ```text
//! catalog, criteria, today, policy → active filters → matching commons
//!                                  → ranked commons, relevant locations
//!                                  → search results
//! ```
//!
//! ## Key Features
//!
//! - **Dependency Tracking**: queries record what they read while running
//! - **Memoization**: results are reused while their inputs are unchanged
//! - **Early Cutoff**: a recomputed value that hashes the same does not
//!   disturb its dependents
//! - **Durability Tiers**: values that only read the catalog skip
//!   revalidation when only the criteria or the date changed
//!
//! # Example
//!
//! ```rust
//! use commons_incremental::prelude::*;
//! use commons_types::{Catalog, Common, Coordinate, Location};
//! use std::sync::Arc;
//!
//! let db = Db::new();
//! db.set_input::<CatalogInput>((), Arc::new(Catalog::new(
//!     vec![Common::new("bike", "l1").with_categories([1])],
//!     vec![Location::new("l1", Coordinate::new(52.5, 13.4))],
//! )));
//! db.set_input::<CriteriaInput>((), FilterCriteria::new().with_categories([1]));
//!
//! let results = db.query::<SearchResultsQuery>(());
//! assert_eq!(results.commons.len(), 1);
//! assert_eq!(results.locations.len(), 1);
//! ```

pub mod db;
pub mod durability;
pub mod memo;
pub mod metrics;
pub mod query;

pub mod queries;

pub use db::Db;
pub use durability::Durability;
pub use memo::{MemoEntry, MemoStorage, MemoTable, MemoUpdate};
pub use metrics::{MetricsReport, MetricsSnapshot, QueryMetrics};
pub use queries::{SearchPolicy, SearchResults};
pub use query::{hash_value, InputQuery, Query, QueryDatabase, QueryKey, Revision};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::db::Db;
    pub use crate::durability::Durability;
    pub use crate::queries::{
        ActiveFiltersQuery, CatalogInput, CriteriaInput, FilteredCommonsQuery,
        FilteredLocationsQuery, LocationIndexQuery, MatchingCommonsQuery, PolicyInput,
        RankingReferenceQuery, RelevantLocationIdsQuery, SearchPolicy, SearchResults,
        SearchResultsQuery, TodayInput,
    };
    pub use crate::query::{InputQuery, Query, QueryDatabase};
    pub use commons_types::FilterCriteria;
}
