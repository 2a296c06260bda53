//! Pipeline inputs
//!
//! All inputs are keyed by `()`: one search session owns one database.

use crate::durability::Durability;
use crate::query::{InputQuery, Query, QueryDatabase};
use chrono::NaiveDate;
use commons_filter::TieBreak;
use commons_types::{AllowedStatuses, Catalog, FilterCriteria};
use std::sync::Arc;

/// The catalog snapshot; replaced as a whole, never patched
pub struct CatalogInput;

impl Query for CatalogInput {
    type Key = ();
    type Value = Arc<Catalog>;

    fn execute<DB: QueryDatabase>(_db: &DB, _key: &Self::Key) -> Self::Value {
        Arc::new(Catalog::default())
    }

    fn durability() -> Durability {
        Durability::Durable
    }

    fn name() -> &'static str {
        "catalog"
    }
}

impl InputQuery for CatalogInput {}

/// The user's current filter criteria
pub struct CriteriaInput;

impl Query for CriteriaInput {
    type Key = ();
    type Value = FilterCriteria;

    fn execute<DB: QueryDatabase>(_db: &DB, _key: &Self::Key) -> Self::Value {
        FilterCriteria::default()
    }

    fn durability() -> Durability {
        Durability::Session
    }

    fn name() -> &'static str {
        "criteria"
    }
}

impl InputQuery for CriteriaInput {}

/// Today's calendar day, sampled from a clock right before each read
///
/// `None` until sampled; an "available today" filter without a sampled
/// day stays inactive.
pub struct TodayInput;

impl Query for TodayInput {
    type Key = ();
    type Value = Option<NaiveDate>;

    fn execute<DB: QueryDatabase>(_db: &DB, _key: &Self::Key) -> Self::Value {
        None
    }

    fn durability() -> Durability {
        Durability::Volatile
    }

    fn name() -> &'static str {
        "today"
    }
}

impl InputQuery for TodayInput {}

/// Engine policy that is not part of the user's criteria
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchPolicy {
    /// Statuses that count as available
    pub allowed: AllowedStatuses,
    pub tie_break: TieBreak,
}

pub struct PolicyInput;

impl Query for PolicyInput {
    type Key = ();
    type Value = SearchPolicy;

    fn execute<DB: QueryDatabase>(_db: &DB, _key: &Self::Key) -> Self::Value {
        SearchPolicy::default()
    }

    fn durability() -> Durability {
        Durability::Durable
    }

    fn name() -> &'static str {
        "policy"
    }
}

impl InputQuery for PolicyInput {}
