//! Filtering and ranking queries

use crate::queries::inputs::{CatalogInput, CriteriaInput, PolicyInput, TodayInput};
use crate::query::{Query, QueryDatabase};
use commons_filter::{
    apply, criteria_filters, sort_by_distance, CommonFilter, LocationIndex, ReferencePoint,
};
use commons_types::Common;
use std::sync::Arc;

/// Location lookup rebuilt whenever the catalog changes
pub struct LocationIndexQuery;

impl Query for LocationIndexQuery {
    type Key = ();
    type Value = Arc<LocationIndex>;

    fn execute<DB: QueryDatabase>(db: &DB, _key: &Self::Key) -> Self::Value {
        let catalog = db.query::<CatalogInput>(());
        Arc::new(LocationIndex::build(&catalog.locations))
    }

    fn name() -> &'static str {
        "location_index"
    }
}

/// Filter slots for the current criteria, inactive ones as `None`
///
/// Today is only read when the criteria ask for it, so a day rollover does
/// not disturb searches that never looked at the date.
pub struct ActiveFiltersQuery;

impl Query for ActiveFiltersQuery {
    type Key = ();
    type Value = Arc<Vec<Option<CommonFilter>>>;

    fn execute<DB: QueryDatabase>(db: &DB, _key: &Self::Key) -> Self::Value {
        let criteria = db.query::<CriteriaInput>(());
        let policy = db.query::<PolicyInput>(());
        let today = if criteria.available_today {
            db.query::<TodayInput>(())
        } else {
            None
        };

        let filters = criteria_filters(&criteria, today, &policy.allowed);
        tracing::debug!(
            active = ?filters.iter().flatten().map(CommonFilter::kind).collect::<Vec<_>>(),
            "built filters"
        );
        Arc::new(filters)
    }

    fn name() -> &'static str {
        "active_filters"
    }
}

/// Commons passing every active filter, in catalog order
pub struct MatchingCommonsQuery;

impl Query for MatchingCommonsQuery {
    type Key = ();
    type Value = Arc<Vec<Common>>;

    fn execute<DB: QueryDatabase>(db: &DB, _key: &Self::Key) -> Self::Value {
        let catalog = db.query::<CatalogInput>(());
        let filters = db.query::<ActiveFiltersQuery>(());

        let matching = apply(&catalog.commons, filters.iter().cloned());
        tracing::debug!(
            matching = matching.len(),
            total = catalog.commons.len(),
            "filtered commons"
        );
        Arc::new(matching.into_owned())
    }

    fn name() -> &'static str {
        "matching_commons"
    }
}

/// The point results are ranked against, if any
pub struct RankingReferenceQuery;

impl Query for RankingReferenceQuery {
    type Key = ();
    type Value = Option<ReferencePoint>;

    fn execute<DB: QueryDatabase>(db: &DB, _key: &Self::Key) -> Self::Value {
        ReferencePoint::select(&db.query::<CriteriaInput>(()))
    }

    fn name() -> &'static str {
        "ranking_reference"
    }
}

/// Matching commons, ranked by distance when a reference point is set
pub struct FilteredCommonsQuery;

impl Query for FilteredCommonsQuery {
    type Key = ();
    type Value = Arc<Vec<Common>>;

    fn execute<DB: QueryDatabase>(db: &DB, _key: &Self::Key) -> Self::Value {
        let matching = db.query::<MatchingCommonsQuery>(());
        let Some(reference) = db.query::<RankingReferenceQuery>(()) else {
            return matching;
        };

        let index = db.query::<LocationIndexQuery>(());
        let policy = db.query::<PolicyInput>(());

        let mut ranked = matching.as_ref().clone();
        sort_by_distance(&mut ranked, reference.coordinate(), &index, policy.tie_break);
        Arc::new(ranked)
    }

    fn name() -> &'static str {
        "filtered_commons"
    }
}
