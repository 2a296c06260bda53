//! Location results and the combined result set

use crate::queries::filter::{FilteredCommonsQuery, MatchingCommonsQuery};
use crate::queries::inputs::CatalogInput;
use crate::query::{Query, QueryDatabase};
use commons_filter::{apply, filter_by_relevant_locations};
use commons_types::{Common, Location, LocationId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Location ids referenced by the matching commons
///
/// Reads the unranked matches; ranking never changes the set.
pub struct RelevantLocationIdsQuery;

impl Query for RelevantLocationIdsQuery {
    type Key = ();
    type Value = Arc<BTreeSet<LocationId>>;

    fn execute<DB: QueryDatabase>(db: &DB, _key: &Self::Key) -> Self::Value {
        let matching = db.query::<MatchingCommonsQuery>(());
        Arc::new(matching.iter().map(|c| c.location_id.clone()).collect())
    }

    fn name() -> &'static str {
        "relevant_location_ids"
    }
}

/// Catalog locations referenced by at least one matching common, in
/// catalog order
pub struct FilteredLocationsQuery;

impl Query for FilteredLocationsQuery {
    type Key = ();
    type Value = Arc<Vec<Location>>;

    fn execute<DB: QueryDatabase>(db: &DB, _key: &Self::Key) -> Self::Value {
        let catalog = db.query::<CatalogInput>(());
        let relevant = db.query::<RelevantLocationIdsQuery>(());

        let locations = apply(
            &catalog.locations,
            [Some(filter_by_relevant_locations(relevant))],
        );
        Arc::new(locations.into_owned())
    }

    fn name() -> &'static str {
        "filtered_locations"
    }
}

/// Both outputs of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchResults {
    pub commons: Arc<Vec<Common>>,
    pub locations: Arc<Vec<Location>>,
}

/// Filtered commons and locations computed against the same inputs
pub struct SearchResultsQuery;

impl Query for SearchResultsQuery {
    type Key = ();
    type Value = SearchResults;

    fn execute<DB: QueryDatabase>(db: &DB, _key: &Self::Key) -> Self::Value {
        SearchResults {
            commons: db.query::<FilteredCommonsQuery>(()),
            locations: db.query::<FilteredLocationsQuery>(()),
        }
    }

    fn name() -> &'static str {
        "search_results"
    }
}
