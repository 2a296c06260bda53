//! The search session: inputs in, results out
//!
//! Flow: set_catalog / update_criteria → query database → subscribers
//!
//! A [`CommonsSearch`] owns one query database. Every mutation bumps the
//! relevant input and republishes fresh results to all subscribers; reads
//! sample today's date first so "available today" always means the day of
//! the read.

use crate::clock::{Clock, SystemClock};
use crate::config::SearchConfig;
use crate::publish::{SubscriptionId, Subscribers};
use commons_incremental::prelude::*;
use commons_incremental::MetricsReport;
use commons_types::{Catalog, Common, Location};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A filtering and ranking session over one catalog
pub struct CommonsSearch<C: Clock = SystemClock> {
    db: Db,
    clock: C,
    subscribers: Subscribers,
    /// Serializes read-modify-write updates of the inputs
    writer: Mutex<()>,
}

impl CommonsSearch<SystemClock> {
    pub fn new(config: &SearchConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> CommonsSearch<C> {
    pub fn with_clock(config: &SearchConfig, clock: C) -> Self {
        let db = Db::new();
        db.set_input::<PolicyInput>((), config.policy());

        Self {
            db,
            clock,
            subscribers: Subscribers::new(),
            writer: Mutex::new(()),
        }
    }

    /// Replace the catalog snapshot
    pub fn set_catalog(&self, catalog: impl Into<Arc<Catalog>>) {
        let catalog = catalog.into();
        tracing::info!(
            commons = catalog.commons.len(),
            locations = catalog.locations.len(),
            "catalog replaced"
        );
        {
            let _writer = self.writer.lock();
            self.db.set_input::<CatalogInput>((), catalog);
        }
        self.republish();
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        self.db.query::<CatalogInput>(())
    }

    pub fn set_policy(&self, policy: SearchPolicy) {
        {
            let _writer = self.writer.lock();
            self.db.set_input::<PolicyInput>((), policy);
        }
        self.republish();
    }

    pub fn policy(&self) -> SearchPolicy {
        self.db.query::<PolicyInput>(())
    }

    /// Edit the current criteria in place
    ///
    /// The edit runs while the session holds its write lock, so concurrent
    /// edits never lose each other's changes. The closure may read from the
    /// session but must not call `set_catalog`, `set_policy`, `set_criteria`
    /// or `update_criteria` on it; doing so deadlocks.
    pub fn update_criteria(&self, edit: impl FnOnce(&mut FilterCriteria)) {
        {
            let _writer = self.writer.lock();
            let mut criteria = self.db.query::<CriteriaInput>(());
            edit(&mut criteria);
            self.db.set_input::<CriteriaInput>((), criteria);
        }
        self.republish();
    }

    pub fn set_criteria(&self, criteria: FilterCriteria) {
        {
            let _writer = self.writer.lock();
            self.db.set_input::<CriteriaInput>((), criteria);
        }
        self.republish();
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.db.query::<CriteriaInput>(())
    }

    /// Matching commons, nearest first when a reference point is set
    pub fn filtered_commons(&self) -> Arc<Vec<Common>> {
        self.results().commons
    }

    /// Locations of the matching commons, in catalog order
    pub fn filtered_locations(&self) -> Arc<Vec<Location>> {
        self.results().locations
    }

    /// Both result sets, computed against the same inputs
    pub fn results(&self) -> SearchResults {
        self.db.set_input::<TodayInput>((), Some(self.clock.today()));
        self.db.query::<SearchResultsQuery>(())
    }

    /// Register a callback for republished results
    ///
    /// The callback is not invoked until the next mutation.
    pub fn subscribe(
        &self,
        callback: impl Fn(&SearchResults) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(Arc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn metrics(&self) -> MetricsReport {
        self.db.metrics()
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    fn republish(&self) {
        if self.subscribers.is_empty() {
            return;
        }
        let results = self.results();
        self.subscribers.publish(&results);
    }
}

impl<C: Clock> fmt::Debug for CommonsSearch<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonsSearch")
            .field("db", &self.db)
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use commons_types::{AvailabilityStatus, CategoryId, Coordinate, LocationId};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn catalog() -> Catalog {
        Catalog::new(
            vec![
                Common::new("A", "L1")
                    .with_categories([1])
                    .with_availability(day(1), AvailabilityStatus::Available)
                    .with_availability(day(2), AvailabilityStatus::Available),
                Common::new("B", "L2")
                    .with_categories([2])
                    .with_availability(day(1), AvailabilityStatus::Booked)
                    .with_availability(day(2), AvailabilityStatus::Available),
            ],
            vec![
                Location::new("L1", Coordinate::new(52.52, 13.40)),
                Location::new("L2", Coordinate::new(48.14, 11.58)),
            ],
        )
    }

    fn ids(commons: &[Common]) -> Vec<&str> {
        commons.iter().map(|c| c.id.as_str()).collect()
    }

    fn search() -> CommonsSearch<Arc<FixedClock>> {
        let search = CommonsSearch::with_clock(
            &SearchConfig::default(),
            Arc::new(FixedClock::new(day(1))),
        );
        search.set_catalog(catalog());
        search
    }

    #[test]
    fn test_defaults_pass_everything() {
        let search = search();
        assert_eq!(ids(&search.filtered_commons()), ["A", "B"]);
        assert_eq!(search.filtered_locations().len(), 2);
    }

    #[test]
    fn test_update_criteria() {
        let search = search();
        search.update_criteria(|c| {
            c.categories.insert(CategoryId(2));
        });

        assert_eq!(ids(&search.filtered_commons()), ["B"]);
        assert_eq!(search.criteria(), FilterCriteria::new().with_categories([2]));
    }

    #[test]
    fn test_update_criteria_can_read_the_session() {
        let search = search();
        search.update_criteria(|c| {
            let catalog = search.catalog();
            c.location = catalog.locations.last().map(|l| l.id.clone());
            c.categories = search.criteria().categories;
        });

        assert_eq!(ids(&search.filtered_commons()), ["B"]);
    }

    #[test]
    fn test_today_follows_the_clock() {
        let clock = Arc::new(FixedClock::new(day(1)));
        let search = CommonsSearch::with_clock(&SearchConfig::default(), Arc::clone(&clock));
        search.set_catalog(catalog());
        search.set_criteria(FilterCriteria::new().with_available_today(true));

        assert_eq!(ids(&search.filtered_commons()), ["A"]);

        clock.advance(1);
        assert_eq!(ids(&search.filtered_commons()), ["A", "B"]);

        clock.advance(1);
        assert!(search.filtered_commons().is_empty());
    }

    #[test]
    fn test_today_is_tracked_after_an_unchanged_result() {
        let clock = Arc::new(FixedClock::new(day(1)));
        let search = CommonsSearch::with_clock(&SearchConfig::default(), Arc::clone(&clock));
        search.set_catalog(Catalog::new(
            vec![
                Common::new("A", "L1")
                    .with_availability(day(1), AvailabilityStatus::Available)
                    .with_availability(day(2), AvailabilityStatus::Available),
                Common::new("B", "L2").with_availability(day(1), AvailabilityStatus::Available),
            ],
            catalog().locations,
        ));
        assert_eq!(ids(&search.filtered_commons()), ["A", "B"]);

        search.set_criteria(FilterCriteria::new().with_available_today(true));
        assert_eq!(ids(&search.filtered_commons()), ["A", "B"]);

        clock.advance(1);
        let results = search.results();
        assert_eq!(ids(&results.commons), ["A"]);
        let locations: Vec<_> = results.locations.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(locations, ["L1"]);
    }

    #[test]
    fn test_subscribers_receive_republished_results() {
        let search = search();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let id = search.subscribe(move |results| {
            sink.lock().push(results.commons.len());
        });

        search.update_criteria(|c| c.location = Some(LocationId::new("L2")));
        search.set_criteria(FilterCriteria::new().with_categories([3]));
        assert_eq!(*seen.lock(), vec![1, 0]);

        assert!(search.unsubscribe(id));
        search.set_criteria(FilterCriteria::default());
        assert_eq!(seen.lock().len(), 2);
    }

    #[test]
    fn test_catalog_replacement_is_published() {
        let search = search();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        search.subscribe(move |results| {
            assert!(results.commons.is_empty());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        search.set_catalog(Catalog::default());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(search.catalog().is_empty());
    }

    #[test]
    fn test_results_are_one_snapshot() {
        let search = search();
        search.set_criteria(FilterCriteria::new().with_user_location(Coordinate::new(48.1, 11.6)));

        let results = search.results();
        assert_eq!(ids(&results.commons), ["B", "A"]);
        let locations: Vec<_> = results.locations.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(locations, ["L1", "L2"]);
    }

    #[test]
    fn test_policy_from_config() {
        let config = SearchConfig::from_yaml_str(
            "availability:\n  allowed_statuses: [available, booked]\n",
        )
        .unwrap();
        let search = CommonsSearch::with_clock(&config, FixedClock::new(day(1)));
        search.set_catalog(catalog());
        search.set_criteria(FilterCriteria::new().with_available_today(true));

        assert_eq!(ids(&search.filtered_commons()), ["A", "B"]);
        assert!(search.policy().allowed.contains(AvailabilityStatus::Booked));
    }
}
