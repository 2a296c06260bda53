//! Memoized results must always equal a from-scratch evaluation
//!
//! A long-lived database receives a random sequence of input changes and
//! partial reads. After every step its results are compared with those of a
//! fresh database holding the same inputs.

use chrono::NaiveDate;
use commons_filter::TieBreak;
use commons_incremental::prelude::*;
use commons_types::{AllowedStatuses, AvailabilityStatus, Catalog, Common, Coordinate, Location};
use proptest::prelude::*;
use std::sync::Arc;

const STATUSES: [AvailabilityStatus; 3] = [
    AvailabilityStatus::Available,
    AvailabilityStatus::Booked,
    AvailabilityStatus::Unavailable,
];

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn locations(count: usize) -> Vec<Location> {
    (0..count)
        .map(|i| {
            let offset = i as f64;
            Location::new(format!("L{i}"), Coordinate::new(50.0 + offset, 10.0 - offset))
        })
        .collect()
}

/// Small catalogs that differ in statuses, categories and locations
fn catalogs() -> Vec<Arc<Catalog>> {
    (0..3u32)
        .map(|variant| {
            let commons = (0..6u32)
                .map(|i| {
                    let location = format!("L{}", (i + variant) % 4);
                    let categories = [u64::from(i % 3) + 1, u64::from((i + variant) % 2) + 1];
                    let mut common =
                        Common::new(format!("C{i}"), location).with_categories(categories);
                    for d in 1..=4 {
                        let status = STATUSES[((i * 7 + d * 3 + variant) % 3) as usize];
                        if (i + d + variant) % 5 != 0 {
                            common = common.with_availability(day(d), status);
                        }
                    }
                    common
                })
                .collect();
            // The last variant loses a location, leaving a common unresolved
            let count = if variant == 2 { 3 } else { 4 };
            Arc::new(Catalog::new(commons, locations(count)))
        })
        .collect()
}

#[derive(Debug, Clone)]
enum Step {
    Catalog(usize),
    Criteria(FilterCriteria),
    Today(Option<u32>),
    Policy { booked: bool, by_id: bool },
    ReadMatching,
    ReadLocations,
    ReadCommons,
}

fn criteria() -> impl Strategy<Value = FilterCriteria> {
    (
        prop::collection::btree_set(1u64..=3, 0..=2),
        prop::option::of(0usize..4),
        any::<bool>(),
        prop::option::of(1u32..=5),
        prop::option::of(1u32..=5),
        prop::option::of(0usize..4),
        prop::option::of(0usize..4),
    )
        .prop_map(|(categories, location, today, start, end, user, center)| {
            let points = locations(4);
            let mut criteria = FilterCriteria::new()
                .with_categories(categories)
                .with_available_today(today)
                .with_range(start.map(day), end.map(day));
            criteria.location = location.map(|i| points[i].id.clone());
            criteria.user_location = user.map(|i| points[i].coordinates);
            criteria.map_center = center.map(|i| points[3 - i].coordinates);
            criteria
        })
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0usize..3).prop_map(Step::Catalog),
        criteria().prop_map(Step::Criteria),
        prop::option::of(1u32..=5).prop_map(Step::Today),
        (any::<bool>(), any::<bool>()).prop_map(|(booked, by_id)| Step::Policy { booked, by_id }),
        Just(Step::ReadMatching),
        Just(Step::ReadLocations),
        Just(Step::ReadCommons),
    ]
}

/// The inputs a fresh database is rebuilt from
#[derive(Debug, Default)]
struct Inputs {
    catalog: Option<usize>,
    criteria: FilterCriteria,
    today: Option<NaiveDate>,
    policy: SearchPolicy,
}

impl Inputs {
    fn fresh(&self, catalogs: &[Arc<Catalog>]) -> Db {
        let db = Db::new();
        if let Some(i) = self.catalog {
            db.set_input::<CatalogInput>((), Arc::clone(&catalogs[i]));
        }
        db.set_input::<CriteriaInput>((), self.criteria.clone());
        db.set_input::<TodayInput>((), self.today);
        db.set_input::<PolicyInput>((), self.policy.clone());
        db
    }
}

fn policy(booked: bool, by_id: bool) -> SearchPolicy {
    let mut allowed = vec![AvailabilityStatus::Available];
    if booked {
        allowed.push(AvailabilityStatus::Booked);
    }
    SearchPolicy {
        allowed: AllowedStatuses::new(allowed),
        tie_break: if by_id { TieBreak::Id } else { TieBreak::CatalogOrder },
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn memoized_results_match_a_fresh_database(steps in prop::collection::vec(step(), 1..60)) {
        let catalogs = catalogs();
        let db = Db::new();
        let mut inputs = Inputs::default();

        for step in steps {
            match step {
                Step::Catalog(i) => {
                    inputs.catalog = Some(i);
                    db.set_input::<CatalogInput>((), Arc::clone(&catalogs[i]));
                }
                Step::Criteria(criteria) => {
                    inputs.criteria = criteria.clone();
                    db.set_input::<CriteriaInput>((), criteria);
                }
                Step::Today(d) => {
                    inputs.today = d.map(day);
                    db.set_input::<TodayInput>((), inputs.today);
                }
                Step::Policy { booked, by_id } => {
                    inputs.policy = policy(booked, by_id);
                    db.set_input::<PolicyInput>((), inputs.policy.clone());
                }
                Step::ReadMatching => {
                    db.query::<MatchingCommonsQuery>(());
                }
                Step::ReadLocations => {
                    db.query::<FilteredLocationsQuery>(());
                }
                Step::ReadCommons => {
                    db.query::<FilteredCommonsQuery>(());
                }
            }

            let expected = inputs.fresh(&catalogs).query::<SearchResultsQuery>(());
            let actual = db.query::<SearchResultsQuery>(());
            prop_assert_eq!(&actual.commons, &expected.commons);
            prop_assert_eq!(&actual.locations, &expected.locations);
        }
    }

    #[test]
    fn repeated_reads_are_stable(criteria in criteria(), today in prop::option::of(1u32..=5)) {
        let catalogs = catalogs();
        let db = Db::new();
        db.set_input::<CatalogInput>((), Arc::clone(&catalogs[0]));
        db.set_input::<CriteriaInput>((), criteria);
        db.set_input::<TodayInput>((), today.map(day));

        let first = db.query::<SearchResultsQuery>(());
        let second = db.query::<SearchResultsQuery>(());
        prop_assert!(Arc::ptr_eq(&first.commons, &second.commons));
        prop_assert!(Arc::ptr_eq(&first.locations, &second.locations));
    }
}
