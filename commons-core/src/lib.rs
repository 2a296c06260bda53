//! # commons-core
//!
//! Everything around the filtering core that a host application needs:
//! loading and checking catalog snapshots, reading the engine
//! configuration, and the [`CommonsSearch`] session that keeps results in
//! step with the catalog and the user's criteria.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod publish;
pub mod search;

pub use catalog::{
    fingerprint, load_catalog, parse_catalog, validate_catalog, CatalogError, CatalogSummary,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AvailabilityConfig, ConfigError, RankingConfig, SearchConfig};
pub use publish::{Subscribers, SubscriptionId};
pub use search::CommonsSearch;

pub use commons_incremental::{SearchPolicy, SearchResults};
pub use commons_types::{Catalog, Common, FilterCriteria, Location};
