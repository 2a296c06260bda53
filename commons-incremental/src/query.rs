//! Query trait and key types
//!
//! Every stage of the search pipeline is a [`Query`]: a pure function from a
//! key to a value that the database memoizes. Inputs are queries whose value
//! is set from outside instead of computed.

use crate::durability::Durability;
use std::any::TypeId;
use std::fmt;
use std::hash::Hash;

/// Unique identifier for a query invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    /// Type ID of the query
    pub query_type: TypeId,

    /// Hash of the query's key
    pub key_hash: u64,
}

impl QueryKey {
    pub fn new<Q: Query>(key: &Q::Key) -> Self {
        QueryKey {
            query_type: TypeId::of::<Q>(),
            key_hash: hash_value(key),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Query({:?}, {:016x})", self.query_type, self.key_hash)
    }
}

/// Monotonic input version; bumped once per effective input change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

impl Revision {
    pub const ZERO: Revision = Revision(0);

    pub fn next(self) -> Revision {
        Revision(self.0 + 1)
    }
}

impl Default for Revision {
    fn default() -> Self {
        Revision::ZERO
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Core trait for memoized queries
///
/// `execute` must be a pure function of the key and of whatever it reads
/// through `db`; reads are recorded as dependencies.
pub trait Query: 'static + Send + Sync {
    /// The input key for this query
    type Key: Hash + Eq + Clone + Send + Sync + 'static;

    /// The output value produced by this query
    ///
    /// The hash doubles as the change detector for early cutoff.
    type Value: Clone + Hash + Send + Sync + 'static;

    fn execute<DB: QueryDatabase>(db: &DB, key: &Self::Key) -> Self::Value;

    /// Durability tier; only meaningful for inputs; derived queries
    /// inherit the most volatile tier among what they read
    fn durability() -> Durability {
        Durability::Volatile
    }

    /// Name used in logs and metrics
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Marker for queries whose value is supplied with `Db::set_input`
///
/// Until set, `execute` provides the initial value.
pub trait InputQuery: Query {}

/// Database interface for queries
///
/// Implemented directly by `Db`; queries are generic over it rather than
/// receiving a trait object.
pub trait QueryDatabase: Send + Sync + 'static {
    /// Read another query, recording it as a dependency of the caller
    fn query<Q: Query>(&self, key: Q::Key) -> Q::Value;

    fn revision(&self) -> Revision;
}

/// Hash used for query keys and early cutoff
pub fn hash_value<T: Hash + ?Sized>(value: &T) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::Hasher;

    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
