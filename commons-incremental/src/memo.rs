//! Memoization with early cutoff
//!
//! Each query type owns a [`MemoTable`]. An entry remembers its value, the
//! queries it read, when it was last confirmed valid and when its value last
//! actually changed. Recomputing to an identical hash keeps the old change
//! revision so dependents need not rerun.

use crate::durability::Durability;
use crate::query::{hash_value, Query, QueryKey, Revision};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::hash::Hash;
use std::sync::Arc;

/// A memoized entry for a query result
#[derive(Debug, Clone)]
pub struct MemoEntry<V> {
    pub value: V,

    /// Hash of the value for early cutoff
    pub value_hash: u64,

    /// Revision when the value last differed from its predecessor
    pub changed_at: Revision,

    /// Revision when this was last confirmed valid
    pub verified_at: Revision,

    /// Queries read while computing the value
    pub dependencies: Vec<QueryKey>,

    /// Most volatile tier among the dependencies
    pub durability: Durability,
}

impl<V: Hash> MemoEntry<V> {
    pub fn new(
        value: V,
        computed_at: Revision,
        dependencies: Vec<QueryKey>,
        durability: Durability,
    ) -> Self {
        let value_hash = hash_value(&value);

        MemoEntry {
            value,
            value_hash,
            changed_at: computed_at,
            verified_at: computed_at,
            dependencies,
            durability,
        }
    }

    /// Check if a new value is unchanged (early cutoff check)
    pub fn is_unchanged(&self, new_value: &V) -> bool {
        hash_value(new_value) == self.value_hash
    }

    pub fn is_verified_for(&self, revision: Revision) -> bool {
        self.verified_at >= revision
    }
}

/// Outcome of writing a value into a memo table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoUpdate {
    /// False when the new value hashed the same as the old one
    pub changed: bool,

    /// Change revision now stored on the entry
    pub changed_at: Revision,
}

/// Memoization table for a specific query type
pub struct MemoTable<Q: Query> {
    entries: DashMap<Q::Key, MemoEntry<Q::Value>>,
}

impl<Q: Query> MemoTable<Q> {
    pub fn new() -> Self {
        MemoTable {
            entries: DashMap::new(),
        }
    }

    /// Cached value, whether or not it is still valid
    pub fn get(&self, key: &Q::Key) -> Option<Q::Value> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn get_entry(&self, key: &Q::Key) -> Option<MemoEntry<Q::Value>> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    /// Store a freshly computed value
    pub fn update_entry(
        &self,
        key: Q::Key,
        new_value: Q::Value,
        revision: Revision,
        dependencies: Vec<QueryKey>,
        durability: Durability,
    ) -> MemoUpdate {
        let new_hash = hash_value(&new_value);

        if let Some(mut entry) = self.entries.get_mut(&key) {
            let changed = entry.value_hash != new_hash;
            if changed {
                entry.value = new_value;
                entry.value_hash = new_hash;
            }
            // An unchanged value keeps its change revision only if it is no
            // more volatile than before
            if changed || !durability.at_least(entry.durability) {
                entry.changed_at = revision;
            }
            entry.verified_at = revision;
            entry.dependencies = dependencies;
            entry.durability = durability;

            MemoUpdate {
                changed,
                changed_at: entry.changed_at,
            }
        } else {
            self.entries.insert(
                key,
                MemoEntry::new(new_value, revision, dependencies, durability),
            );
            MemoUpdate {
                changed: true,
                changed_at: revision,
            }
        }
    }

    /// Confirm an entry without recomputing it
    pub fn mark_verified(&self, key: &Q::Key, revision: Revision, durability: Durability) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.verified_at = revision;
            entry.durability = durability;
        }
    }

    /// Invalidate an entry (remove it)
    pub fn invalidate(&self, key: &Q::Key) -> Option<MemoEntry<Q::Value>> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<Q: Query> Default for MemoTable<Q> {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage for all memo tables, one per query type
pub struct MemoStorage {
    tables: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl MemoStorage {
    pub fn new() -> Self {
        MemoStorage {
            tables: DashMap::new(),
        }
    }

    /// Get or create the memo table for a query type
    pub fn get_table<Q: Query>(&self) -> Arc<MemoTable<Q>> {
        let table = self
            .tables
            .entry(TypeId::of::<Q>())
            .or_insert_with(|| Arc::new(MemoTable::<Q>::new()))
            .value()
            .clone();

        // SAFETY: We only insert MemoTable<Q> for TypeId::of::<Q>()
        table
            .downcast::<MemoTable<Q>>()
            .expect("type mismatch in memo storage")
    }

    pub fn num_query_types(&self) -> usize {
        self.tables.len()
    }
}

impl Default for MemoStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryDatabase;

    struct NameQuery;
    impl Query for NameQuery {
        type Key = u32;
        type Value = String;

        fn execute<DB: QueryDatabase>(_db: &DB, key: &Self::Key) -> Self::Value {
            key.to_string()
        }
    }

    #[test]
    fn test_memo_entry_unchanged() {
        let entry = MemoEntry::new("a".to_string(), Revision(1), vec![], Durability::Volatile);

        assert!(entry.is_unchanged(&"a".to_string()));
        assert!(!entry.is_unchanged(&"b".to_string()));
        assert!(entry.is_verified_for(Revision(1)));
        assert!(!entry.is_verified_for(Revision(2)));
    }

    #[test]
    fn test_early_cutoff_keeps_change_revision() {
        let table = MemoTable::<NameQuery>::new();

        let first = table.update_entry(1, "x".into(), Revision(1), vec![], Durability::Session);
        assert_eq!(first, MemoUpdate { changed: true, changed_at: Revision(1) });

        let same = table.update_entry(1, "x".into(), Revision(4), vec![], Durability::Session);
        assert_eq!(same, MemoUpdate { changed: false, changed_at: Revision(1) });
        assert_eq!(table.get_entry(&1).map(|e| e.verified_at), Some(Revision(4)));

        let different = table.update_entry(1, "y".into(), Revision(5), vec![], Durability::Session);
        assert_eq!(different, MemoUpdate { changed: true, changed_at: Revision(5) });
        assert_eq!(table.get(&1), Some("y".to_string()));
    }

    #[test]
    fn test_more_volatile_value_counts_as_changed() {
        let table = MemoTable::<NameQuery>::new();
        table.update_entry(1, "x".into(), Revision(1), vec![], Durability::Session);

        let volatile = table.update_entry(1, "x".into(), Revision(3), vec![], Durability::Volatile);
        assert_eq!(volatile, MemoUpdate { changed: false, changed_at: Revision(3) });

        let durable = table.update_entry(1, "x".into(), Revision(6), vec![], Durability::Durable);
        assert_eq!(durable, MemoUpdate { changed: false, changed_at: Revision(3) });
        assert_eq!(table.get_entry(&1).map(|e| e.durability), Some(Durability::Durable));
    }

    #[test]
    fn test_mark_verified_updates_durability() {
        let table = MemoTable::<NameQuery>::new();
        table.update_entry(2, "2".into(), Revision(1), vec![], Durability::Session);
        table.mark_verified(&2, Revision(4), Durability::Volatile);

        let entry = table.get_entry(&2).unwrap();
        assert_eq!(entry.verified_at, Revision(4));
        assert_eq!(entry.changed_at, Revision(1));
        assert_eq!(entry.durability, Durability::Volatile);
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let table = MemoTable::<NameQuery>::new();
        table.update_entry(1, "x".into(), Revision(1), vec![], Durability::Volatile);

        assert!(table.invalidate(&1).is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn test_storage_returns_same_table() {
        let storage = MemoStorage::new();
        storage
            .get_table::<NameQuery>()
            .update_entry(3, "3".into(), Revision(1), vec![], Durability::Volatile);

        assert_eq!(storage.get_table::<NameQuery>().len(), 1);
        assert_eq!(storage.num_query_types(), 1);
    }
}
