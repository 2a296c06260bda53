//! Query database implementation
//!
//! The database memoizes every query, records which queries each execution
//! read, and on the next read decides whether the memo is still valid by
//! checking those dependencies bottom-up. Evaluation is serialized by a
//! reentrant lock so a pipeline run observes exactly one set of inputs.

use crate::durability::Durability;
use crate::memo::{MemoEntry, MemoStorage, MemoTable};
use crate::metrics::{MetricsReport, MetricsSnapshot, QueryMetrics};
use crate::query::{InputQuery, Query, QueryDatabase, QueryKey, Revision};
use dashmap::DashMap;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Brings one memoized query up to date and reports its change revision
/// and current durability
type Revalidator = Arc<dyn Fn(&Db) -> (Revision, Durability) + Send + Sync>;

/// Reads performed by one in-flight execution
type Frame = Vec<(QueryKey, Durability)>;

/// A value together with the bookkeeping dependents need
struct Fetched<V> {
    value: V,
    changed_at: Revision,
    durability: Durability,
}

/// The incremental computation database
pub struct Db {
    memo: MemoStorage,

    /// Query -> queries it read during its last execution
    dependencies: DashMap<QueryKey, Vec<QueryKey>>,

    revalidators: DashMap<QueryKey, Revalidator>,

    current_revision: AtomicU64,

    /// Per tier, the last revision at which an input of that tier or a
    /// more durable one changed
    last_changed: [AtomicU64; 4],

    /// Stack of in-flight executions
    evaluation: ReentrantMutex<RefCell<Vec<Frame>>>,

    metrics: DashMap<&'static str, Arc<QueryMetrics>>,
}

impl Db {
    pub fn new() -> Self {
        Db {
            memo: MemoStorage::new(),
            dependencies: DashMap::new(),
            revalidators: DashMap::new(),
            current_revision: AtomicU64::new(1),
            last_changed: Default::default(),
            evaluation: ReentrantMutex::new(RefCell::new(Vec::new())),
            metrics: DashMap::new(),
        }
    }

    /// Get or compute a query result
    ///
    /// Inside another query's execution the read is recorded as a
    /// dependency of that query.
    pub fn query<Q: Query>(&self, key: Q::Key) -> Q::Value {
        let guard = self.evaluation.lock();
        let fetched = self.fetch::<Q>(&key);

        if let Some(frame) = guard.borrow_mut().last_mut() {
            frame.push((QueryKey::new::<Q>(&key), fetched.durability));
        }
        fetched.value
    }

    fn fetch<Q: Query>(&self, key: &Q::Key) -> Fetched<Q::Value> {
        let table = self.memo.get_table::<Q>();
        let metrics = self.metrics_for::<Q>();
        let current = self.revision();

        if let Some(entry) = table.get_entry(key) {
            let confirmed = if entry.is_verified_for(current) {
                Some(entry.durability)
            } else {
                self.still_valid(&entry)
            };
            if let Some(durability) = confirmed {
                table.mark_verified(key, current, durability);
                metrics.record_hit();
                return Fetched {
                    value: entry.value,
                    changed_at: entry.changed_at,
                    durability,
                };
            }
        }

        self.execute::<Q>(key, &table, &metrics)
    }

    /// Validity of an entry verified at an older revision
    ///
    /// Returns the durability the entry holds from now on, or `None` when
    /// it has to be recomputed.
    fn still_valid<V>(&self, entry: &MemoEntry<V>) -> Option<Durability> {
        if self.last_changed_at(entry.durability) <= entry.verified_at {
            return Some(entry.durability);
        }
        if entry.dependencies.is_empty() {
            return Some(entry.durability);
        }

        // Dependencies are revalidated in read order so a changed one
        // stops the walk before later, possibly irrelevant, reads.
        let mut durability = Durability::Static;
        for dep in &entry.dependencies {
            let revalidate = self.revalidators.get(dep).map(|r| Arc::clone(r.value()))?;
            let (changed_at, dep_durability) = revalidate(self);
            if changed_at > entry.verified_at {
                return None;
            }
            durability = durability.min(dep_durability);
        }
        Some(durability)
    }

    fn execute<Q: Query>(
        &self,
        key: &Q::Key,
        table: &MemoTable<Q>,
        metrics: &QueryMetrics,
    ) -> Fetched<Q::Value> {
        let guard = self.evaluation.lock();
        guard.borrow_mut().push(Vec::new());

        let started = Instant::now();
        let value = Q::execute(self, key);
        let elapsed = started.elapsed();

        let reads = guard.borrow_mut().pop().unwrap_or_default();
        let durability = reads
            .iter()
            .map(|(_, durability)| *durability)
            .min()
            .unwrap_or_else(Q::durability);

        let mut dependencies: Vec<QueryKey> = Vec::with_capacity(reads.len());
        for (dep, _) in reads {
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }

        let revision = self.revision();
        let update = table.update_entry(
            key.clone(),
            value.clone(),
            revision,
            dependencies.clone(),
            durability,
        );

        metrics.record_execution(elapsed);
        if !update.changed {
            metrics.record_early_cutoff();
        }
        tracing::debug!(
            query = Q::name(),
            %revision,
            %durability,
            changed = update.changed,
            deps = dependencies.len(),
            ?elapsed,
            "executed query"
        );

        self.dependencies.insert(QueryKey::new::<Q>(key), dependencies);
        self.register_revalidator::<Q>(key);

        Fetched {
            value,
            changed_at: update.changed_at,
            durability,
        }
    }

    fn register_revalidator<Q: Query>(&self, key: &Q::Key) {
        self.revalidators
            .entry(QueryKey::new::<Q>(key))
            .or_insert_with(|| {
                let key = key.clone();
                let revalidate: Revalidator = Arc::new(move |db: &Db| {
                    let fetched = db.fetch::<Q>(&key);
                    (fetched.changed_at, fetched.durability)
                });
                revalidate
            });
    }

    /// Set an input value
    ///
    /// Setting a value that hashes the same as the current one is a no-op
    /// and does not start a new revision.
    pub fn set_input<Q: InputQuery>(&self, key: Q::Key, value: Q::Value) {
        let _guard = self.evaluation.lock();
        let table = self.memo.get_table::<Q>();

        if let Some(entry) = table.get_entry(&key) {
            if entry.is_unchanged(&value) {
                tracing::debug!(input = Q::name(), "input unchanged");
                return;
            }
        }

        let revision = self.bump_revision();
        let durability = Q::durability();
        table.update_entry(key.clone(), value, revision, Vec::new(), durability);
        self.mark_changed(durability, revision);
        self.register_revalidator::<Q>(&key);

        tracing::debug!(input = Q::name(), %revision, %durability, "input set");
    }

    /// Drop a memoized value so the next read recomputes it
    pub fn invalidate<Q: Query>(&self, key: Q::Key) {
        let _guard = self.evaluation.lock();
        if self.memo.get_table::<Q>().invalidate(&key).is_some() {
            let revision = self.bump_revision();
            self.mark_changed(Durability::Static, revision);
        }
    }

    pub fn revision(&self) -> Revision {
        Revision(self.current_revision.load(Ordering::SeqCst))
    }

    fn bump_revision(&self) -> Revision {
        Revision(self.current_revision.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Record a change for `durability` and every less durable tier
    fn mark_changed(&self, durability: Durability, revision: Revision) {
        for tier in &self.last_changed[..=durability.index()] {
            tier.store(revision.0, Ordering::SeqCst);
        }
    }

    fn last_changed_at(&self, durability: Durability) -> Revision {
        Revision(self.last_changed[durability.index()].load(Ordering::SeqCst))
    }

    /// Queries read by the last execution of `Q(key)`
    pub fn dependencies_of<Q: Query>(&self, key: &Q::Key) -> Vec<QueryKey> {
        self.dependencies
            .get(&QueryKey::new::<Q>(key))
            .map(|deps| deps.value().clone())
            .unwrap_or_default()
    }

    pub fn num_cached_query_types(&self) -> usize {
        self.memo.num_query_types()
    }

    fn metrics_for<Q: Query>(&self) -> Arc<QueryMetrics> {
        self.metrics
            .entry(Q::name())
            .or_insert_with(|| Arc::new(QueryMetrics::new(Q::name())))
            .value()
            .clone()
    }

    pub fn query_metrics<Q: Query>(&self) -> Option<MetricsSnapshot> {
        self.metrics.get(Q::name()).map(|m| m.snapshot())
    }

    pub fn metrics(&self) -> MetricsReport {
        let mut queries: Vec<MetricsSnapshot> =
            self.metrics.iter().map(|m| m.value().snapshot()).collect();
        queries.sort_by(|a, b| a.query_name.cmp(b.query_name));
        MetricsReport { queries }
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Db {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Db")
            .field("revision", &self.revision())
            .field("query_types", &self.num_cached_query_types())
            .finish_non_exhaustive()
    }
}

impl QueryDatabase for Db {
    fn query<Q: Query>(&self, key: Q::Key) -> Q::Value {
        Db::query::<Q>(self, key)
    }

    fn revision(&self) -> Revision {
        Db::revision(self)
    }
}
