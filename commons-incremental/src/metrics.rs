//! Per-query counters
//!
//! Every query type gets one [`QueryMetrics`], keyed by its name. Counters
//! are relaxed atomics; a [`MetricsSnapshot`] freezes them for reporting.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters for a single query type
#[derive(Debug)]
pub struct QueryMetrics {
    name: &'static str,
    hits: AtomicU64,
    executions: AtomicU64,
    early_cutoffs: AtomicU64,
    compute_ns: AtomicU64,
}

impl QueryMetrics {
    pub fn new(name: &'static str) -> Self {
        QueryMetrics {
            name,
            hits: AtomicU64::new(0),
            executions: AtomicU64::new(0),
            early_cutoffs: AtomicU64::new(0),
            compute_ns: AtomicU64::new(0),
        }
    }

    /// A read served from the memo table
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A read that had to run the query
    pub fn record_execution(&self, elapsed: Duration) {
        self.executions.fetch_add(1, Ordering::Relaxed);
        self.compute_ns
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    /// A re-execution whose value hashed the same as before
    pub fn record_early_cutoff(&self) {
        self.early_cutoffs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            query_name: self.name,
            hits: self.hits.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            early_cutoffs: self.early_cutoffs.load(Ordering::Relaxed),
            compute_time: Duration::from_nanos(self.compute_ns.load(Ordering::Relaxed)),
        }
    }
}

/// Frozen counters for one query type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub query_name: &'static str,
    pub hits: u64,
    /// Every execution is a miss
    pub executions: u64,
    pub early_cutoffs: u64,
    pub compute_time: Duration,
}

impl MetricsSnapshot {
    pub fn reads(&self) -> u64 {
        self.hits + self.executions
    }

    /// Fraction of reads served from cache, 0.0 when never read
    pub fn hit_rate(&self) -> f64 {
        match self.reads() {
            0 => 0.0,
            reads => self.hits as f64 / reads as f64,
        }
    }

    pub fn avg_compute_time(&self) -> Duration {
        match self.executions {
            0 => Duration::ZERO,
            n => self.compute_time / n as u32,
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<28} hits={:<6} runs={:<6} cutoffs={:<6} hit-rate={:>5.1}% avg={:.3}ms",
            self.query_name,
            self.hits,
            self.executions,
            self.early_cutoffs,
            self.hit_rate() * 100.0,
            self.avg_compute_time().as_secs_f64() * 1000.0
        )
    }
}

/// Snapshots for every query type that has been read, sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsReport {
    pub queries: Vec<MetricsSnapshot>,
}

impl MetricsReport {
    pub fn get(&self, query_name: &str) -> Option<&MetricsSnapshot> {
        self.queries.iter().find(|s| s.query_name == query_name)
    }

    pub fn total_executions(&self) -> u64 {
        self.queries.iter().map(|s| s.executions).sum()
    }
}

impl fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for snapshot in &self.queries {
            writeln!(f, "{snapshot}")?;
        }
        Ok(())
    }
}
