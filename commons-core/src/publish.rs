//! Result subscribers.

use commons_incremental::SearchResults;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Callback = Arc<dyn Fn(&SearchResults) + Send + Sync>;

/// Registered result callbacks, called in subscription order
#[derive(Default)]
pub struct Subscribers {
    next_id: Mutex<u64>,
    callbacks: Mutex<BTreeMap<SubscriptionId, Callback>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: Callback) -> SubscriptionId {
        let mut next_id = self.next_id.lock();
        let id = SubscriptionId(*next_id);
        *next_id += 1;

        self.callbacks.lock().insert(id, callback);
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.callbacks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.lock().is_empty()
    }

    /// Call every subscriber with `results`
    ///
    /// Callbacks run without the registry lock held, so they may subscribe,
    /// unsubscribe or mutate the search themselves.
    pub fn publish(&self, results: &SearchResults) {
        let callbacks: Vec<Callback> = self.callbacks.lock().values().cloned().collect();
        tracing::debug!(
            subscribers = callbacks.len(),
            commons = results.commons.len(),
            locations = results.locations.len(),
            "publishing results"
        );
        for callback in callbacks {
            callback(results);
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let subscribers = Subscribers::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            subscribers.subscribe(Arc::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            }));
        }

        subscribers.publish(&SearchResults::default());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsubscribe() {
        let subscribers = Subscribers::new();
        let id = subscribers.subscribe(Arc::new(|_| {}));
        let other = subscribers.subscribe(Arc::new(|_| {}));

        assert_ne!(id, other);
        assert!(subscribers.unsubscribe(id));
        assert!(!subscribers.unsubscribe(id));
        assert_eq!(subscribers.len(), 1);
    }
}
