//! LRU cache in front of another provider.
//!
//! Lookups that miss fetch from the delegate and populate the cache while holding a lock
//! for that key only, so concurrent requests for the same id trigger one delegate fetch and
//! requests for other ids are not blocked. Eviction happens under the cache lock and never
//! observes a half-populated entry.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace};

use super::NodeProvider;
use crate::model::Node;
use crate::protocol::node_to_json;

struct Entry {
    nodes: Arc<Vec<Node>>,
    size: usize,
}

struct CacheState {
    entries: LruCache<String, Entry>,
    total_size: usize,
}

/// Caching provider, bounded by entry count and optionally by estimated size.
///
/// Results are deep-cloned on the way out; callers may mutate them freely.
///
/// # Examples
///
/// ```
/// use blue_language::provider::{CachingProvider, NodeProvider};
/// use blue_language::model::Node;
///
/// let cache = CachingProvider::new(|id: &str| vec![Node::new().with_name(id)], 100);
/// assert_eq!(cache.fetch_first("a").unwrap().name.as_deref(), Some("a"));
/// assert_eq!(cache.len(), 1);
/// ```
pub struct CachingProvider<P> {
    delegate: P,
    state: Mutex<CacheState>,
    in_flight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    max_size: Option<usize>,
}

impl<P: NodeProvider> CachingProvider<P> {
    /// Cache at most `capacity` ids (a capacity of zero is treated as one).
    pub fn new(delegate: P, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            delegate,
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                total_size: 0,
            }),
            in_flight: Mutex::new(HashMap::new()),
            max_size: None,
        }
    }

    /// Also bound the cache by the total encoded size of cached documents, in bytes.
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    /// Number of cached ids.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Estimated size of everything cached, in bytes.
    pub fn current_size(&self) -> usize {
        self.state.lock().total_size
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.total_size = 0;
    }

    fn cached(&self, blue_id: &str) -> Option<Arc<Vec<Node>>> {
        self.state
            .lock()
            .entries
            .get(blue_id)
            .map(|entry| Arc::clone(&entry.nodes))
    }

    fn key_lock(&self, blue_id: &str) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock();
        Arc::clone(
            in_flight
                .entry(blue_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Drop the key lock once no other caller holds or waits on it. A lock created after
    /// this one was released is left alone.
    fn release(&self, blue_id: &str, lock: &Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock();
        // One reference in the map, one held by the caller
        let idle = in_flight
            .get(blue_id)
            .is_some_and(|held| Arc::ptr_eq(held, lock) && Arc::strong_count(lock) == 2);
        if idle {
            in_flight.remove(blue_id);
        }
    }

    fn store(&self, blue_id: &str, nodes: Vec<Node>) {
        let size: usize = nodes.iter().map(|n| node_to_json(n).to_string().len()).sum();
        if self.max_size.is_some_and(|max| size > max) {
            debug!(blue_id, size, "document larger than cache budget, not cached");
            return;
        }

        let mut state = self.state.lock();
        let entry = Entry {
            nodes: Arc::new(nodes),
            size,
        };
        if let Some((evicted_id, evicted)) = state.entries.push(blue_id.to_string(), entry) {
            state.total_size -= evicted.size;
            if evicted_id != blue_id {
                trace!(blue_id = %evicted_id, "evicted by capacity");
            }
        }
        state.total_size += size;

        if let Some(max) = self.max_size {
            while state.total_size > max {
                match state.entries.pop_lru() {
                    Some((evicted_id, evicted)) => {
                        state.total_size -= evicted.size;
                        trace!(blue_id = %evicted_id, "evicted by size");
                    }
                    None => break,
                }
            }
        }
    }
}

impl<P: NodeProvider> NodeProvider for CachingProvider<P> {
    fn fetch_by_blue_id(&self, blue_id: &str) -> Vec<Node> {
        if let Some(hit) = self.cached(blue_id) {
            trace!(blue_id, "cache hit");
            return hit.as_ref().clone();
        }

        let lock = self.key_lock(blue_id);
        let guard = lock.lock();

        // Another caller may have populated the entry while we waited
        let result = match self.cached(blue_id) {
            Some(hit) => hit.as_ref().clone(),
            None => {
                trace!(blue_id, "cache miss");
                let nodes = self.delegate.fetch_by_blue_id(blue_id);
                if !nodes.is_empty() {
                    self.store(blue_id, nodes.clone());
                }
                nodes
            }
        };

        drop(guard);
        self.release(blue_id, &lock);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    struct Counting {
        calls: AtomicUsize,
    }

    impl NodeProvider for Counting {
        fn fetch_by_blue_id(&self, blue_id: &str) -> Vec<Node> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if blue_id == "missing" {
                return Vec::new();
            }
            vec![Node::new().with_name(blue_id).with_value(1)]
        }
    }

    fn counting() -> Counting {
        Counting {
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_hit_avoids_delegate() {
        let cache = CachingProvider::new(counting(), 10);
        cache.fetch_by_blue_id("a");
        cache.fetch_by_blue_id("a");
        assert_eq!(cache.delegate.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_misses_not_cached() {
        let cache = CachingProvider::new(counting(), 10);
        assert!(cache.fetch_by_blue_id("missing").is_empty());
        assert!(cache.fetch_by_blue_id("missing").is_empty());
        assert_eq!(cache.delegate.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = CachingProvider::new(counting(), 2);
        cache.fetch_by_blue_id("a");
        cache.fetch_by_blue_id("b");
        cache.fetch_by_blue_id("a");
        cache.fetch_by_blue_id("c");
        assert_eq!(cache.len(), 2);

        cache.fetch_by_blue_id("a");
        assert_eq!(cache.delegate.calls.load(Ordering::SeqCst), 3);
        cache.fetch_by_blue_id("b");
        assert_eq!(cache.delegate.calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_size_budget() {
        let one = node_to_json(&Node::new().with_name("a").with_value(1)).to_string().len();
        let cache = CachingProvider::new(counting(), 100).with_max_size(one);
        cache.fetch_by_blue_id("a");
        cache.fetch_by_blue_id("b");
        assert_eq!(cache.len(), 1);
        assert!(cache.current_size() <= one);
    }

    #[test]
    fn test_returned_nodes_are_owned() {
        let cache = CachingProvider::new(counting(), 10);
        let mut first = cache.fetch_by_blue_id("a");
        first[0].name = Some("mutated".into());
        let second = cache.fetch_by_blue_id("a");
        assert_eq!(second[0].name.as_deref(), Some("a"));
    }

    #[test]
    fn test_release_keeps_lock_of_other_callers() {
        let cache = CachingProvider::new(counting(), 10);

        let first = cache.key_lock("x");
        let waiter = cache.key_lock("x");
        cache.release("x", &first);
        assert!(cache.in_flight.lock().contains_key("x"));

        drop(waiter);
        cache.release("x", &first);
        assert!(!cache.in_flight.lock().contains_key("x"));

        let stale = first;
        let newer = cache.key_lock("x");
        cache.release("x", &stale);
        let in_flight = cache.in_flight.lock();
        assert!(Arc::ptr_eq(in_flight.get("x").unwrap(), &newer));
    }

    #[test]
    fn test_concurrent_fetch_single_delegate_call() {
        let cache = Arc::new(CachingProvider::new(counting(), 10));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.fetch_by_blue_id("shared").len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1);
        }
        assert_eq!(cache.delegate.calls.load(Ordering::SeqCst), 1);
    }
}
