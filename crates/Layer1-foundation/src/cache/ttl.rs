//! Keyed TTL store
//!
//! No capacity bound and no LRU tracking: growth is bounded only by the
//! sweep cadence of the owning process.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A keyed store where every entry expires after a fixed TTL.
///
/// A `get` on an absent key and a `get` on an expired key are the same
/// miss signal; callers recompute and `put`.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: HashMap<K, TtlEntry<V>>,
    ttl: Duration,
}

#[derive(Debug)]
struct TtlEntry<V> {
    value: V,
    written_at: Instant,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// Create a store whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a fresh value, or a miss. An entry observed past its TTL is
    /// dropped on the spot.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let fresh = match self.entries.get(key) {
            Some(entry) => entry.written_at.elapsed() <= self.ttl,
            None => return None,
        };

        if fresh {
            self.entries.get(key).map(|e| e.value.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    /// Insert or overwrite unconditionally, refreshing the timestamp.
    pub fn put(&mut self, key: K, value: V) {
        self.entries.insert(
            key,
            TtlEntry {
                value,
                written_at: Instant::now(),
            },
        );
    }

    /// Remove every entry past its TTL and return how many were dropped.
    pub fn sweep(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, e| e.written_at.elapsed() <= ttl);
        before - self.entries.len()
    }

    /// Number of entries, expired-but-unswept included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_put_get() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.put("a", 1);
        assert_eq!(cache.get(&"a"), Some(1));
        assert_eq!(cache.get(&"b"), None);
    }

    #[test]
    fn test_overwrite() {
        let mut cache = TtlCache::new(Duration::from_secs(60));
        cache.put("a", 1);
        cache.put("a", 2);
        assert_eq!(cache.get(&"a"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let mut cache = TtlCache::new(Duration::from_millis(10));
        cache.put("a", 1);
        sleep(Duration::from_millis(25));
        assert_eq!(cache.get(&"a"), None);
        // Removed on observation
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_sweep_counts_removed() {
        let mut cache = TtlCache::new(Duration::from_millis(10));
        cache.put("a", 1);
        cache.put("b", 2);
        sleep(Duration::from_millis(25));
        cache.put("c", 3);
        assert_eq!(cache.sweep(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_overwrite_refreshes_timestamp() {
        let mut cache = TtlCache::new(Duration::from_millis(40));
        cache.put("a", 1);
        sleep(Duration::from_millis(25));
        cache.put("a", 2);
        sleep(Duration::from_millis(25));
        // 50ms since first write, 25ms since overwrite: still fresh
        assert_eq!(cache.get(&"a"), Some(2));
    }
}
