//! Time-boxed key/value cache.
//!
//! Entries remember when they were written. A read through [`TtlCache::get_fresh`]
//! only succeeds while the entry is younger than the cache's TTL; [`TtlCache::get`]
//! returns the last known value regardless of age.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub value: V,
    pub written_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, CacheEntry<V>>,
}

impl<K: Eq + Hash, V> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Last known value, fresh or not.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn get_fresh(&self, key: &K, now: DateTime<Utc>) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|e| now - e.written_at < self.ttl)
            .map(|e| &e.value)
    }

    pub fn is_fresh(&self, key: &K, now: DateTime<Utc>) -> bool {
        self.get_fresh(key, now).is_some()
    }

    pub fn put(&mut self, key: K, value: V, now: DateTime<Utc>) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                written_at: now,
            },
        );
    }

    /// Rewrites an existing value in place and restarts its TTL.
    /// Returns false when the key is unknown.
    pub fn update(&mut self, key: &K, now: DateTime<Utc>, f: impl FnOnce(&mut V)) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                f(&mut entry.value);
                entry.written_at = now;
                true
            }
            None => false,
        }
    }

    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|e| e.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        "2024-03-01T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_fresh_within_ttl() {
        let mut cache = TtlCache::new(Duration::seconds(60));
        cache.put("p1", 3u64, t0());

        assert_eq!(cache.get_fresh(&"p1", t0() + Duration::seconds(59)), Some(&3));
        assert_eq!(cache.get_fresh(&"p1", t0() + Duration::seconds(60)), None);
        // Stale values stay readable.
        assert_eq!(cache.get(&"p1"), Some(&3));
    }

    #[test]
    fn test_update_restarts_ttl() {
        let mut cache = TtlCache::new(Duration::seconds(60));
        cache.put("p1", 3u64, t0());

        let later = t0() + Duration::seconds(50);
        assert!(cache.update(&"p1", later, |v| *v += 1));
        assert_eq!(cache.get_fresh(&"p1", later + Duration::seconds(30)), Some(&4));
        assert!(!cache.update(&"missing", later, |v| *v += 1));
    }

    #[test]
    fn test_invalidate_and_clear() {
        let mut cache = TtlCache::new(Duration::seconds(60));
        cache.put("a", true, t0());
        cache.put("b", false, t0());

        assert_eq!(cache.invalidate(&"a"), Some(true));
        assert!(!cache.is_fresh(&"a", t0()));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
