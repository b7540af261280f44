//! Keyed cache with time-to-live eviction, owned by the synchronizer.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Return a fresh entry. Expired entries are evicted on access.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => {
                return Some(value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn set(&mut self, key: K, value: V) {
        self.entries.insert(key, (Instant::now(), value));
    }

    /// Drop an entry. Returns whether one was present.
    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let mut cache = TtlCache::new(Duration::from_secs(30));
        cache.set("view", 7);

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.get(&"view"), Some(7));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&"view"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_drops_entry() {
        let mut cache = TtlCache::new(Duration::from_secs(30));
        cache.set("view", 1);
        assert!(cache.invalidate(&"view"));
        assert!(!cache.invalidate(&"view"));
        assert_eq!(cache.get(&"view"), None);
    }
}
