//! Bounded TTL cache from normalized query to a finished search response.
//!
//! Eviction is a linear scan for the least recently touched entry, which is
//! fine for a few hundred entries.

use crate::config::{CacheConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_MS};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expire_at: Instant,
    touched_at: Instant,
    /// Breaks ties between entries touched at the same instant.
    touch_seq: u64,
}

#[derive(Debug)]
pub struct ResultCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    capacity: usize,
    ttl: Duration,
    seq: u64,
}

impl<V> Default for ResultCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            capacity: DEFAULT_CACHE_CAPACITY,
            ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            seq: 0,
        }
    }
}

impl<V: Clone> ResultCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        let mut cache = Self::default();
        cache.configure(config);
        cache
    }

    pub fn configure(&mut self, config: CacheConfig) {
        if let Some(capacity) = config.capacity() {
            self.capacity = capacity;
        }
        if let Some(ttl_ms) = config.ttl_ms() {
            self.ttl = Duration::from_millis(ttl_ms);
        }
    }

    pub fn capacity(&self) -> usize { self.capacity }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&mut self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<V> {
        let expired = self.entries.get(key)?.expire_at < now;
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.seq += 1;
        let entry = self.entries.get_mut(key)?;
        entry.touched_at = now;
        entry.touch_seq = self.seq;
        Some(entry.value.clone())
    }

    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.set_at(key, value, Instant::now());
    }

    pub fn set_at(&mut self, key: impl Into<String>, value: V, now: Instant) {
        self.seq += 1;
        let entry = CacheEntry { value, expire_at: now + self.ttl, touched_at: now, touch_seq: self.seq };
        self.entries.insert(key.into(), entry);
        if self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| (e.touched_at, e.touch_seq))
                .map(|(k, _)| k.clone());
            if let Some(k) = oldest {
                self.entries.remove(&k);
            }
        }
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c: ResultCache<u32> = ResultCache::new(CacheConfig::default());
        assert_eq!(c.capacity(), 200);
        assert_eq!(c.ttl(), Duration::from_secs(30));
    }

    #[test]
    fn invalid_config_keeps_previous() {
        let mut c: ResultCache<u32> = ResultCache::new(CacheConfig::new(5, 1000));
        c.configure(CacheConfig::new(-1, 0));
        assert_eq!(c.capacity(), 5);
        assert_eq!(c.ttl(), Duration::from_millis(1000));
    }

    #[test]
    fn evicts_exactly_the_least_recently_touched() {
        let mut c = ResultCache::new(CacheConfig::new(2, 60_000));
        let t0 = Instant::now();
        c.set_at("a", 1, t0);
        c.set_at("b", 2, t0 + Duration::from_millis(1));
        // reading `a` makes `b` the oldest
        assert_eq!(c.get_at("a", t0 + Duration::from_millis(2)), Some(1));
        c.set_at("c", 3, t0 + Duration::from_millis(3));
        assert_eq!(c.len(), 2);
        assert_eq!(c.get_at("b", t0 + Duration::from_millis(4)), None);
        assert_eq!(c.get_at("a", t0 + Duration::from_millis(4)), Some(1));
        assert_eq!(c.get_at("c", t0 + Duration::from_millis(4)), Some(3));
    }

    #[test]
    fn same_instant_evicts_first_inserted() {
        let mut c = ResultCache::new(CacheConfig::new(2, 60_000));
        let t0 = Instant::now();
        c.set_at("x", 1, t0);
        c.set_at("y", 2, t0);
        c.set_at("z", 3, t0);
        assert_eq!(c.get_at("x", t0), None);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn expired_entries_miss_and_are_removed() {
        let mut c = ResultCache::new(CacheConfig::new(10, 100));
        let t0 = Instant::now();
        c.set_at("q", "payload", t0);
        assert_eq!(c.get_at("q", t0 + Duration::from_millis(100)), Some("payload"));
        assert_eq!(c.get_at("q", t0 + Duration::from_millis(101)), None);
        assert!(c.is_empty());
        assert_eq!(c.get_at("q", t0 + Duration::from_millis(102)), None);
    }

    #[test]
    fn overwrite_refreshes_expiry() {
        let mut c = ResultCache::new(CacheConfig::new(10, 100));
        let t0 = Instant::now();
        c.set_at("q", 1, t0);
        c.set_at("q", 2, t0 + Duration::from_millis(80));
        assert_eq!(c.get_at("q", t0 + Duration::from_millis(150)), Some(2));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn invalidate_all_clears() {
        let mut c = ResultCache::new(CacheConfig::default());
        c.set("a", 1);
        c.set("b", 2);
        c.invalidate_all();
        assert!(c.is_empty());
        assert_eq!(c.get("a"), None);
    }
}
