// Response cache: one JSON payload per request key, each with its own TTL.
// Sits between the API client and the backend so identical queries inside
// the TTL window never reach the network.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::config::{DEFAULT_CACHE_TTL_MS, DEFAULT_MAX_CACHE_ENTRIES};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            max_entries: DEFAULT_MAX_CACHE_ENTRIES,
        }
    }
}

// Stored entries are replaced wholesale, never mutated in place
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Value,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stored_at)
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.age_at(now) >= self.ttl
    }
}

// Read-only snapshot for one key, computed on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub exists: bool,
    pub expired: bool,
    pub count: usize,
    pub age: Duration,
    pub remaining: Duration,
}

impl CacheStats {
    pub fn empty() -> Self {
        Self::default()
    }

    fn for_entry(entry: &CacheEntry, count: usize, now: Instant) -> Self {
        let age = entry.age_at(now);
        Self {
            exists: true,
            expired: entry.is_expired_at(now),
            count,
            age,
            remaining: entry.ttl.saturating_sub(age),
        }
    }
}

pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    config: CacheConfig,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    // Fresh payload for `key`, if any. Expired entries stay in place so their
    // stats remain observable until the next successful store replaces them.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        let entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => Some(entry.payload.clone()),
            Some(entry) => {
                debug!(key, age_ms = entry.age_at(now).as_millis() as u64, "cache entry expired");
                None
            }
            None => None,
        }
    }

    pub fn store(&self, key: &str, payload: Value) {
        self.store_with_ttl(key, payload, self.config.default_ttl);
    }

    pub fn store_with_ttl(&self, key: &str, payload: Value, ttl: Duration) {
        self.store_at(key, payload, ttl, Instant::now());
    }

    pub fn store_at(&self, key: &str, payload: Value, ttl: Duration, now: Instant) {
        let mut entries = self.entries.lock();

        if !entries.contains_key(key) && entries.len() >= self.config.max_entries {
            entries.retain(|_, entry| !entry.is_expired_at(now));

            if entries.len() >= self.config.max_entries {
                let oldest_key = entries
                    .values()
                    .min_by_key(|entry| entry.stored_at)
                    .map(|entry| entry.key.clone());

                if let Some(oldest_key) = oldest_key {
                    debug!(evicted = %oldest_key, "cache full, evicting oldest entry");
                    entries.remove(&oldest_key);
                }
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                payload,
                stored_at: now,
                ttl,
            },
        );
    }

    pub fn stats(&self, key: &str) -> CacheStats {
        self.stats_at(key, Instant::now())
    }

    pub fn stats_at(&self, key: &str, now: Instant) -> CacheStats {
        let entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) => CacheStats::for_entry(entry, entries.len(), now),
            None => CacheStats::empty(),
        }
    }

    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        before - entries.len()
    }

    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::thread;

    fn cache_with(ttl_ms: u64, max_entries: usize) -> ResponseCache {
        ResponseCache::new(CacheConfig {
            default_ttl: Duration::from_millis(ttl_ms),
            max_entries,
        })
    }

    #[test]
    fn test_unknown_key_has_empty_stats() {
        let cache = ResponseCache::default();
        cache.store("/other", json!({"ok": true}));

        let stats = cache.stats("/vagas/search");
        assert_eq!(stats, CacheStats::empty());
        assert!(!stats.exists);
        assert!(!stats.expired);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.age, Duration::ZERO);
        assert_eq!(stats.remaining, Duration::ZERO);
    }

    #[test]
    fn test_stats_track_age_and_remaining() {
        let cache = cache_with(1000, 10);
        let t0 = Instant::now();
        cache.store_at("/a", json!(1), Duration::from_millis(1000), t0);
        cache.store_at("/b", json!(2), Duration::from_millis(1000), t0);

        let stats = cache.stats_at("/a", t0 + Duration::from_millis(400));
        assert!(stats.exists);
        assert!(!stats.expired);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.age, Duration::from_millis(400));
        assert_eq!(stats.remaining, Duration::from_millis(600));
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let cache = cache_with(1000, 10);
        let t0 = Instant::now();
        cache.store_at("/a", json!(1), Duration::from_millis(1000), t0);

        let just_before = t0 + Duration::from_millis(999);
        assert!(!cache.stats_at("/a", just_before).expired);
        assert!(cache.get_at("/a", just_before).is_some());

        let at_ttl = t0 + Duration::from_millis(1000);
        let stats = cache.stats_at("/a", at_ttl);
        assert!(stats.exists);
        assert!(stats.expired);
        assert_eq!(stats.remaining, Duration::ZERO);
        assert!(cache.get_at("/a", at_ttl).is_none());

        let long_after = t0 + Duration::from_secs(60);
        assert_eq!(cache.stats_at("/a", long_after).remaining, Duration::ZERO);
    }

    #[test]
    fn test_store_replaces_existing_entry() {
        let cache = cache_with(1000, 10);
        let t0 = Instant::now();
        cache.store_at("/a", json!("old"), Duration::from_millis(1000), t0);

        let t1 = t0 + Duration::from_millis(2000);
        assert!(cache.get_at("/a", t1).is_none());

        cache.store_at("/a", json!("new"), Duration::from_millis(1000), t1);
        assert_eq!(cache.get_at("/a", t1), Some(json!("new")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.entry("/a").unwrap().stored_at, t1);
    }

    #[test]
    fn test_full_cache_evicts_oldest_entry() {
        let cache = cache_with(60_000, 3);
        let t0 = Instant::now();
        for (i, key) in ["/a", "/b", "/c"].iter().enumerate() {
            cache.store_at(key, json!(i), Duration::from_secs(60), t0 + Duration::from_millis(i as u64));
        }

        cache.store_at("/d", json!(3), Duration::from_secs(60), t0 + Duration::from_millis(10));

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.keys(), vec!["/b", "/c", "/d"]);
    }

    #[test]
    fn test_full_cache_prefers_dropping_expired_entries() {
        let cache = cache_with(60_000, 3);
        let t0 = Instant::now();
        cache.store_at("/a", json!(1), Duration::from_secs(60), t0);
        cache.store_at("/short1", json!(2), Duration::from_millis(5), t0 + Duration::from_millis(1));
        cache.store_at("/short2", json!(3), Duration::from_millis(5), t0 + Duration::from_millis(2));

        cache.store_at("/d", json!(4), Duration::from_secs(60), t0 + Duration::from_millis(100));

        assert_eq!(cache.keys(), vec!["/a", "/d"]);
    }

    #[test]
    fn test_replacing_key_in_full_cache_evicts_nothing() {
        let cache = cache_with(60_000, 2);
        cache.store("/a", json!(1));
        cache.store("/b", json!(2));
        cache.store("/a", json!(3));

        assert_eq!(cache.keys(), vec!["/a", "/b"]);
        assert_eq!(cache.get("/a"), Some(json!(3)));
    }

    #[test]
    fn test_remove_purge_and_clear() {
        let cache = cache_with(60_000, 10);
        let t0 = Instant::now();
        cache.store("/keep", json!(1));
        cache.store_at("/stale", json!(2), Duration::from_millis(1), t0 - Duration::from_millis(50));
        cache.store("/drop", json!(3));

        assert!(cache.remove("/drop"));
        assert!(!cache.remove("/drop"));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.keys(), vec!["/keep"]);
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_store_and_get() {
        let cache = Arc::new(cache_with(60_000, 50));
        let mut handles = vec![];

        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for j in 0..200 {
                    let key = format!("/vagas/search?hotel={}", (i * 200 + j) % 80);
                    if j % 3 == 0 {
                        cache.store(&key, json!({ "thread": i, "op": j }));
                    } else {
                        let _ = cache.get(&key);
                        let _ = cache.stats(&key);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(cache.len() <= 50);
    }
}
