use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use parking_lot::RwLock;
use serde_json::Value;

use crate::cache::{
    CacheEntry, CacheHitSummary, CacheStatistics, CompositionCache, STATISTICS_TOP_N,
};
use crate::deps::Clock;
use crate::error::EngineError;

/// In-memory TTL'd store. A single writer-preferring lock guards the map:
/// lookup-and-increment is one critical section, and administrative clears
/// and trims serialize against stores.
pub struct MemoCache {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CompositionCache for MemoCache {
    fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let entry = entries.get_mut(key)?;
        if entry.expires_at <= now {
            // Expired entries stay until cleanup but are never returned.
            return None;
        }
        entry.hit_count += 1;
        Some(entry.clone())
    }

    fn store(
        &self,
        key: &str,
        input_snapshot: Value,
        result_snapshot: Value,
        engine_version: &str,
        ttl: Duration,
    ) -> Result<(), EngineError> {
        let now = self.clock.now();
        let approx_size_bytes =
            input_snapshot.to_string().len() + result_snapshot.to_string().len();
        let mut entries = self.entries.write();
        // Last writer wins; results are deterministic for a fixed engine
        // version, so only the hit accounting is carried over.
        let prior_hits = entries.get(key).map(|entry| entry.hit_count).unwrap_or(0);
        entries.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                input_snapshot,
                result_snapshot,
                engine_version: engine_version.to_string(),
                created_at: now,
                expires_at: now + ttl,
                hit_count: prior_hits,
                approx_size_bytes,
            },
        );
        Ok(())
    }

    fn delete_all(&self) -> usize {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        removed
    }

    fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    fn trim_to_size(&self, max_entries: usize) -> usize {
        let mut entries = self.entries.write();
        if entries.len() <= max_entries {
            return 0;
        }
        let mut ordered: Vec<(String, chrono::DateTime<chrono::Utc>)> = entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.created_at))
            .collect();
        // Oldest first; key as tie-break keeps eviction deterministic.
        ordered.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        let excess = entries.len() - max_entries;
        for (key, _) in ordered.into_iter().take(excess) {
            entries.remove(&key);
        }
        excess
    }

    fn statistics(&self) -> CacheStatistics {
        let now = self.clock.now();
        let entries = self.entries.read();
        let total_hits: u64 = entries.values().map(|entry| entry.hit_count).sum();
        let expired_entries = entries
            .values()
            .filter(|entry| entry.expires_at <= now)
            .count();
        let approx_size_bytes = entries
            .values()
            .map(|entry| entry.approx_size_bytes)
            .sum();
        let average_hits = if entries.is_empty() {
            0.0
        } else {
            total_hits as f64 / entries.len() as f64
        };

        let mut top_entries: Vec<CacheHitSummary> = entries
            .values()
            .map(|entry| CacheHitSummary {
                key: entry.key.clone(),
                hit_count: entry.hit_count,
            })
            .collect();
        top_entries.sort_by(|a, b| {
            b.hit_count
                .cmp(&a.hit_count)
                .then_with(|| a.key.cmp(&b.key))
        });
        top_entries.truncate(STATISTICS_TOP_N);

        CacheStatistics {
            entries: entries.len(),
            expired_entries,
            total_hits,
            average_hits,
            top_entries,
            approx_size_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deps::FixedClock;
    use serde_json::json;

    fn cache_with_clock() -> (MemoCache, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::at_epoch());
        (MemoCache::new(clock.clone()), clock)
    }

    fn store(cache: &MemoCache, key: &str, ttl_seconds: i64) {
        cache
            .store(
                key,
                json!({"relic_ids": [key]}),
                json!({"total_multiplier": 1.0}),
                "v1",
                Duration::seconds(ttl_seconds),
            )
            .unwrap();
    }

    #[test]
    fn lookup_increments_hits() {
        let (cache, _clock) = cache_with_clock();
        store(&cache, "k1", 60);

        assert_eq!(cache.lookup("k1").unwrap().hit_count, 1);
        assert_eq!(cache.lookup("k1").unwrap().hit_count, 2);
        assert_eq!(cache.statistics().total_hits, 2);
    }

    #[test]
    fn expired_entries_are_absent_until_cleanup() {
        let (cache, clock) = cache_with_clock();
        store(&cache, "k1", 60);
        clock.advance(Duration::seconds(61));

        assert!(cache.lookup("k1").is_none());
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.statistics().expired_entries, 1);
        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn trim_drops_oldest_first() {
        let (cache, clock) = cache_with_clock();
        store(&cache, "old", 3600);
        clock.advance(Duration::seconds(10));
        store(&cache, "mid", 3600);
        clock.advance(Duration::seconds(10));
        store(&cache, "new", 3600);

        assert_eq!(cache.trim_to_size(1), 2);
        assert!(cache.lookup("new").is_some());
        assert!(cache.lookup("old").is_none());
        assert!(cache.lookup("mid").is_none());
    }

    #[test]
    fn overwrite_carries_hit_count() {
        let (cache, _clock) = cache_with_clock();
        store(&cache, "k1", 60);
        cache.lookup("k1");
        store(&cache, "k1", 60);

        let stats = cache.statistics();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.total_hits, 1);
    }
}
