//! Content-addressed memoization of composition results.
//!
//! Keys are a sha256 over the canonical JSON of `{relic_ids sorted, normalized
//! context, engine version}`, so permutations of the same selection share an
//! entry and a version bump orphans every prior entry.

mod key;
mod store;

pub use key::{canonical_json, composition_key};
pub use store::MemoCache;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

pub const DEFAULT_TTL_SECONDS: i64 = 3600;
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;
pub const STATISTICS_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub input_snapshot: Value,
    pub result_snapshot: Value,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub hit_count: u64,
    pub approx_size_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheHitSummary {
    pub key: String,
    pub hit_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatistics {
    pub entries: usize,
    pub expired_entries: usize,
    pub total_hits: u64,
    pub average_hits: f64,
    pub top_entries: Vec<CacheHitSummary>,
    pub approx_size_bytes: usize,
}

/// Cache capability the engine consumes. `lookup` increments the hit counter
/// in the same critical section that reads the entry; expired entries are
/// treated as absent until cleanup removes them.
pub trait CompositionCache: Send + Sync {
    fn lookup(&self, key: &str) -> Option<CacheEntry>;

    fn store(
        &self,
        key: &str,
        input_snapshot: Value,
        result_snapshot: Value,
        engine_version: &str,
        ttl: Duration,
    ) -> Result<(), EngineError>;

    fn delete_all(&self) -> usize;

    fn cleanup_expired(&self) -> usize;

    fn trim_to_size(&self, max_entries: usize) -> usize;

    fn statistics(&self) -> CacheStatistics;
}
