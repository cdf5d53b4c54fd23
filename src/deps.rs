//! Explicit engine dependencies. Everything the engine consumes is threaded
//! through [EngineDeps] at construction; there are no implicit globals.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;

use crate::cache::{CompositionCache, MemoCache};
use crate::repo::RelicRepository;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for TTL tests.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn at_epoch() -> Self {
        Self::new(Utc.timestamp_opt(0, 0).single().unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Clone)]
pub struct EngineDeps {
    pub repo: Arc<dyn RelicRepository>,
    pub cache: Arc<dyn CompositionCache>,
    pub clock: Arc<dyn Clock>,
}

impl EngineDeps {
    /// Standard wiring: system clock and a fresh in-memory cache sharing it.
    pub fn new(repo: Arc<dyn RelicRepository>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache: Arc<dyn CompositionCache> = Arc::new(MemoCache::new(clock.clone()));
        Self { repo, cache, clock }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CompositionCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
