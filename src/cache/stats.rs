//! Cache Statistics Module
//!
//! Tracks how lookups were answered and how often the cache was rewritten.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of the cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache (including checked-empty entities)
    pub hits: u64,
    /// Lookups the cache could not answer
    pub misses: u64,
    /// Calls made to the field provider or raw attribute store
    pub fallback_fetches: u64,
    /// Entities populated on first read
    pub lazy_fills: u64,
    /// Authoritative refreshes after a bulk save
    pub refreshes: u64,
    /// Single-field patches from external writes
    pub patches: u64,
    /// Entities currently held in-process
    pub cached_entities: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Recorder ==
/// Shared counters updated by the lookup facade and the coherence engine.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    fallback_fetches: AtomicU64,
    lazy_fills: AtomicU64,
    refreshes: AtomicU64,
    patches: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallback_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lazy_fill(&self) {
        self.lazy_fills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_patch(&self) {
        self.patches.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Reads every counter. `cached_entities` comes from the backend.
    pub fn snapshot(&self, cached_entities: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fallback_fetches: self.fallback_fetches.load(Ordering::Relaxed),
            lazy_fills: self.lazy_fills.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            patches: self.patches.load(Ordering::Relaxed),
            cached_entities,
        }
    }
}
