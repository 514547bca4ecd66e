//! Cache statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live statistics, updated with relaxed atomics.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, entry_count: usize, total_size: u64) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count,
            total_size,
        }
    }
}

/// Point-in-time view of cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Reads satisfied from the cache.
    pub hits: u64,
    /// Reads that found nothing, an expired entry, or a disabled cache.
    pub misses: u64,
    /// Live entries.
    pub entry_count: usize,
    /// Summed entry sizes in bytes.
    pub total_size: u64,
}

impl CacheStatsSnapshot {
    /// Hits over total reads, 0.0 when nothing was read yet.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
