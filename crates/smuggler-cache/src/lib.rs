//! Metadata cache for repository artefacts.
//!
//! Parsed-metadata inputs (`repomd.xml`, `Packages.gz`, `APKINDEX.tar.gz`,
//! ...) are cached keyed by `(family, repo URL, architecture, artefact)`.
//! The memory tier is an LRU bounded by total entry size with TTL-based
//! expiry on read; the optional persistent tier mirrors entries to one JSON
//! file each and is swept and rehydrated on startup.
//!
//! Access is mediated by a mutex with short critical sections: a reader
//! racing a writer sees the old entry or the new one, never a torn value.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod disk;
mod key;
mod stats;

pub use config::{default_cache_dir, CacheConfig, CacheConfigBuilder, CacheMode};
pub use disk::DiskTier;
pub use key::{ArtefactKind, CacheEntry, CacheKey};
pub use stats::{CacheStats, CacheStatsSnapshot};

use bytes::Bytes;
use parking_lot::Mutex;
use smuggler_core::{AHashMap, Result};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct CacheInner {
    entries: AHashMap<CacheKey, CacheEntry>,
    total_size: u64,
}

/// The metadata cache.
#[derive(Debug)]
pub struct MetadataCache {
    inner: Mutex<CacheInner>,
    stats: CacheStats,
    disk: Option<DiskTier>,
    config: CacheConfig,
}

impl MetadataCache {
    /// Create a cache. In persistent mode the on-disk tier is opened,
    /// swept of expired files, and rehydrated into memory.
    pub fn new(config: CacheConfig) -> Result<Self> {
        let disk = match config.mode {
            CacheMode::Persistent => Some(DiskTier::open(&config.dir)?),
            CacheMode::Session | CacheMode::Disabled => None,
        };

        let mut inner = CacheInner::default();
        if let Some(tier) = &disk {
            let live = tier.load_all(config.ttl);
            if !live.is_empty() {
                info!(entries = live.len(), "rehydrated metadata cache");
            }
            for (key, entry) in live {
                inner.total_size += entry.size;
                inner.entries.insert(key, entry);
            }
        }

        Ok(Self {
            inner: Mutex::new(inner),
            stats: CacheStats::default(),
            disk,
            config,
        })
    }

    /// Create a session-mode cache with default limits. Performs no I/O.
    #[must_use]
    pub fn session() -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            stats: CacheStats::default(),
            disk: None,
            config: CacheConfig::default(),
        }
    }

    /// Look up an artefact. Returns `None` when the cache is disabled, the
    /// key is absent, or the entry is older than the TTL (in which case it
    /// is dropped).
    pub fn get(&self, key: &CacheKey) -> Option<Bytes> {
        if self.config.mode == CacheMode::Disabled {
            self.stats.record_miss();
            return None;
        }

        let mut inner = self.inner.lock();
        let expired = match inner.entries.get(key) {
            None => {
                drop(inner);
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(self.config.ttl),
        };

        if expired {
            if let Some(old) = inner.entries.remove(key) {
                inner.total_size -= old.size;
            }
            drop(inner);
            if let Some(tier) = &self.disk {
                tier.remove(key);
            }
            self.stats.record_miss();
            debug!(key = %key, "cache entry expired");
            return None;
        }

        let data = inner.entries.get_mut(key).map(|entry| {
            entry.last_access = chrono::Utc::now();
            Bytes::from(entry.data.clone())
        });
        drop(inner);
        self.stats.record_hit();
        data
    }

    /// Store an artefact, evicting least-recently-used entries first so the
    /// summed size stays within `max_size`.
    pub fn set(&self, key: CacheKey, data: impl Into<Vec<u8>>) {
        if self.config.mode == CacheMode::Disabled {
            return;
        }

        let entry = CacheEntry::new(data.into());
        if entry.size > self.config.max_size {
            debug!(key = %key, size = entry.size, "entry larger than cache, not stored");
            return;
        }

        let mut evicted = Vec::new();
        {
            let mut inner = self.inner.lock();

            // replace-in-place must not double count
            if let Some(old) = inner.entries.remove(&key) {
                inner.total_size -= old.size;
            }

            while inner.total_size + entry.size > self.config.max_size {
                let Some(oldest) = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_access)
                    .map(|(k, _)| k.clone())
                else {
                    break;
                };
                if let Some(old) = inner.entries.remove(&oldest) {
                    inner.total_size -= old.size;
                }
                evicted.push(oldest);
            }

            inner.total_size += entry.size;
            inner.entries.insert(key.clone(), entry.clone());
        }

        if let Some(tier) = &self.disk {
            for old in &evicted {
                tier.remove(old);
            }
            tier.store(&key, &entry);
        }
        if !evicted.is_empty() {
            debug!(count = evicted.len(), "evicted cache entries");
        }
    }

    /// Drop every entry (memory and disk).
    pub fn clear(&self) {
        let keys: Vec<CacheKey> = {
            let mut inner = self.inner.lock();
            inner.total_size = 0;
            inner.entries.drain().map(|(k, _)| k).collect()
        };
        if let Some(tier) = &self.disk {
            for key in &keys {
                tier.remove(key);
            }
        }
    }

    /// Point-in-time statistics.
    pub fn stats(&self) -> CacheStatsSnapshot {
        let inner = self.inner.lock();
        self.stats.snapshot(inner.entries.len(), inner.total_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smuggler_core::{Architecture, PackageFamily};
    use std::time::Duration;

    fn key(repo: &str, artefact: ArtefactKind) -> CacheKey {
        CacheKey::new(PackageFamily::Yum, repo, Architecture::X86_64, artefact)
    }

    #[test]
    fn get_set_round_trip() {
        let cache = MetadataCache::session();
        let k = key("https://mirror/baseos", ArtefactKind::Repomd);

        assert!(cache.get(&k).is_none());
        cache.set(k.clone(), b"<repomd/>".to_vec());
        assert_eq!(cache.get(&k).unwrap(), Bytes::from_static(b"<repomd/>"));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn size_bound_holds_after_every_set() {
        let config = CacheConfig::builder().max_size(100).build();
        let cache = MetadataCache::new(config).unwrap();

        for i in 0..20 {
            let k = key(&format!("https://mirror/{i}"), ArtefactKind::Primary);
            cache.set(k, vec![0u8; 40]);
            assert!(cache.stats().total_size <= 100);
        }
        assert_eq!(cache.stats().entry_count, 2);
    }

    #[test]
    fn replacing_entry_does_not_double_count() {
        let cache = MetadataCache::session();
        let k = key("https://mirror/baseos", ArtefactKind::Repomd);
        cache.set(k.clone(), vec![0u8; 50]);
        cache.set(k, vec![0u8; 70]);
        assert_eq!(cache.stats().total_size, 70);
        assert_eq!(cache.stats().entry_count, 1);
    }

    #[test]
    fn disabled_mode_never_stores() {
        let config = CacheConfig::builder().mode(CacheMode::Disabled).build();
        let cache = MetadataCache::new(config).unwrap();
        let k = key("https://mirror/baseos", ArtefactKind::Repomd);
        cache.set(k.clone(), b"data".to_vec());
        assert!(cache.get(&k).is_none());
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn expired_entries_read_as_absent() {
        let config = CacheConfig::builder().ttl(Duration::from_secs(0)).build();
        let cache = MetadataCache::new(config).unwrap();
        let k = key("https://mirror/baseos", ArtefactKind::Repomd);
        cache.set(k.clone(), b"data".to_vec());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&k).is_none());
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[test]
    fn persistent_tier_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = || {
            CacheConfig::builder()
                .mode(CacheMode::Persistent)
                .dir(dir.path())
                .build()
        };

        let k = key("https://mirror/baseos", ArtefactKind::Primary);
        {
            let cache = MetadataCache::new(config()).unwrap();
            cache.set(k.clone(), b"<metadata/>".to_vec());
        }

        let cache = MetadataCache::new(config()).unwrap();
        assert_eq!(cache.get(&k).unwrap(), Bytes::from_static(b"<metadata/>"));
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let config = CacheConfig::builder().max_size(100).build();
        let cache = MetadataCache::new(config).unwrap();
        let a = key("https://mirror/a", ArtefactKind::Primary);
        let b = key("https://mirror/b", ArtefactKind::Primary);

        cache.set(a.clone(), vec![0u8; 40]);
        std::thread::sleep(Duration::from_millis(5));
        cache.set(b.clone(), vec![0u8; 40]);
        std::thread::sleep(Duration::from_millis(5));
        let _ = cache.get(&a); // a is now fresher than b

        cache.set(
            key("https://mirror/c", ArtefactKind::Primary),
            vec![0u8; 40],
        );
        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
    }
}
