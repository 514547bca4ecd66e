//! Cache configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Where cached metadata lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Memory only; gone when the process exits.
    #[default]
    Session,
    /// Memory plus a JSON-file tier that survives restarts.
    Persistent,
    /// No caching; every get misses, every set is dropped.
    Disabled,
}

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Session, persistent, or disabled.
    pub mode: CacheMode,
    /// Entries older than this are treated as absent on read.
    pub ttl: Duration,
    /// Eviction threshold over the summed entry sizes, in bytes.
    pub max_size: u64,
    /// Directory for the persistent tier.
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            mode: CacheMode::Session,
            ttl: Duration::from_secs(3600),
            max_size: 500 * 1024 * 1024,
            dir: default_cache_dir(),
        }
    }
}

impl CacheConfig {
    /// Create a config builder.
    #[must_use]
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }
}

/// Default persistent-tier directory: `~/.depssmuggler/cache/os-packages`.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".depssmuggler")
        .join("cache")
        .join("os-packages")
}

/// Builder for [`CacheConfig`].
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Set the cache mode.
    #[must_use]
    pub const fn mode(mut self, mode: CacheMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the freshness cutoff.
    #[must_use]
    pub const fn ttl(mut self, ttl: Duration) -> Self {
        self.config.ttl = ttl;
        self
    }

    /// Set the eviction threshold in bytes.
    #[must_use]
    pub const fn max_size(mut self, max_size: u64) -> Self {
        self.config.max_size = max_size;
        self
    }

    /// Set the persistent-tier directory.
    #[must_use]
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dir = dir.into();
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> CacheConfig {
        self.config
    }
}
