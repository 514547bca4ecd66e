//! Top-level configuration surface.

use smuggler_cache::CacheConfig;
use std::time::Duration;

/// What the pipeline emits under the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputKind {
    /// `packages/` plus `metadata.json` (the portable-archive layout;
    /// container creation is left to outer tooling).
    Archive,
    /// The native repository tree for the family.
    #[default]
    Repository,
    /// Both subtrees under the same root.
    Both,
}

/// Aggregated pipeline options.
#[derive(Debug, Clone)]
pub struct SmugglerConfig {
    /// Download worker-pool size.
    pub concurrency: usize,
    /// Per-item retry cap.
    pub max_retries: u32,
    /// Backoff base delay.
    pub base_delay: Duration,
    /// Metadata cache settings.
    pub cache: CacheConfig,
    /// Verify package checksums after download.
    pub verify_checksum: bool,
    /// Follow optional dependencies.
    pub include_optional: bool,
    /// Follow APT `Recommends`.
    pub include_recommends: bool,
    /// Output layout.
    pub output: OutputKind,
}

impl Default for SmugglerConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            cache: CacheConfig::default(),
            verify_checksum: true,
            include_optional: false,
            include_recommends: false,
            output: OutputKind::Repository,
        }
    }
}
