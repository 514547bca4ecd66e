//! Download manager configuration.

use std::time::Duration;

/// Download configuration.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Bounded worker-pool size.
    pub concurrency: usize,
    /// Per-item retry cap.
    pub max_retries: u32,
    /// Base delay; attempt `n` sleeps `base_delay * n` before retrying.
    pub base_delay: Duration,
    /// Verify each completed file against its declared checksum.
    pub verify_checksum: bool,
    /// Minimum interval between progress events per item.
    pub progress_interval: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            verify_checksum: true,
            progress_interval: Duration::from_millis(300),
        }
    }
}

impl DownloadConfig {
    /// Create a config builder.
    #[must_use]
    pub fn builder() -> DownloadConfigBuilder {
        DownloadConfigBuilder::default()
    }
}

/// Builder for [`DownloadConfig`].
#[derive(Debug, Default)]
pub struct DownloadConfigBuilder {
    config: DownloadConfig,
}

impl DownloadConfigBuilder {
    /// Set the worker-pool size.
    #[must_use]
    pub const fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    /// Set the per-item retry cap.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Set the backoff base delay.
    #[must_use]
    pub const fn base_delay(mut self, base_delay: Duration) -> Self {
        self.config.base_delay = base_delay;
        self
    }

    /// Enable or disable checksum verification.
    #[must_use]
    pub const fn verify_checksum(mut self, verify: bool) -> Self {
        self.config.verify_checksum = verify;
        self
    }

    /// Set the progress event interval.
    #[must_use]
    pub const fn progress_interval(mut self, interval: Duration) -> Self {
        self.config.progress_interval = interval;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> DownloadConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_contract() {
        let config = DownloadConfig::default();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay, Duration::from_millis(1000));
        assert!(config.verify_checksum);
        assert_eq!(config.progress_interval, Duration::from_millis(300));
    }

    #[test]
    fn builder_overrides() {
        let config = DownloadConfig::builder()
            .concurrency(8)
            .max_retries(5)
            .verify_checksum(false)
            .build();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.max_retries, 5);
        assert!(!config.verify_checksum);
    }
}
