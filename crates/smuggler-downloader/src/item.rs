//! Download items and their lifecycle.

use smuggler_core::Package;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Item lifecycle states.
///
/// Transitions are `Pending -> Downloading -> {Completed, Failed, Skipped,
/// Cancelled}`, plus `Pending -> Cancelled` when the pool is drained. Each
/// item has a single writer: the worker that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Queued, not yet picked up.
    Pending,
    /// A worker is streaming the body.
    Downloading,
    /// Downloaded and verified.
    Completed,
    /// Failed after retries and escalation.
    Failed,
    /// Skipped on user decision or default policy.
    Skipped,
    /// Cancelled before reaching a terminal state.
    Cancelled,
}

impl ItemStatus {
    /// Whether the status is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Downloading)
    }
}

/// Progress numbers reported through the event callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressStats {
    /// Bytes written so far.
    pub downloaded: u64,
    /// Expected total from the package metadata.
    pub total: u64,
    /// Short moving-average transfer speed.
    pub bytes_per_sec: f64,
}

impl ProgressStats {
    /// Completion in percent, clamped to 100.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.downloaded as f64 / self.total as f64 * 100.0).min(100.0)
        }
    }
}

/// One package in a download run.
#[derive(Debug, Clone)]
pub struct DownloadItem {
    /// Position in the request's package list.
    pub id: usize,
    /// The package being downloaded.
    pub pkg: Package,
    /// Lifecycle status.
    pub status: ItemStatus,
    /// Bytes written so far.
    pub bytes: u64,
    /// Retry attempts consumed.
    pub retry_count: u32,
    /// Final file path once completed.
    pub file_path: Option<PathBuf>,
    /// Last error message, for failed or skipped items.
    pub error: Option<String>,
}

impl DownloadItem {
    /// Create a pending item.
    #[must_use]
    pub fn new(id: usize, pkg: Package) -> Self {
        Self {
            id,
            pkg,
            status: ItemStatus::Pending,
            bytes: 0,
            retry_count: 0,
            file_path: None,
            error: None,
        }
    }
}

/// Short moving-average speed meter over a sliding window.
#[derive(Debug)]
pub struct SpeedMeter {
    window: Duration,
    samples: VecDeque<(Instant, u64)>,
    total: u64,
}

impl SpeedMeter {
    /// Create a meter with a 3-second window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(3))
    }

    /// Create a meter with a custom window.
    #[must_use]
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            samples: VecDeque::new(),
            total: 0,
        }
    }

    /// Record a chunk.
    pub fn record(&mut self, bytes: u64) {
        let now = Instant::now();
        self.samples.push_back((now, bytes));
        self.total += bytes;
        self.prune(now);
    }

    /// Current bytes-per-second over the window.
    #[must_use]
    pub fn bytes_per_sec(&mut self) -> f64 {
        self.prune(Instant::now());
        let Some(&(oldest, _)) = self.samples.front() else {
            return 0.0;
        };
        let elapsed = oldest.elapsed().as_secs_f64();
        if elapsed <= f64::EPSILON {
            return 0.0;
        }
        let windowed: u64 = self.samples.iter().map(|&(_, b)| b).sum();
        windowed as f64 / elapsed
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&(t, _)) = self.samples.front() {
            if now.duration_since(t) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for SpeedMeter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_terminality() {
        assert!(!ItemStatus::Pending.is_terminal());
        assert!(!ItemStatus::Downloading.is_terminal());
        assert!(ItemStatus::Completed.is_terminal());
        assert!(ItemStatus::Skipped.is_terminal());
        assert!(ItemStatus::Cancelled.is_terminal());
    }

    #[test]
    fn percent_clamps() {
        let stats = ProgressStats {
            downloaded: 150,
            total: 100,
            bytes_per_sec: 0.0,
        };
        assert!((stats.percent() - 100.0).abs() < f64::EPSILON);

        let empty = ProgressStats {
            downloaded: 0,
            total: 0,
            bytes_per_sec: 0.0,
        };
        assert!((empty.percent() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn speed_meter_reports_positive_rate() {
        let mut meter = SpeedMeter::new();
        meter.record(1000);
        std::thread::sleep(Duration::from_millis(20));
        meter.record(1000);
        assert!(meter.bytes_per_sec() > 0.0);
    }
}
