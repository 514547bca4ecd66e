//! Event surface and control handle for a download run.

use crate::error::DownloadError;
use crate::item::{DownloadItem, ProgressStats};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Events emitted while the pool runs.
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// A worker picked the item up.
    Started {
        /// Item id.
        id: usize,
        /// Package name.
        name: String,
    },
    /// Periodic progress, at most once per configured interval.
    Progress {
        /// Item id.
        id: usize,
        /// Progress numbers.
        stats: ProgressStats,
    },
    /// The item downloaded and verified.
    Completed {
        /// Item id.
        id: usize,
    },
    /// The item failed terminally.
    Failed {
        /// Item id.
        id: usize,
        /// Error message.
        error: String,
    },
    /// The item was skipped.
    Skipped {
        /// Item id.
        id: usize,
    },
}

/// Callback receiving [`DownloadEvent`]s.
pub type EventCallback = Arc<dyn Fn(DownloadEvent) + Send + Sync>;

/// Decision requested from the caller when an item exhausts its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDecision {
    /// Reset the retry counter and try again.
    Retry,
    /// Mark the item skipped and move on.
    Skip,
    /// Drain the whole pool.
    Cancel,
}

/// Callback consulted on exhausted retries. Without one, items are
/// skipped.
pub type ItemErrorCallback =
    Arc<dyn Fn(&DownloadItem, &DownloadError) -> ErrorDecision + Send + Sync>;

/// Cloneable pause/resume/cancel handle for a download run.
///
/// Pause is cooperative: workers finish writing their current chunk, then
/// await resumption on the flag. No polling interval is involved.
#[derive(Debug, Clone)]
pub struct DownloadControl {
    pause: Arc<watch::Sender<bool>>,
    cancel: CancellationToken,
}

impl DownloadControl {
    /// Create a control handle in the running state.
    #[must_use]
    pub fn new() -> Self {
        let (pause, _) = watch::channel(false);
        Self {
            pause: Arc::new(pause),
            cancel: CancellationToken::new(),
        }
    }

    /// Pause the pool.
    pub fn pause(&self) {
        let _ = self.pause.send(true);
    }

    /// Resume the pool.
    pub fn resume(&self) {
        let _ = self.pause.send(false);
    }

    /// Whether the pool is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.pause.borrow()
    }

    /// Cancel the run: clears the queue, aborts in-flight bodies, deletes
    /// partial files, and returns the partial result promptly.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn pause_rx(&self) -> watch::Receiver<bool> {
        self.pause.subscribe()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Default for DownloadControl {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_flags() {
        let control = DownloadControl::new();
        assert!(!control.is_paused());
        assert!(!control.is_cancelled());

        control.pause();
        assert!(control.is_paused());
        control.resume();
        assert!(!control.is_paused());

        control.cancel();
        assert!(control.is_cancelled());
    }

    #[tokio::test]
    async fn pause_flag_wakes_waiters() {
        let control = DownloadControl::new();
        control.pause();

        let mut rx = control.pause_rx();
        let waiter = tokio::spawn(async move {
            rx.wait_for(|paused| !*paused).await.is_ok()
        });

        control.resume();
        assert!(waiter.await.unwrap());
    }
}
