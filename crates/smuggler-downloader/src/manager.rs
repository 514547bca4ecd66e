//! The bounded worker pool.

use crate::checksum::Hasher;
use crate::config::DownloadConfig;
use crate::error::{DownloadError, Result};
use crate::events::{
    DownloadControl, DownloadEvent, ErrorDecision, EventCallback, ItemErrorCallback,
};
use crate::item::{DownloadItem, ItemStatus, ProgressStats, SpeedMeter};
use futures_util::StreamExt;
use parking_lot::Mutex;
use smuggler_core::{AHashMap, Package};
use smuggler_fetch::{FetchError, Fetcher};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};
use url::Url;

/// One download run's inputs.
///
/// `base_urls` maps each package's `repo_id` to its resolved repository
/// base URL; the caller resolves these through the catalog before handing
/// the set over.
pub struct DownloadRequest {
    /// Packages to download (an owned snapshot of the resolution).
    pub packages: Vec<Package>,
    /// Directory the family-named files land in.
    pub output_dir: PathBuf,
    /// Resolved base URL per repository id.
    pub base_urls: AHashMap<String, String>,
    /// Event callback.
    pub on_event: Option<EventCallback>,
    /// Escalation callback for exhausted retries.
    pub on_item_error: Option<ItemErrorCallback>,
    /// Pause/resume/cancel handle.
    pub control: DownloadControl,
}

impl std::fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("packages", &self.packages.len())
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl DownloadRequest {
    /// Create a request with no callbacks and a fresh control handle.
    #[must_use]
    pub fn new(
        packages: Vec<Package>,
        output_dir: impl Into<PathBuf>,
        base_urls: AHashMap<String, String>,
    ) -> Self {
        Self {
            packages,
            output_dir: output_dir.into(),
            base_urls,
            on_event: None,
            on_item_error: None,
            control: DownloadControl::new(),
        }
    }
}

/// Result of a download run.
#[derive(Debug)]
pub struct DownloadOutcome {
    /// Every item with its terminal state.
    pub items: Vec<DownloadItem>,
    /// Whether the run was cancelled.
    pub cancelled: bool,
}

impl DownloadOutcome {
    fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }

    /// Completed item count.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.count(ItemStatus::Completed)
    }

    /// Failed item count.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(ItemStatus::Failed)
    }

    /// Skipped item count.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(ItemStatus::Skipped)
    }
}

/// The download manager: a bounded pool of workers draining a FIFO queue.
#[derive(Debug)]
pub struct DownloadManager {
    fetcher: Fetcher,
    config: DownloadConfig,
}

impl DownloadManager {
    /// Create a manager over a fetcher.
    #[must_use]
    pub fn new(fetcher: Fetcher, config: DownloadConfig) -> Self {
        Self { fetcher, config }
    }

    /// Create a manager with default fetcher and configuration.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(Fetcher::with_defaults()?, DownloadConfig::default()))
    }

    /// Run the pool until every item reaches a terminal state or the run
    /// is cancelled.
    ///
    /// Per-item failures never surface here; they are recorded on the
    /// items. The only errors returned are environmental (output directory
    /// creation).
    pub async fn download(&self, request: DownloadRequest) -> Result<DownloadOutcome> {
        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|e| DownloadError::io(&request.output_dir, e))?;

        let total = request.packages.len();
        let items: Arc<Vec<Mutex<DownloadItem>>> = Arc::new(
            request
                .packages
                .into_iter()
                .enumerate()
                .map(|(id, pkg)| Mutex::new(DownloadItem::new(id, pkg)))
                .collect(),
        );
        let queue: Arc<Mutex<VecDeque<usize>>> = Arc::new(Mutex::new((0..total).collect()));

        info!(items = total, concurrency = self.config.concurrency, "starting downloads");

        let worker = Worker {
            fetcher: self.fetcher.clone(),
            config: self.config.clone(),
            items: Arc::clone(&items),
            queue: Arc::clone(&queue),
            base_urls: Arc::new(request.base_urls),
            output_dir: Arc::new(request.output_dir),
            on_event: request.on_event,
            on_item_error: request.on_item_error,
            control: request.control.clone(),
        };

        let pool_size = self.config.concurrency.clamp(1, total.max(1));
        let mut handles = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            let worker = worker.clone();
            handles.push(tokio::spawn(async move { worker.run().await }));
        }
        for handle in handles {
            let _ = handle.await;
        }

        let cancelled = request.control.is_cancelled();
        if cancelled {
            queue.lock().clear();
            for item in items.iter() {
                let mut item = item.lock();
                if !item.status.is_terminal() {
                    item.status = ItemStatus::Cancelled;
                }
            }
        }

        let items: Vec<DownloadItem> = items.iter().map(|i| i.lock().clone()).collect();
        let outcome = DownloadOutcome { items, cancelled };
        info!(
            completed = outcome.completed(),
            failed = outcome.failed(),
            skipped = outcome.skipped(),
            cancelled,
            "downloads finished"
        );
        Ok(outcome)
    }
}

/// Join a repository base URL with a repo-relative location, resolving any
/// dot segments (APT locations are rebased with `../../`).
fn join_url(base: &str, location: &str) -> Result<Url> {
    let base = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    Ok(Url::parse(&base)?.join(location)?)
}

#[derive(Clone)]
struct Worker {
    fetcher: Fetcher,
    config: DownloadConfig,
    items: Arc<Vec<Mutex<DownloadItem>>>,
    queue: Arc<Mutex<VecDeque<usize>>>,
    base_urls: Arc<AHashMap<String, String>>,
    output_dir: Arc<PathBuf>,
    on_event: Option<EventCallback>,
    on_item_error: Option<ItemErrorCallback>,
    control: DownloadControl,
}

impl Worker {
    fn emit(&self, event: DownloadEvent) {
        if let Some(cb) = &self.on_event {
            cb(event);
        }
    }

    /// Await resumption while the pool is paused. Returns `false` on
    /// cancellation.
    async fn pause_gate(&self) -> bool {
        let mut rx = self.control.pause_rx();
        tokio::select! {
            () = self.control.token().cancelled() => false,
            result = rx.wait_for(|paused| !*paused) => result.is_ok(),
        }
    }

    async fn run(&self) {
        loop {
            if self.control.is_cancelled() {
                break;
            }
            if !self.pause_gate().await {
                break;
            }
            let Some(id) = self.queue.lock().pop_front() else {
                break;
            };
            self.process_item(id).await;
        }
    }

    /// Drive one item to a terminal state. The worker is the item's only
    /// writer for the duration.
    async fn process_item(&self, id: usize) {
        let pkg = {
            let mut item = self.items[id].lock();
            item.status = ItemStatus::Downloading;
            item.pkg.clone()
        };
        self.emit(DownloadEvent::Started {
            id,
            name: pkg.name.clone(),
        });

        let mut attempt: u32 = 0;
        loop {
            match self.try_download(id, &pkg).await {
                Ok(dest) => {
                    let mut item = self.items[id].lock();
                    item.status = ItemStatus::Completed;
                    item.file_path = Some(dest);
                    drop(item);
                    self.emit(DownloadEvent::Completed { id });
                    return;
                }
                Err(DownloadError::Cancelled | DownloadError::Fetch(FetchError::Cancelled)) => {
                    self.items[id].lock().status = ItemStatus::Cancelled;
                    return;
                }
                Err(e) => {
                    if e.is_retryable() && attempt < self.config.max_retries {
                        attempt += 1;
                        self.items[id].lock().retry_count = attempt;
                        let delay = self.config.base_delay * attempt;
                        warn!(package = %pkg.name, attempt, error = %e, "retrying download");
                        tokio::select! {
                            () = self.control.token().cancelled() => {
                                self.items[id].lock().status = ItemStatus::Cancelled;
                                return;
                            }
                            () = tokio::time::sleep(delay) => {}
                        }
                        continue;
                    }

                    match self.escalate(id, &e) {
                        ErrorDecision::Retry => {
                            debug!(package = %pkg.name, "caller requested retry, counter reset");
                            attempt = 0;
                            self.items[id].lock().retry_count = 0;
                            continue;
                        }
                        ErrorDecision::Skip => {
                            let mut item = self.items[id].lock();
                            item.status = ItemStatus::Skipped;
                            item.error = Some(e.to_string());
                            drop(item);
                            self.emit(DownloadEvent::Skipped { id });
                            return;
                        }
                        ErrorDecision::Cancel => {
                            let mut item = self.items[id].lock();
                            item.status = ItemStatus::Failed;
                            item.error = Some(e.to_string());
                            drop(item);
                            error!(package = %pkg.name, error = %e, "download failed, draining pool");
                            self.emit(DownloadEvent::Failed {
                                id,
                                error: e.to_string(),
                            });
                            self.control.cancel();
                            return;
                        }
                    }
                }
            }
        }
    }

    fn escalate(&self, id: usize, error: &DownloadError) -> ErrorDecision {
        match &self.on_item_error {
            Some(cb) => {
                let snapshot = self.items[id].lock().clone();
                cb(&snapshot, error)
            }
            None => ErrorDecision::Skip,
        }
    }

    /// One download attempt: stream to the family-named file, hash along
    /// the way, verify on completion. Any failure removes the partial
    /// file.
    async fn try_download(&self, id: usize, pkg: &Package) -> std::result::Result<PathBuf, DownloadError> {
        let base = self
            .base_urls
            .get(&pkg.repo_id)
            .ok_or_else(|| DownloadError::UnknownRepository {
                repo_id: pkg.repo_id.clone(),
            })?;
        let url = join_url(base, &pkg.location)?;
        let dest = self.output_dir.join(pkg.filename());

        self.items[id].lock().bytes = 0;

        let response = tokio::select! {
            () = self.control.token().cancelled() => return Err(DownloadError::Cancelled),
            response = self.fetcher.get_once(url.as_str()) => response?,
        };

        let mut file = tokio::fs::File::create(&dest)
            .await
            .map_err(|e| DownloadError::io(&dest, e))?;
        let mut stream = response.bytes_stream();
        let mut hasher = self
            .config
            .verify_checksum
            .then(|| Hasher::new(pkg.checksum.algo));
        let mut meter = SpeedMeter::new();
        let mut downloaded = 0u64;
        let mut last_progress = Instant::now();
        let mut pause_rx = self.control.pause_rx();

        let stream_result: std::result::Result<(), DownloadError> = async {
            loop {
                // a paused worker holds its position mid-body and awaits
                // resume; no polling
                if *pause_rx.borrow() {
                    tokio::select! {
                        () = self.control.token().cancelled() => return Err(DownloadError::Cancelled),
                        result = pause_rx.wait_for(|paused| !*paused) => {
                            if result.is_err() {
                                return Err(DownloadError::Cancelled);
                            }
                        }
                    }
                }

                let chunk = tokio::select! {
                    () = self.control.token().cancelled() => return Err(DownloadError::Cancelled),
                    chunk = stream.next() => chunk,
                };
                let Some(chunk) = chunk else { break };
                let chunk = chunk.map_err(FetchError::from)?;

                file.write_all(&chunk)
                    .await
                    .map_err(|e| DownloadError::io(&dest, e))?;
                if let Some(h) = hasher.as_mut() {
                    h.update(&chunk);
                }
                downloaded += chunk.len() as u64;
                meter.record(chunk.len() as u64);
                self.items[id].lock().bytes = downloaded;

                if last_progress.elapsed() >= self.config.progress_interval {
                    last_progress = Instant::now();
                    self.emit(DownloadEvent::Progress {
                        id,
                        stats: ProgressStats {
                            downloaded,
                            total: pkg.size,
                            bytes_per_sec: meter.bytes_per_sec(),
                        },
                    });
                }
            }
            file.flush().await.map_err(|e| DownloadError::io(&dest, e))?;
            Ok(())
        }
        .await;

        drop(file);
        if let Err(e) = stream_result {
            let _ = tokio::fs::remove_file(&dest).await;
            return Err(e);
        }

        if let Some(hasher) = hasher {
            let actual = hasher.finalize_hex();
            if actual != pkg.checksum.value {
                let _ = tokio::fs::remove_file(&dest).await;
                return Err(DownloadError::ChecksumMismatch {
                    name: pkg.name.clone(),
                    expected: pkg.checksum.value.clone(),
                    actual,
                });
            }
        }

        Ok(dest)
    }
}
