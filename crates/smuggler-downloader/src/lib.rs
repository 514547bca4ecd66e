//! Concurrent, resumable, verified package downloads.
//!
//! A bounded pool of workers (default 3) drains a FIFO queue of resolved
//! packages. Each item moves through
//! `Pending -> Downloading -> {Completed, Failed, Skipped, Cancelled}`
//! under a single writer. Bodies stream to family-named files with
//! progress events, an incremental checksum runs alongside the stream, and
//! mismatches delete the file and retry as transport failures. Pause holds
//! workers mid-body on a watch flag; cancellation clears the queue, aborts
//! in-flight bodies, deletes partial files, and returns the partial
//! outcome.
//!
//! Download completion order is unrelated to install order; the resolution
//! result keeps the latter.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod checksum;

mod config;
mod error;
mod events;
mod item;
mod manager;

pub use config::{DownloadConfig, DownloadConfigBuilder};
pub use error::{DownloadError, Result};
pub use events::{
    DownloadControl, DownloadEvent, ErrorDecision, EventCallback, ItemErrorCallback,
};
pub use item::{DownloadItem, ItemStatus, ProgressStats, SpeedMeter};
pub use manager::{DownloadManager, DownloadOutcome, DownloadRequest};
