//! HTTP fetching for the smuggler workspace.
//!
//! One [`Fetcher`] serves both metadata loads and package downloads:
//! - GET with redirect following and a `smuggler/<version>` User-Agent
//! - Retry with backoff for transport failures, 5xx, 408, and 429;
//!   fail-fast for every other 4xx
//! - Streaming bodies for progress reporting
//! - Cooperative cancellation that deletes partially written files
//! - gzip / tar post-processors for the metadata wire formats

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod decode;
mod error;

pub use client::{FetchConfig, Fetcher};
pub use decode::{gunzip, gunzip_untar_member, untar_member};
pub use error::{FetchError, Result};
