//! End-to-end pipeline: request to offline mirror.
//!
//! `smuggle(request, config, collaborators)` walks the whole flow: the
//! catalog resolves the repository set, the metadata loader fills a
//! candidate universe through the cache, the resolver computes the
//! closure and install order, the download manager fetches and verifies
//! the set, and the mirror writer emits a tree the native package manager
//! can consume from `file://`.
//!
//! There is no process-global state: callers construct the fetcher and
//! cache explicitly and pass them in, which is also how tests get fresh
//! instances.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod pipeline;

pub use config::{OutputKind, SmugglerConfig};
pub use pipeline::{smuggle, smuggle_distribution, SmuggleReport, SmuggleRequest};

pub use smuggler_cache::{CacheConfig, CacheMode, MetadataCache};
pub use smuggler_core::{Architecture, Error, Package, PackageFamily, Result};
pub use smuggler_downloader::{DownloadControl, DownloadEvent, ErrorDecision};
pub use smuggler_fetch::{FetchConfig, Fetcher};
pub use smuggler_resolver::{ResolutionResult, ResolverOptions};
