//! The request-to-mirror pipeline.

use crate::config::{OutputKind, SmugglerConfig};
use smuggler_cache::MetadataCache;
use smuggler_catalog::{lookup, resolve_url, Distribution};
use smuggler_core::{AHashMap, AHashSet, Architecture, Error, Package, PackageFamily, Result};
use smuggler_downloader::{
    DownloadConfig, DownloadControl, DownloadManager, DownloadOutcome, DownloadRequest,
    EventCallback, ItemErrorCallback, ItemStatus,
};
use smuggler_fetch::Fetcher;
use smuggler_index::MetadataLoader;
use smuggler_mirror::{write_apk_mirror, write_apt_mirror, write_manifest, write_yum_mirror};
use smuggler_resolver::{ResolutionResult, Resolver, ResolverOptions};
use std::path::PathBuf;
use tracing::info;

/// One smuggling run's inputs.
pub struct SmuggleRequest {
    /// Requested package names (capabilities are accepted).
    pub packages: Vec<String>,
    /// Target distribution id, e.g. `rocky-9`.
    pub dist_id: String,
    /// Target architecture.
    pub arch: Architecture,
    /// Root output directory.
    pub output_dir: PathBuf,
    /// Download event callback.
    pub on_event: Option<EventCallback>,
    /// Escalation callback for exhausted retries.
    pub on_item_error: Option<ItemErrorCallback>,
    /// Pause/resume/cancel handle.
    pub control: DownloadControl,
}

impl std::fmt::Debug for SmuggleRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmuggleRequest")
            .field("packages", &self.packages)
            .field("dist_id", &self.dist_id)
            .field("arch", &self.arch)
            .field("output_dir", &self.output_dir)
            .finish_non_exhaustive()
    }
}

impl SmuggleRequest {
    /// Create a request with no callbacks and a fresh control handle.
    #[must_use]
    pub fn new(
        packages: Vec<String>,
        dist_id: impl Into<String>,
        arch: Architecture,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            packages,
            dist_id: dist_id.into(),
            arch,
            output_dir: output_dir.into(),
            on_event: None,
            on_item_error: None,
            control: DownloadControl::new(),
        }
    }
}

/// What a run produced.
#[derive(Debug)]
pub struct SmuggleReport {
    /// The resolution, including unresolved edges and conflicts.
    pub resolution: ResolutionResult,
    /// Per-item download outcomes.
    pub download: DownloadOutcome,
    /// Path of the native repository tree, when one was written.
    pub repository_dir: Option<PathBuf>,
    /// Path of the downloaded package files.
    pub packages_dir: PathBuf,
}

/// Run the full pipeline against a registered distribution.
pub async fn smuggle(
    request: SmuggleRequest,
    config: &SmugglerConfig,
    fetcher: &Fetcher,
    cache: &MetadataCache,
) -> Result<SmuggleReport> {
    let dist = lookup(&request.dist_id)?;
    smuggle_distribution(dist, request, config, fetcher, cache).await
}

/// Run the full pipeline against an explicit distribution descriptor.
///
/// Configuration-fatal conditions (unknown architecture, unresolved URL
/// variables) surface before any network I/O.
pub async fn smuggle_distribution(
    dist: &Distribution,
    request: SmuggleRequest,
    config: &SmugglerConfig,
    fetcher: &Fetcher,
    cache: &MetadataCache,
) -> Result<SmuggleReport> {
    if !dist.supports(request.arch) {
        return Err(Error::config(format!(
            "distribution '{}' does not support architecture '{}'",
            dist.id, request.arch
        )));
    }

    // repository URLs must resolve before anything is fetched
    let mut base_urls: AHashMap<String, String> = AHashMap::new();
    for repo in dist.enabled_repos() {
        let url = resolve_url(repo, dist.family, request.arch, &dist.id)?;
        base_urls.insert(repo.id.clone(), url);
    }

    info!(
        dist = dist.id,
        arch = %request.arch,
        requested = request.packages.len(),
        "smuggle starting"
    );

    let loader = MetadataLoader::new(fetcher, cache);
    let universe = loader.load_distribution(dist, request.arch).await?;

    let repos = dist.enabled_repos();
    let resolver = Resolver::new(
        &universe,
        request.arch,
        ResolverOptions {
            include_optional: config.include_optional,
            include_recommends: config.include_recommends,
        },
    )
    .with_repositories(&repos);

    let names: Vec<&str> = request.packages.iter().map(String::as_str).collect();
    let resolution = resolver.resolve_names(&names);

    let packages_dir = request.output_dir.join("packages");
    let manager = DownloadManager::new(
        fetcher.clone(),
        DownloadConfig::builder()
            .concurrency(config.concurrency)
            .max_retries(config.max_retries)
            .base_delay(config.base_delay)
            .verify_checksum(config.verify_checksum)
            .build(),
    );
    let mut dl_request = DownloadRequest::new(
        resolution.packages.clone(),
        packages_dir.clone(),
        base_urls,
    );
    dl_request.on_event = request.on_event;
    dl_request.on_item_error = request.on_item_error;
    dl_request.control = request.control;
    let download = manager.download(dl_request).await?;

    // only verified downloads make it into the emitted trees
    let completed_ids: AHashSet<_> = download
        .items
        .iter()
        .filter(|i| i.status == ItemStatus::Completed)
        .map(|i| i.pkg.identity())
        .collect();
    let completed: Vec<Package> = resolution
        .packages
        .iter()
        .filter(|p| completed_ids.contains(&p.identity()))
        .cloned()
        .collect();

    let repository_dir = if matches!(config.output, OutputKind::Repository | OutputKind::Both) {
        let dir = request.output_dir.join("repository");
        let revision = chrono::Utc::now().timestamp().unsigned_abs();
        match dist.family {
            PackageFamily::Yum => write_yum_mirror(&completed, &packages_dir, &dir, revision)?,
            PackageFamily::Apt => write_apt_mirror(&completed, &packages_dir, &dir, revision)?,
            PackageFamily::Apk => write_apk_mirror(&completed, &packages_dir, &dir)?,
        }
        Some(dir)
    } else {
        None
    };

    if matches!(config.output, OutputKind::Archive | OutputKind::Both) {
        write_manifest(&completed, &request.output_dir)?;
    }

    info!(
        resolved = resolution.packages.len(),
        downloaded = completed.len(),
        "smuggle finished"
    );

    Ok(SmuggleReport {
        resolution,
        download,
        repository_dir,
        packages_dir,
    })
}
