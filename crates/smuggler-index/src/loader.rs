//! Per-repository metadata loading through the fetcher and cache.

use crate::error::Result;
use crate::universe::PackageUniverse;
use crate::{apk, apt, yum};
use smuggler_cache::{ArtefactKind, CacheKey, MetadataCache};
use smuggler_catalog::{resolve_url, Distribution, Repository};
use smuggler_core::{Architecture, PackageFamily};
use smuggler_fetch::{gunzip, gunzip_untar_member, Fetcher};
use tracing::{info, warn};

/// Loads repository metadata into [`PackageUniverse`]s.
///
/// Artefacts go through the metadata cache keyed by
/// `(family, repo URL, arch, artefact)`. A repository that fails to fetch
/// or parse is logged and skipped; the remaining repositories may still
/// satisfy the resolve.
#[derive(Debug)]
pub struct MetadataLoader<'a> {
    fetcher: &'a Fetcher,
    cache: &'a MetadataCache,
}

impl<'a> MetadataLoader<'a> {
    /// Create a loader over the given collaborators.
    #[must_use]
    pub fn new(fetcher: &'a Fetcher, cache: &'a MetadataCache) -> Self {
        Self { fetcher, cache }
    }

    /// Load every enabled repository of a distribution into one universe.
    pub async fn load_distribution(
        &self,
        dist: &Distribution,
        arch: Architecture,
    ) -> Result<PackageUniverse> {
        let mut universe = PackageUniverse::new(dist.family);

        for repo in dist.enabled_repos() {
            match self.load_repo(dist, repo, arch).await {
                Ok(packages) => {
                    info!(
                        repo = repo.id,
                        packages = packages.len(),
                        "loaded repository metadata"
                    );
                    universe.extend(packages);
                }
                Err(e) => {
                    warn!(repo = repo.id, error = %e, "skipping repository");
                }
            }
        }
        Ok(universe)
    }

    /// Load one repository's packages, filtered to `arch`.
    pub async fn load_repo(
        &self,
        dist: &Distribution,
        repo: &Repository,
        arch: Architecture,
    ) -> Result<Vec<smuggler_core::Package>> {
        let base = resolve_url(repo, dist.family, arch, &dist.id)?;
        match dist.family {
            PackageFamily::Yum => self.load_yum(&base, repo, arch).await,
            PackageFamily::Apt => self.load_apt(&base, repo, arch).await,
            PackageFamily::Apk => self.load_apk(&base, repo, arch).await,
        }
    }

    /// Fetch an artefact through the cache.
    async fn fetch_cached(
        &self,
        family: PackageFamily,
        base: &str,
        arch: Architecture,
        artefact: ArtefactKind,
        url: &str,
    ) -> Result<Vec<u8>> {
        let key = CacheKey::new(family, base, arch, artefact);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.to_vec());
        }
        let bytes = self.fetcher.get_bytes(url, None).await?;
        self.cache.set(key, bytes.to_vec());
        Ok(bytes.to_vec())
    }

    async fn load_yum(
        &self,
        base: &str,
        repo: &Repository,
        arch: Architecture,
    ) -> Result<Vec<smuggler_core::Package>> {
        let repomd_url = format!("{base}/repodata/repomd.xml");
        let repomd = self
            .fetch_cached(PackageFamily::Yum, base, arch, ArtefactKind::Repomd, &repomd_url)
            .await?;

        let entries = yum::parse_repomd(&repomd)?;
        let primary = yum::primary_location(&entries)?;

        let primary_url = format!("{base}/{}", primary.location);
        let compressed = self
            .fetch_cached(PackageFamily::Yum, base, arch, ArtefactKind::Primary, &primary_url)
            .await?;
        let xml = gunzip(&compressed)?;

        yum::parse_primary(&xml, &repo.id, arch)
    }

    async fn load_apt(
        &self,
        base: &str,
        repo: &Repository,
        arch: Architecture,
    ) -> Result<Vec<smuggler_core::Package>> {
        let release_url = format!("{base}/Release");
        let release_bytes = self
            .fetch_cached(PackageFamily::Apt, base, arch, ArtefactKind::Release, &release_url)
            .await?;
        let release = apt::parse_release(&String::from_utf8_lossy(&release_bytes));

        let deb_arch = arch.canonical_for(PackageFamily::Apt);
        let component = release
            .components
            .first()
            .cloned()
            .unwrap_or_else(|| "main".to_string());

        let packages_url = format!("{base}/{component}/binary-{deb_arch}/Packages.gz");
        let compressed = self
            .fetch_cached(PackageFamily::Apt, base, arch, ArtefactKind::Packages, &packages_url)
            .await?;
        let text = gunzip(&compressed)?;

        let mut packages = apt::parse_packages(
            &String::from_utf8_lossy(&text),
            &repo.id,
            arch,
        )?;

        // Filename paths are relative to the archive root, two segments
        // above the dists/<suite> base; rebase them so a URL join against
        // the repository base resolves.
        for pkg in &mut packages {
            if !pkg.location.starts_with("../") {
                pkg.location = format!("../../{}", pkg.location);
            }
        }
        Ok(packages)
    }

    async fn load_apk(
        &self,
        base: &str,
        repo: &Repository,
        arch: Architecture,
    ) -> Result<Vec<smuggler_core::Package>> {
        let apk_arch = arch.canonical_for(PackageFamily::Apk);
        let index_url = format!("{base}/{apk_arch}/APKINDEX.tar.gz");
        let container = self
            .fetch_cached(PackageFamily::Apk, base, arch, ArtefactKind::ApkIndex, &index_url)
            .await?;

        let text = gunzip_untar_member(&container, "APKINDEX")?;
        apk::parse_apkindex(&String::from_utf8_lossy(&text), &repo.id, arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smuggler_test_utils::fixtures;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_distribution(base_url: &str, family: PackageFamily) -> Distribution {
        let mut repo = smuggler_catalog::lookup("rocky-9").unwrap().default_repos[0].clone();
        repo.base_url = base_url.to_string();
        repo.id = "test".to_string();
        Distribution {
            id: "test-9".to_string(),
            name: "Test".to_string(),
            version: "9".to_string(),
            codename: None,
            family,
            architectures: vec![Architecture::X86_64],
            default_repos: vec![repo],
            extended_repos: vec![],
        }
    }

    #[tokio::test]
    async fn yum_load_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repodata/repomd.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(fixtures::REPOMD_XML.as_bytes()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repodata/primary.xml.gz"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(fixtures::gzip(fixtures::PRIMARY_XML.as_bytes())),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_defaults().unwrap();
        let cache = MetadataCache::session();
        let loader = MetadataLoader::new(&fetcher, &cache);
        let dist = test_distribution(&server.uri(), PackageFamily::Yum);

        let universe = loader
            .load_distribution(&dist, Architecture::X86_64)
            .await
            .unwrap();
        assert_eq!(universe.len(), 4);
        assert_eq!(universe.by_name("curl").len(), 1);
    }

    #[tokio::test]
    async fn second_load_hits_cache() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repodata/repomd.xml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(fixtures::REPOMD_XML.as_bytes()),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repodata/primary.xml.gz"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(fixtures::gzip(fixtures::PRIMARY_XML.as_bytes())),
            )
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_defaults().unwrap();
        let cache = MetadataCache::session();
        let loader = MetadataLoader::new(&fetcher, &cache);
        let dist = test_distribution(&server.uri(), PackageFamily::Yum);

        for _ in 0..2 {
            let universe = loader
                .load_distribution(&dist, Architecture::X86_64)
                .await
                .unwrap();
            assert_eq!(universe.len(), 4);
        }
        assert!(cache.stats().hits >= 2);
    }

    #[tokio::test]
    async fn failing_repo_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_defaults().unwrap();
        let cache = MetadataCache::session();
        let loader = MetadataLoader::new(&fetcher, &cache);
        let dist = test_distribution(&server.uri(), PackageFamily::Yum);

        let universe = loader
            .load_distribution(&dist, Architecture::X86_64)
            .await
            .unwrap();
        assert!(universe.is_empty());
    }

    #[tokio::test]
    async fn apk_load_extracts_index_member() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/x86_64/APKINDEX.tar.gz"))
            .respond_with(
                ResponseTemplate::new(200).set_body_bytes(fixtures::apkindex_tar_gz()),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_defaults().unwrap();
        let cache = MetadataCache::session();
        let loader = MetadataLoader::new(&fetcher, &cache);
        let dist = test_distribution(&server.uri(), PackageFamily::Apk);

        let universe = loader
            .load_distribution(&dist, Architecture::X86_64)
            .await
            .unwrap();
        assert_eq!(universe.by_name("curl").len(), 1);
        assert_eq!(universe.by_capability("so:libssl.so.3").len(), 1);
    }

    #[tokio::test]
    async fn apt_load_rebases_pool_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Release"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(fixtures::RELEASE.as_bytes()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/main/binary-amd64/Packages.gz"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(fixtures::gzip(fixtures::PACKAGES.as_bytes())),
            )
            .mount(&server)
            .await;

        let fetcher = Fetcher::with_defaults().unwrap();
        let cache = MetadataCache::session();
        let loader = MetadataLoader::new(&fetcher, &cache);
        let dist = test_distribution(&server.uri(), PackageFamily::Apt);

        let universe = loader
            .load_distribution(&dist, Architecture::Amd64)
            .await
            .unwrap();
        let curl = &universe.by_name("curl")[0];
        assert!(curl.location.starts_with("../../pool/"));
    }
}
