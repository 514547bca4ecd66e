//! Static registry of supported distributions and their repositories.
//!
//! The catalog is the single place that knows which mirrors serve which
//! distribution, which package-manager family applies, and how to expand the
//! `$basearch` / `$releasever` template variables repository URLs carry.
//! It performs no I/O; consulting a repository before its variables are
//! bound is a configuration error, raised synchronously.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use smuggler_core::{Architecture, PackageFamily};
use std::sync::LazyLock;
use thiserror::Error;

/// Catalog errors. All of these are configuration-fatal: they are raised
/// before any network or filesystem access.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The distribution id is not in the registry.
    #[error("unknown distribution '{id}'")]
    UnknownDistribution {
        /// Requested id.
        id: String,
    },

    /// A `$variable` survived substitution.
    #[error("unresolved variable '{variable}' in repository URL {url}")]
    UnresolvedVariable {
        /// Variable name including the `$`.
        variable: String,
        /// URL after substitution.
        url: String,
    },

    /// The distribution does not support the requested architecture.
    #[error("distribution '{dist}' does not support architecture '{arch}'")]
    UnsupportedArchitecture {
        /// Distribution id.
        dist: String,
        /// Requested architecture.
        arch: Architecture,
    },
}

impl From<CatalogError> for smuggler_core::Error {
    fn from(err: CatalogError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// A package repository within a distribution.
///
/// Immutable once registered. `base_url` may contain `$basearch` and
/// `$releasever`; [`resolve_url`] must run before the URL is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Stable id, unique within the distribution.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Base URL, possibly templated.
    pub base_url: String,
    /// Whether the repository participates in metadata loads.
    pub enabled: bool,
    /// Whether the native tooling would GPG-check packages from here.
    /// Carried as a descriptor only; smuggler verifies checksums, not
    /// signatures.
    pub gpg_check: bool,
    /// Key URL for the native tooling, when published.
    pub gpg_key_url: Option<String>,
    /// Priority; lower number wins ties during resolution.
    pub priority: Option<u32>,
    /// Whether this is an official distribution mirror.
    pub official: bool,
}

impl Repository {
    fn official(id: &str, name: &str, base_url: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_url: base_url.to_string(),
            enabled: true,
            gpg_check: true,
            gpg_key_url: None,
            priority: None,
            official: true,
        }
    }

    fn extended(id: &str, name: &str, base_url: &str) -> Self {
        Self {
            enabled: false,
            official: false,
            gpg_check: false,
            ..Self::official(id, name, base_url)
        }
    }
}

/// A supported distribution release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    /// Stable id, e.g. `rocky-9`, `ubuntu-22.04`, `alpine-3.20`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Release version string.
    pub version: String,
    /// Release codename, when the family uses one.
    pub codename: Option<String>,
    /// Package-manager family.
    pub family: PackageFamily,
    /// Architectures this release publishes.
    pub architectures: Vec<Architecture>,
    /// Repositories consulted by default.
    pub default_repos: Vec<Repository>,
    /// Additional repositories the caller may enable.
    pub extended_repos: Vec<Repository>,
}

impl Distribution {
    /// All repositories, default first.
    #[must_use]
    pub fn all_repos(&self) -> Vec<&Repository> {
        self.default_repos
            .iter()
            .chain(self.extended_repos.iter())
            .collect()
    }

    /// Enabled repositories only.
    #[must_use]
    pub fn enabled_repos(&self) -> Vec<&Repository> {
        self.all_repos().into_iter().filter(|r| r.enabled).collect()
    }

    /// Whether the release publishes the given architecture.
    #[must_use]
    pub fn supports(&self, arch: Architecture) -> bool {
        self.architectures
            .iter()
            .any(|a| a.canonical() == arch.canonical())
    }
}

fn dist(
    id: &str,
    name: &str,
    version: &str,
    codename: Option<&str>,
    family: PackageFamily,
    architectures: &[Architecture],
    default_repos: Vec<Repository>,
    extended_repos: Vec<Repository>,
) -> Distribution {
    Distribution {
        id: id.to_string(),
        name: name.to_string(),
        version: version.to_string(),
        codename: codename.map(ToString::to_string),
        family,
        architectures: architectures.to_vec(),
        default_repos,
        extended_repos,
    }
}

static REGISTRY: LazyLock<Vec<Distribution>> = LazyLock::new(|| {
    use Architecture::{Aarch64, X86_64};
    use PackageFamily::{Apk, Apt, Yum};

    vec![
        dist(
            "rocky-9",
            "Rocky Linux",
            "9",
            None,
            Yum,
            &[X86_64, Aarch64],
            vec![
                Repository::official(
                    "baseos",
                    "Rocky Linux $releasever BaseOS",
                    "https://dl.rockylinux.org/pub/rocky/$releasever/BaseOS/$basearch/os",
                ),
                Repository::official(
                    "appstream",
                    "Rocky Linux $releasever AppStream",
                    "https://dl.rockylinux.org/pub/rocky/$releasever/AppStream/$basearch/os",
                ),
            ],
            vec![
                Repository::extended(
                    "crb",
                    "Rocky Linux $releasever CRB",
                    "https://dl.rockylinux.org/pub/rocky/$releasever/CRB/$basearch/os",
                ),
                Repository::extended(
                    "epel",
                    "EPEL $releasever",
                    "https://dl.fedoraproject.org/pub/epel/$releasever/Everything/$basearch",
                ),
            ],
        ),
        dist(
            "rocky-8",
            "Rocky Linux",
            "8",
            None,
            Yum,
            &[X86_64, Aarch64],
            vec![
                Repository::official(
                    "baseos",
                    "Rocky Linux $releasever BaseOS",
                    "https://dl.rockylinux.org/pub/rocky/$releasever/BaseOS/$basearch/os",
                ),
                Repository::official(
                    "appstream",
                    "Rocky Linux $releasever AppStream",
                    "https://dl.rockylinux.org/pub/rocky/$releasever/AppStream/$basearch/os",
                ),
            ],
            vec![Repository::extended(
                "epel",
                "EPEL $releasever",
                "https://dl.fedoraproject.org/pub/epel/$releasever/Everything/$basearch",
            )],
        ),
        dist(
            "almalinux-9",
            "AlmaLinux",
            "9",
            None,
            Yum,
            &[X86_64, Aarch64],
            vec![
                Repository::official(
                    "baseos",
                    "AlmaLinux $releasever BaseOS",
                    "https://repo.almalinux.org/almalinux/$releasever/BaseOS/$basearch/os",
                ),
                Repository::official(
                    "appstream",
                    "AlmaLinux $releasever AppStream",
                    "https://repo.almalinux.org/almalinux/$releasever/AppStream/$basearch/os",
                ),
            ],
            vec![],
        ),
        dist(
            "centos-stream-9",
            "CentOS Stream",
            "9",
            None,
            Yum,
            &[X86_64, Aarch64],
            vec![
                Repository::official(
                    "baseos",
                    "CentOS Stream $releasever BaseOS",
                    "https://mirror.stream.centos.org/$releasever-stream/BaseOS/$basearch/os",
                ),
                Repository::official(
                    "appstream",
                    "CentOS Stream $releasever AppStream",
                    "https://mirror.stream.centos.org/$releasever-stream/AppStream/$basearch/os",
                ),
            ],
            vec![],
        ),
        dist(
            "fedora-40",
            "Fedora",
            "40",
            None,
            Yum,
            &[X86_64, Aarch64],
            vec![Repository::official(
                "fedora",
                "Fedora $releasever",
                "https://dl.fedoraproject.org/pub/fedora/linux/releases/$releasever/Everything/$basearch/os",
            )],
            vec![Repository::extended(
                "updates",
                "Fedora $releasever Updates",
                "https://dl.fedoraproject.org/pub/fedora/linux/updates/$releasever/Everything/$basearch",
            )],
        ),
        dist(
            "ubuntu-22.04",
            "Ubuntu",
            "22.04",
            Some("jammy"),
            Apt,
            &[Architecture::Amd64, Architecture::Arm64],
            vec![
                Repository::official(
                    "main",
                    "Ubuntu jammy main",
                    "http://archive.ubuntu.com/ubuntu/dists/jammy",
                ),
                Repository::official(
                    "updates",
                    "Ubuntu jammy updates",
                    "http://archive.ubuntu.com/ubuntu/dists/jammy-updates",
                ),
            ],
            vec![Repository::extended(
                "security",
                "Ubuntu jammy security",
                "http://security.ubuntu.com/ubuntu/dists/jammy-security",
            )],
        ),
        dist(
            "ubuntu-24.04",
            "Ubuntu",
            "24.04",
            Some("noble"),
            Apt,
            &[Architecture::Amd64, Architecture::Arm64],
            vec![
                Repository::official(
                    "main",
                    "Ubuntu noble main",
                    "http://archive.ubuntu.com/ubuntu/dists/noble",
                ),
                Repository::official(
                    "updates",
                    "Ubuntu noble updates",
                    "http://archive.ubuntu.com/ubuntu/dists/noble-updates",
                ),
            ],
            vec![],
        ),
        dist(
            "debian-12",
            "Debian",
            "12",
            Some("bookworm"),
            Apt,
            &[Architecture::Amd64, Architecture::Arm64],
            vec![Repository::official(
                "main",
                "Debian bookworm main",
                "https://deb.debian.org/debian/dists/bookworm",
            )],
            vec![Repository::extended(
                "security",
                "Debian bookworm security",
                "https://security.debian.org/debian-security/dists/bookworm-security",
            )],
        ),
        dist(
            "debian-11",
            "Debian",
            "11",
            Some("bullseye"),
            Apt,
            &[Architecture::Amd64, Architecture::Arm64],
            vec![Repository::official(
                "main",
                "Debian bullseye main",
                "https://deb.debian.org/debian/dists/bullseye",
            )],
            vec![],
        ),
        dist(
            "alpine-3.20",
            "Alpine Linux",
            "3.20",
            None,
            Apk,
            &[X86_64, Aarch64, Architecture::Armv7],
            vec![
                Repository::official(
                    "main",
                    "Alpine v3.20 main",
                    "https://dl-cdn.alpinelinux.org/alpine/v3.20/main",
                ),
                Repository::official(
                    "community",
                    "Alpine v3.20 community",
                    "https://dl-cdn.alpinelinux.org/alpine/v3.20/community",
                ),
            ],
            vec![],
        ),
        dist(
            "alpine-3.19",
            "Alpine Linux",
            "3.19",
            None,
            Apk,
            &[X86_64, Aarch64],
            vec![
                Repository::official(
                    "main",
                    "Alpine v3.19 main",
                    "https://dl-cdn.alpinelinux.org/alpine/v3.19/main",
                ),
                Repository::official(
                    "community",
                    "Alpine v3.19 community",
                    "https://dl-cdn.alpinelinux.org/alpine/v3.19/community",
                ),
            ],
            vec![],
        ),
    ]
});

/// Look up a distribution by id.
pub fn lookup(dist_id: &str) -> Result<&'static Distribution> {
    REGISTRY
        .iter()
        .find(|d| d.id == dist_id)
        .ok_or_else(|| CatalogError::UnknownDistribution {
            id: dist_id.to_string(),
        })
}

/// All distributions using the given family.
#[must_use]
pub fn by_family(family: PackageFamily) -> Vec<&'static Distribution> {
    REGISTRY.iter().filter(|d| d.family == family).collect()
}

/// All registered distribution ids.
#[must_use]
pub fn distribution_ids() -> Vec<&'static str> {
    REGISTRY.iter().map(|d| d.id.as_str()).collect()
}

/// Expand `$basearch` and `$releasever` in a repository base URL.
///
/// `$basearch` becomes the family-canonical spelling of `arch`;
/// `$releasever` becomes the first run of digits (with embedded dots) in
/// `dist_id`, e.g. `ubuntu-22.04` gives `22.04`. Any `$` variable left after
/// substitution is fatal.
pub fn resolve_url(
    repo: &Repository,
    family: PackageFamily,
    arch: Architecture,
    dist_id: &str,
) -> Result<String> {
    let releasever = release_version(dist_id);
    let url = repo
        .base_url
        .replace("$basearch", arch.canonical_for(family))
        .replace("$releasever", &releasever);

    if let Some(pos) = url.find('$') {
        let variable: String = url[pos..]
            .chars()
            .take_while(|c| *c == '$' || c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        return Err(CatalogError::UnresolvedVariable { variable, url });
    }
    Ok(url)
}

/// First run of digits (and embedded dots) in a distribution id.
fn release_version(dist_id: &str) -> String {
    let start = dist_id
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(dist_id.len());
    dist_id[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_known_distribution() {
        let rocky = lookup("rocky-9").unwrap();
        assert_eq!(rocky.family, PackageFamily::Yum);
        assert_eq!(rocky.default_repos.len(), 2);
    }

    #[test]
    fn lookup_unknown_is_fatal() {
        let err = lookup("gentoo-23").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDistribution { .. }));
    }

    #[test]
    fn by_family_partition() {
        let yum = by_family(PackageFamily::Yum);
        let apt = by_family(PackageFamily::Apt);
        let apk = by_family(PackageFamily::Apk);
        assert!(yum.iter().all(|d| d.family == PackageFamily::Yum));
        assert_eq!(
            yum.len() + apt.len() + apk.len(),
            distribution_ids().len()
        );
    }

    #[test]
    fn url_template_expansion() {
        let rocky = lookup("rocky-9").unwrap();
        let url = resolve_url(
            &rocky.default_repos[0],
            PackageFamily::Yum,
            Architecture::X86_64,
            "rocky-9",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://dl.rockylinux.org/pub/rocky/9/BaseOS/x86_64/os"
        );
    }

    #[test]
    fn releasever_takes_first_numeric_run() {
        let ubuntu = lookup("ubuntu-22.04").unwrap();
        let url = resolve_url(
            &ubuntu.default_repos[0],
            PackageFamily::Apt,
            Architecture::Amd64,
            "ubuntu-22.04",
        )
        .unwrap();
        // no variables in apt URLs, but expansion must not corrupt them
        assert_eq!(url, "http://archive.ubuntu.com/ubuntu/dists/jammy");
        assert_eq!(release_version("ubuntu-22.04"), "22.04");
        assert_eq!(release_version("rocky-9"), "9");
    }

    #[test]
    fn leftover_variable_is_fatal() {
        let repo = Repository::official("x", "x", "https://mirror/$unknownvar/os");
        let err = resolve_url(&repo, PackageFamily::Yum, Architecture::X86_64, "rocky-9")
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnresolvedVariable { .. }));
    }

    #[test]
    fn basearch_uses_family_spelling() {
        let repo = Repository::official("x", "x", "https://mirror/$basearch");
        let yum = resolve_url(&repo, PackageFamily::Yum, Architecture::Amd64, "rocky-9").unwrap();
        assert_eq!(yum, "https://mirror/x86_64");
    }
}
