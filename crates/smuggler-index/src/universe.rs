//! The candidate universe: every compatible package across the active
//! repositories, indexed by name and by advertised capability.

use smuggler_core::package::capability_base;
use smuggler_core::{AHashMap, Package, PackageFamily};

/// Indexed set of candidate packages for one resolve.
///
/// Lookups run by exact name first, then by capability. Capabilities are
/// indexed both verbatim and with version / parenthesised suffixes
/// stripped, so `libcurl.so.4()(64bit)` answers a `libcurl.so.4` lookup and
/// `so:libssl.so.3=3` answers `so:libssl.so.3`.
#[derive(Debug)]
pub struct PackageUniverse {
    family: PackageFamily,
    packages: Vec<Package>,
    by_name: AHashMap<String, Vec<usize>>,
    by_capability: AHashMap<String, Vec<usize>>,
}

impl PackageUniverse {
    /// Create an empty universe for one family.
    #[must_use]
    pub fn new(family: PackageFamily) -> Self {
        Self {
            family,
            packages: Vec::new(),
            by_name: AHashMap::new(),
            by_capability: AHashMap::new(),
        }
    }

    /// Build a universe from parsed packages.
    #[must_use]
    pub fn from_packages(family: PackageFamily, packages: Vec<Package>) -> Self {
        let mut universe = Self::new(family);
        universe.extend(packages);
        universe
    }

    /// The family this universe serves.
    #[must_use]
    pub const fn family(&self) -> PackageFamily {
        self.family
    }

    /// Add one package to the index.
    pub fn add(&mut self, pkg: Package) {
        let idx = self.packages.len();
        self.by_name.entry(pkg.name.clone()).or_default().push(idx);

        for capability in &pkg.provides {
            self.by_capability
                .entry(capability.clone())
                .or_default()
                .push(idx);
            let base = capability_base(capability);
            if base != capability {
                self.by_capability
                    .entry(base.to_string())
                    .or_default()
                    .push(idx);
            }
        }
        self.packages.push(pkg);
    }

    /// Add many packages.
    pub fn extend(&mut self, packages: impl IntoIterator<Item = Package>) {
        for pkg in packages {
            self.add(pkg);
        }
    }

    /// Candidates whose *name* matches exactly.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Vec<&Package> {
        self.by_name
            .get(name)
            .map(|indices| indices.iter().map(|&i| &self.packages[i]).collect())
            .unwrap_or_default()
    }

    /// Candidates advertising the capability.
    #[must_use]
    pub fn by_capability(&self, capability: &str) -> Vec<&Package> {
        self.by_capability
            .get(capability)
            .map(|indices| indices.iter().map(|&i| &self.packages[i]).collect())
            .unwrap_or_default()
    }

    /// Name matches merged with capability matches, in index order and
    /// deduplicated.
    #[must_use]
    pub fn candidates(&self, dep_name: &str) -> Vec<&Package> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        let name_hits = self.by_name.get(dep_name).into_iter().flatten();
        let cap_hits = self.by_capability.get(dep_name).into_iter().flatten();
        for &idx in name_hits.chain(cap_hits) {
            if !seen.contains(&idx) {
                seen.push(idx);
                out.push(&self.packages[idx]);
            }
        }
        out
    }

    /// Number of indexed packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the universe is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterate all indexed packages.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smuggler_core::{Architecture, Checksum, ChecksumType};

    fn pkg(name: &str, version: &str, provides: &[&str]) -> Package {
        Package {
            name: name.into(),
            version: version.into(),
            release: None,
            epoch: None,
            architecture: Architecture::X86_64,
            family: PackageFamily::Apk,
            size: 1,
            installed_size: None,
            checksum: Checksum::new(ChecksumType::Sha256, "00".repeat(32)),
            location: format!("x86_64/{name}-{version}.apk"),
            repo_id: "main".into(),
            dependencies: Vec::new(),
            provides: provides.iter().map(ToString::to_string).collect(),
            conflicts: Vec::new(),
            obsoletes: Vec::new(),
            description: None,
            license: None,
        }
    }

    #[test]
    fn lookup_by_name_and_capability() {
        let universe = PackageUniverse::from_packages(
            PackageFamily::Apk,
            vec![pkg("libssl3", "3.1.4-r5", &["so:libssl.so.3=3"])],
        );

        assert_eq!(universe.by_name("libssl3").len(), 1);
        assert_eq!(universe.by_capability("so:libssl.so.3=3").len(), 1);
        // version-stripped alias
        assert_eq!(universe.by_capability("so:libssl.so.3").len(), 1);
        assert!(universe.by_name("so:libssl.so.3").is_empty());
    }

    #[test]
    fn candidates_merge_without_duplicates() {
        let universe = PackageUniverse::from_packages(
            PackageFamily::Apk,
            vec![
                // provides its own name as a capability too
                pkg("musl", "1.2.4-r2", &["musl=1.2.4-r2"]),
                pkg("musl", "1.2.5-r0", &[]),
            ],
        );

        let candidates = universe.candidates("musl");
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn parenthesised_suffix_stripped() {
        let universe = PackageUniverse::from_packages(
            PackageFamily::Yum,
            vec![pkg("libcurl", "7.76.1", &["libcurl.so.4()(64bit)"])],
        );
        assert_eq!(universe.by_capability("libcurl.so.4").len(), 1);
    }

    #[test]
    fn multiple_providers_for_virtual() {
        let universe = PackageUniverse::from_packages(
            PackageFamily::Apt,
            vec![
                pkg("postfix", "3.6.4", &["mail-transport-agent"]),
                pkg("exim4", "4.95", &["mail-transport-agent"]),
            ],
        );
        let providers = universe.by_capability("mail-transport-agent");
        assert_eq!(providers.len(), 2);
        // first-indexed ordering preserved
        assert_eq!(providers[0].name, "postfix");
    }
}
