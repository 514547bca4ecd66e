//! Builder for synthetic [`Package`] values in resolver, downloader, and
//! mirror tests.

use smuggler_core::{
    Architecture, Checksum, ChecksumType, DepKind, DepOperator, Dependency, Package, PackageFamily,
};

/// Fluent builder over a [`Package`] with sensible test defaults.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    pkg: Package,
}

impl PackageBuilder {
    /// Start a package of the given family.
    #[must_use]
    pub fn new(family: PackageFamily, name: &str, version: &str) -> Self {
        let location = match family {
            PackageFamily::Yum => format!("Packages/{name}-{version}.x86_64.rpm"),
            PackageFamily::Apt => format!("pool/main/{name}_{version}_amd64.deb"),
            PackageFamily::Apk => format!("x86_64/{name}-{version}.apk"),
        };
        Self {
            pkg: Package {
                name: name.to_string(),
                version: version.to_string(),
                release: None,
                epoch: None,
                architecture: Architecture::X86_64,
                family,
                size: 1024,
                installed_size: None,
                checksum: Checksum::new(ChecksumType::Sha256, "0".repeat(64)),
                location,
                repo_id: "test".to_string(),
                dependencies: Vec::new(),
                provides: Vec::new(),
                conflicts: Vec::new(),
                obsoletes: Vec::new(),
                description: None,
                license: None,
            },
        }
    }

    /// Shorthand for a YUM package.
    #[must_use]
    pub fn rpm(name: &str, version: &str, release: &str) -> Self {
        let mut builder = Self::new(PackageFamily::Yum, name, version);
        builder.pkg.release = Some(release.to_string());
        builder.pkg.location = format!("Packages/{name}-{version}-{release}.x86_64.rpm");
        builder
    }

    /// Shorthand for an APT package.
    #[must_use]
    pub fn deb(name: &str, version: &str) -> Self {
        Self::new(PackageFamily::Apt, name, version)
    }

    /// Shorthand for an APK package.
    #[must_use]
    pub fn apk(name: &str, version: &str) -> Self {
        Self::new(PackageFamily::Apk, name, version)
    }

    /// Set the epoch.
    #[must_use]
    pub fn epoch(mut self, epoch: u64) -> Self {
        self.pkg.epoch = Some(epoch);
        self
    }

    /// Set the architecture.
    #[must_use]
    pub fn arch(mut self, arch: Architecture) -> Self {
        self.pkg.architecture = arch;
        self
    }

    /// Set the download size.
    #[must_use]
    pub fn size(mut self, size: u64) -> Self {
        self.pkg.size = size;
        self
    }

    /// Set the checksum.
    #[must_use]
    pub fn checksum(mut self, algo: ChecksumType, value: &str) -> Self {
        self.pkg.checksum = Checksum::new(algo, value);
        self
    }

    /// Set the repository id.
    #[must_use]
    pub fn repo(mut self, repo_id: &str) -> Self {
        self.pkg.repo_id = repo_id.to_string();
        self
    }

    /// Set the repo-relative location.
    #[must_use]
    pub fn location(mut self, location: &str) -> Self {
        self.pkg.location = location.to_string();
        self
    }

    /// Add an advertised capability.
    #[must_use]
    pub fn provides(mut self, capability: &str) -> Self {
        self.pkg.provides.push(capability.to_string());
        self
    }

    /// Add an unconstrained hard dependency.
    #[must_use]
    pub fn dep(mut self, name: &str) -> Self {
        self.pkg.dependencies.push(Dependency::on(name));
        self
    }

    /// Add a version-constrained hard dependency.
    #[must_use]
    pub fn dep_versioned(mut self, name: &str, op: DepOperator, version: &str) -> Self {
        self.pkg
            .dependencies
            .push(Dependency::constrained(name, op, version));
        self
    }

    /// Add an optional dependency.
    #[must_use]
    pub fn suggests(mut self, name: &str) -> Self {
        self.pkg
            .dependencies
            .push(Dependency::on(name).with_kind(DepKind::Suggests));
        self
    }

    /// Add a recommended dependency.
    #[must_use]
    pub fn recommends(mut self, name: &str) -> Self {
        self.pkg
            .dependencies
            .push(Dependency::on(name).with_kind(DepKind::Recommends));
        self
    }

    /// Finish the package.
    #[must_use]
    pub fn build(self) -> Package {
        self.pkg
    }
}
