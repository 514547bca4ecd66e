//! The unified package model.
//!
//! All three metadata parsers produce [`Package`] values; the resolver,
//! downloader, and mirror writer consume them without knowing which wire
//! format they came from. Identity is always the full
//! `(name, version, release, epoch, architecture)` tuple, never the name
//! alone.

use crate::arch::Architecture;
use crate::version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// The package-manager family a distribution belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageFamily {
    /// RPM repositories consumed by yum/dnf (`repomd.xml` + `primary.xml.gz`).
    Yum,
    /// Debian repositories consumed by apt (`Release` + `Packages.gz`).
    Apt,
    /// Alpine repositories consumed by apk (`APKINDEX.tar.gz`).
    Apk,
}

impl PackageFamily {
    /// Short identifier used in cache keys and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yum => "yum",
            Self::Apt => "apt",
            Self::Apk => "apk",
        }
    }

    /// Parse a family identifier.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "yum" | "dnf" | "rpm" => Some(Self::Yum),
            "apt" | "deb" => Some(Self::Apt),
            "apk" => Some(Self::Apk),
            _ => None,
        }
    }

    /// Total order over version strings for this family.
    #[must_use]
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Yum => version::rpm_cmp(a, b),
            Self::Apt => version::deb_cmp(a, b),
            Self::Apk => version::apk_cmp(a, b),
        }
    }

    /// Apply a constraint operator under this family's order.
    #[must_use]
    pub fn matches(self, candidate: &str, op: DepOperator, required: &str) -> bool {
        let cmp = match self {
            Self::Yum => version::rpm_cmp,
            Self::Apt => version::deb_cmp,
            Self::Apk => version::apk_cmp,
        };
        version::matches(cmp, candidate, op, required)
    }

    /// On-disk filename for a downloaded package of this family.
    ///
    /// - RPM: `{name}-{version}[-{release}].{arch}.rpm`
    /// - DEB: `{name}_{version}_{arch}.deb` (arch in the APT spelling)
    /// - APK: `{name}-{version}.apk`
    #[must_use]
    pub fn filename(self, pkg: &Package) -> String {
        match self {
            Self::Yum => {
                let mut s = format!("{}-{}", pkg.name, pkg.version);
                if let Some(release) = &pkg.release {
                    s.push('-');
                    s.push_str(release);
                }
                s.push('.');
                s.push_str(pkg.architecture.as_str());
                s.push_str(".rpm");
                s
            }
            Self::Apt => format!(
                "{}_{}_{}.deb",
                pkg.name,
                pkg.version,
                pkg.architecture.canonical_for(Self::Apt)
            ),
            Self::Apk => format!("{}-{}.apk", pkg.name, pkg.version),
        }
    }
}

impl fmt::Display for PackageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checksum algorithms the wire formats declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumType {
    /// MD5 (legacy Debian `MD5sum`).
    Md5,
    /// SHA-1 (APK `Q1` checksums, older YUM repos).
    Sha1,
    /// SHA-256 (the common case everywhere).
    Sha256,
    /// SHA-512 (newer YUM repos).
    Sha512,
}

impl ChecksumType {
    /// Parse a checksum type as it appears in repository metadata.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" | "md5sum" => Some(Self::Md5),
            "sha" | "sha1" | "sha-1" => Some(Self::Sha1),
            "sha256" | "sha-256" => Some(Self::Sha256),
            "sha512" | "sha-512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Metadata spelling of this algorithm.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Expected hex digest length.
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha1 => 40,
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

impl fmt::Display for ChecksumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared checksum: algorithm plus lowercase hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    /// Hash algorithm.
    pub algo: ChecksumType,
    /// Lowercase hex digest.
    pub value: String,
}

impl Checksum {
    /// Create a checksum, normalising the digest to lowercase.
    #[must_use]
    pub fn new(algo: ChecksumType, value: impl Into<String>) -> Self {
        let mut value = value.into();
        value.make_ascii_lowercase();
        Self { algo, value }
    }
}

/// Constraint operators on dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepOperator {
    /// Exactly equal.
    Eq,
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
    /// Less than or equal.
    Le,
    /// Greater than or equal.
    Ge,
    /// Debian strict `<<` (semantically `<`).
    StrictLt,
    /// Debian strict `>>` (semantically `>`).
    StrictGt,
}

impl DepOperator {
    /// Parse an operator as spelled in metadata.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "=" | "==" | "EQ" => Some(Self::Eq),
            "<" | "LT" => Some(Self::Lt),
            ">" | "GT" => Some(Self::Gt),
            "<=" | "LE" => Some(Self::Le),
            ">=" | "GE" => Some(Self::Ge),
            "<<" => Some(Self::StrictLt),
            ">>" => Some(Self::StrictGt),
            _ => None,
        }
    }

    /// Display spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::StrictLt => "<<",
            Self::StrictGt => ">>",
        }
    }
}

impl fmt::Display for DepOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strongly a package wants a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepKind {
    /// Hard requirement; always followed.
    Requires,
    /// APT `Recommends`; followed when `include_recommends` is set.
    Recommends,
    /// Optional (APT `Suggests`, RPM weak deps); followed when
    /// `include_optional` is set.
    Suggests,
}

/// An edge in the dependency graph before resolution.
///
/// The name is a *capability*, not necessarily a package name: it may be a
/// virtual package, a shared-library soname (`so:libssl.so.3`), or a command
/// (`cmd:sh`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Required capability.
    pub name: String,
    /// Version bound, when the edge is constrained.
    pub version: Option<String>,
    /// Constraint operator, present iff `version` is.
    pub op: Option<DepOperator>,
    /// Requires / Recommends / Suggests.
    pub kind: DepKind,
}

impl Dependency {
    /// An unconstrained hard requirement on a capability.
    #[must_use]
    pub fn on(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            op: None,
            kind: DepKind::Requires,
        }
    }

    /// A version-constrained hard requirement.
    #[must_use]
    pub fn constrained(name: impl Into<String>, op: DepOperator, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
            op: Some(op),
            kind: DepKind::Requires,
        }
    }

    /// Same edge with a different kind.
    #[must_use]
    pub fn with_kind(mut self, kind: DepKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this edge is skipped unless the caller opted in.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        matches!(self.kind, DepKind::Suggests)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.op, &self.version) {
            (Some(op), Some(v)) => write!(f, "{} {} {}", self.name, op, v),
            _ => f.write_str(&self.name),
        }
    }
}

/// The identity tuple of a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
    /// Package name.
    pub name: String,
    /// Version string.
    pub version: String,
    /// Release (RPM), absent for APT/APK.
    pub release: Option<String>,
    /// Epoch, absent means 0.
    pub epoch: Option<u64>,
    /// Architecture.
    pub architecture: Architecture,
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(epoch) = self.epoch {
            if epoch != 0 {
                write!(f, "{}-{}:{}", self.name, epoch, self.version)?;
            } else {
                write!(f, "{}-{}", self.name, self.version)?;
            }
        } else {
            write!(f, "{}-{}", self.name, self.version)?;
        }
        if let Some(release) = &self.release {
            write!(f, "-{release}")?;
        }
        write!(f, ".{}", self.architecture)
    }
}

/// A package as parsed from repository metadata.
///
/// Created by a parser, never mutated afterwards. The resolver and
/// downloader hold clones or references; they do not write back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Package name.
    pub name: String,
    /// Version string (upstream version for RPM, full version for APT/APK).
    pub version: String,
    /// RPM release, absent for APT/APK.
    pub release: Option<String>,
    /// Epoch; absent means 0.
    pub epoch: Option<u64>,
    /// Architecture.
    pub architecture: Architecture,
    /// Family whose parser produced this package.
    pub family: PackageFamily,
    /// Download size in bytes.
    pub size: u64,
    /// Installed size in bytes, when the metadata declares it.
    pub installed_size: Option<u64>,
    /// Declared checksum of the package file.
    pub checksum: Checksum,
    /// Repo-relative download path.
    pub location: String,
    /// Id of the repository this package came from.
    pub repo_id: String,
    /// Outgoing dependency edges.
    pub dependencies: Vec<Dependency>,
    /// Capabilities this package advertises (beyond its own name).
    pub provides: Vec<String>,
    /// Packages this one conflicts with.
    pub conflicts: Vec<String>,
    /// Packages this one obsoletes (RPM).
    pub obsoletes: Vec<String>,
    /// One-line description.
    pub description: Option<String>,
    /// License string.
    pub license: Option<String>,
}

impl Package {
    /// The identity tuple.
    #[must_use]
    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity {
            name: self.name.clone(),
            version: self.version.clone(),
            release: self.release.clone(),
            epoch: self.epoch,
            architecture: self.architecture,
        }
    }

    /// Full version string in the family's comparison grammar
    /// (`[epoch:]version[-release]`).
    #[must_use]
    pub fn full_version(&self) -> String {
        let mut s = String::new();
        if let Some(epoch) = self.epoch {
            if epoch != 0 {
                s.push_str(&epoch.to_string());
                s.push(':');
            }
        }
        s.push_str(&self.version);
        if let Some(release) = &self.release {
            s.push('-');
            s.push_str(release);
        }
        s
    }

    /// `(version, release)` pair used for conflict detection.
    #[must_use]
    pub fn version_release(&self) -> (String, Option<String>) {
        (self.version.clone(), self.release.clone())
    }

    /// Whether this package advertises the given capability, either as its
    /// own name or through `provides`.
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.name == capability
            || self
                .provides
                .iter()
                .any(|p| p == capability || capability_base(p) == capability)
    }

    /// On-disk filename under the family's convention.
    #[must_use]
    pub fn filename(&self) -> String {
        self.family.filename(self)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity())
    }
}

/// Strip a version or parenthesised suffix from a capability string:
/// `libfoo.so.1()(64bit)` becomes `libfoo.so.1`, `so:libssl.so.3=3` becomes
/// `so:libssl.so.3`.
#[must_use]
pub fn capability_base(capability: &str) -> &str {
    let end = capability
        .find(['(', '='])
        .unwrap_or(capability.len());
    capability[..end].trim_end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, version: &str, release: Option<&str>) -> Package {
        Package {
            name: name.into(),
            version: version.into(),
            release: release.map(Into::into),
            epoch: None,
            architecture: Architecture::X86_64,
            family: PackageFamily::Yum,
            size: 1024,
            installed_size: None,
            checksum: Checksum::new(ChecksumType::Sha256, "AB".repeat(32)),
            location: format!("Packages/{name}.rpm"),
            repo_id: "baseos".into(),
            dependencies: Vec::new(),
            provides: Vec::new(),
            conflicts: Vec::new(),
            obsoletes: Vec::new(),
            description: None,
            license: None,
        }
    }

    #[test]
    fn identity_includes_release_and_arch() {
        let a = sample("curl", "8.2.1", Some("1.el9"));
        let b = sample("curl", "8.2.1", Some("2.el9"));
        assert_ne!(a.identity(), b.identity());
        assert_eq!(a.identity(), a.identity());
    }

    #[test]
    fn filename_conventions() {
        let rpm = sample("curl", "8.2.1", Some("1.el9"));
        assert_eq!(rpm.filename(), "curl-8.2.1-1.el9.x86_64.rpm");

        let mut deb = sample("curl", "7.81.0-1ubuntu1", None);
        deb.family = PackageFamily::Apt;
        assert_eq!(deb.filename(), "curl_7.81.0-1ubuntu1_amd64.deb");

        let mut apk = sample("curl", "8.5.0-r0", None);
        apk.family = PackageFamily::Apk;
        assert_eq!(apk.filename(), "curl-8.5.0-r0.apk");
    }

    #[test]
    fn checksum_normalised_to_lowercase() {
        let c = Checksum::new(ChecksumType::Sha256, "ABCDEF");
        assert_eq!(c.value, "abcdef");
    }

    #[test]
    fn capability_base_strips_suffixes() {
        assert_eq!(capability_base("libfoo.so.1()(64bit)"), "libfoo.so.1");
        assert_eq!(capability_base("so:libssl.so.3=3"), "so:libssl.so.3");
        assert_eq!(capability_base("plain"), "plain");
    }

    #[test]
    fn provides_capability_lookup() {
        let mut pkg = sample("libssl3", "3.1.4-r5", None);
        pkg.provides = vec!["so:libssl.so.3=3".into()];
        assert!(pkg.has_capability("libssl3"));
        assert!(pkg.has_capability("so:libssl.so.3"));
        assert!(!pkg.has_capability("so:libcrypto.so.3"));
    }

    #[test]
    fn full_version_renders_evr() {
        let mut pkg = sample("httpd", "2.4.6", Some("45.el7"));
        assert_eq!(pkg.full_version(), "2.4.6-45.el7");
        pkg.epoch = Some(1);
        assert_eq!(pkg.full_version(), "1:2.4.6-45.el7");
    }

    #[test]
    fn operator_parse_table() {
        assert_eq!(DepOperator::parse("GE"), Some(DepOperator::Ge));
        assert_eq!(DepOperator::parse(">>"), Some(DepOperator::StrictGt));
        assert_eq!(DepOperator::parse("=="), Some(DepOperator::Eq));
        assert_eq!(DepOperator::parse("~"), None);
    }
}
