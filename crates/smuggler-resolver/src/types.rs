//! Resolution result types.

use smuggler_core::{Dependency, Package, PackageIdentity};

/// Why a dependency could not be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReason {
    /// No candidate advertises the capability.
    NotFound,
    /// Candidates exist but none satisfies the version constraint.
    VersionMismatch,
    /// Candidates exist but none is installable on the target.
    ArchitectureMismatch,
}

impl MissingReason {
    /// Stable identifier for logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::VersionMismatch => "version_mismatch",
            Self::ArchitectureMismatch => "architecture_mismatch",
        }
    }
}

/// A dependency edge the resolver could not satisfy.
#[derive(Debug, Clone)]
pub struct UnresolvedDep {
    /// Package that demanded the capability.
    pub requester: String,
    /// The unsatisfied edge.
    pub dependency: Dependency,
    /// Why it failed.
    pub reason: MissingReason,
}

/// Multiple distinct versions satisfied one capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    /// The contested capability.
    pub capability: String,
    /// Every distinct version that matched, highest first.
    pub versions: Vec<String>,
}

/// The outcome of a resolve.
///
/// Unresolved edges and conflicts are data, not errors: the resolve always
/// completes and reports what it found.
#[derive(Debug, Default)]
pub struct ResolutionResult {
    /// Selected packages in install order (dependencies first), followed by
    /// retained conflict variants. Free of duplicates under the identity
    /// tuple.
    pub packages: Vec<Package>,
    /// Edges that could not be satisfied.
    pub unresolved: Vec<UnresolvedDep>,
    /// Capabilities satisfied by more than one distinct version.
    pub conflicts: Vec<VersionConflict>,
    /// Advisory warnings (deep chains, dropped cycle edges).
    pub warnings: Vec<String>,
}

impl ResolutionResult {
    /// Whether every edge resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Find a resolved package by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Position of a package in the install order.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.packages.iter().position(|p| p.name == name)
    }

    /// Identity tuples of the selected set.
    #[must_use]
    pub fn identities(&self) -> Vec<PackageIdentity> {
        self.packages.iter().map(Package::identity).collect()
    }

    /// Total download size in bytes.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.packages.iter().map(|p| p.size).sum()
    }
}
