//! Per-family resolution behaviour.
//!
//! One driver plus a small capability-pack per family replaces the deep
//! class hierarchy a per-manager design would suggest: the only things
//! that actually differ are the version order, the extra capability keys a
//! lookup should try, and how optional edges are gated.

use crate::ResolverOptions;
use smuggler_core::package::capability_base;
use smuggler_core::{DepKind, Dependency, Package, PackageFamily};
use std::cmp::Ordering;

/// Family-specific hooks the resolver driver consults.
#[derive(Debug, Clone, Copy)]
pub struct FamilyOps {
    family: PackageFamily,
}

impl FamilyOps {
    /// The pack for a family.
    #[must_use]
    pub const fn new(family: PackageFamily) -> Self {
        Self { family }
    }

    /// The family.
    #[must_use]
    pub const fn family(&self) -> PackageFamily {
        self.family
    }

    /// Optional out-of-band dependency source.
    ///
    /// The design leaves room for an API-backed dependency feed per
    /// family; none of the three currently has one, so metadata-derived
    /// dependencies are always used.
    #[must_use]
    pub fn deps_override(&self, _pkg: &Package) -> Option<Vec<Dependency>> {
        None
    }

    /// Alternate lookup keys to try when a capability finds no candidates
    /// under its literal name.
    ///
    /// - APK: `so:` and `cmd:` prefixed forms of bare names
    /// - YUM: the name with any `(...)` suffix stripped
    /// - APT: the name with any `:arch` qualifier stripped
    #[must_use]
    pub fn candidate_keys(&self, dep_name: &str) -> Vec<String> {
        let mut keys = Vec::new();
        match self.family {
            PackageFamily::Apk => {
                if !dep_name.contains(':') {
                    keys.push(format!("so:{dep_name}"));
                    keys.push(format!("cmd:{dep_name}"));
                }
            }
            PackageFamily::Yum => {
                let base = capability_base(dep_name);
                if base != dep_name {
                    keys.push(base.to_string());
                }
            }
            PackageFamily::Apt => {
                if let Some((base, _arch)) = dep_name.split_once(':') {
                    if !base.is_empty() {
                        keys.push(base.to_string());
                    }
                }
            }
        }
        keys
    }

    /// Whether an edge is followed under the given options.
    #[must_use]
    pub fn follows(&self, dep: &Dependency, options: &ResolverOptions) -> bool {
        match dep.kind {
            DepKind::Requires => true,
            DepKind::Recommends => options.include_recommends,
            DepKind::Suggests => options.include_optional,
        }
    }

    /// Compare two packages for best-match selection: higher version
    /// first, ties broken by repository rank.
    #[must_use]
    pub fn best_match_cmp(
        &self,
        a: &Package,
        a_rank: (u32, bool, usize),
        b: &Package,
        b_rank: (u32, bool, usize),
    ) -> Ordering {
        // highest version wins
        self.family
            .compare(&a.full_version(), &b.full_version())
            // lower priority number wins
            .then_with(|| b_rank.0.cmp(&a_rank.0))
            // official before unofficial
            .then_with(|| a_rank.1.cmp(&b_rank.1))
            // earlier indexing wins
            .then_with(|| b_rank.2.cmp(&a_rank.2))
    }
}
