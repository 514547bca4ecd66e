//! The resolver driver.

use crate::family::FamilyOps;
use crate::graph::{DepGraph, NodeKey};
use crate::types::{MissingReason, ResolutionResult, UnresolvedDep, VersionConflict};
use smuggler_catalog::Repository;
use smuggler_core::{AHashMap, AHashSet, Architecture, Dependency, Package, PackageIdentity};
use smuggler_index::PackageUniverse;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Depth beyond which an advisory warning is emitted.
const DEPTH_WARNING: usize = 10;

/// Resolver options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverOptions {
    /// Follow optional dependencies (APT `Suggests`, RPM weak deps).
    pub include_optional: bool,
    /// Follow APT `Recommends`.
    pub include_recommends: bool,
}

/// Repository rank used for best-match tie-breaking:
/// `(priority, official, first-indexed order)`.
type RepoRank = (u32, bool, usize);

/// Resolves requested packages into a deterministic install order.
///
/// The resolver is single-threaded per resolve; its mutable state (graph,
/// visited set, conflict map) is local to the [`Resolver::resolve`] call.
#[derive(Debug)]
pub struct Resolver<'a> {
    universe: &'a PackageUniverse,
    ops: FamilyOps,
    options: ResolverOptions,
    target_arch: Architecture,
    repo_ranks: AHashMap<String, RepoRank>,
}

/// Mutable state of one resolve.
#[derive(Debug, Default)]
struct ResolveState {
    graph: DepGraph,
    visited: AHashSet<NodeKey>,
    selected: Vec<Package>,
    selected_ids: AHashSet<PackageIdentity>,
    extra_variants: Vec<Package>,
    unresolved: Vec<UnresolvedDep>,
    conflicts: BTreeMap<String, Vec<String>>,
    warnings: Vec<String>,
    depth_warned: bool,
}

impl<'a> Resolver<'a> {
    /// Create a resolver over a candidate universe.
    #[must_use]
    pub fn new(
        universe: &'a PackageUniverse,
        target_arch: Architecture,
        options: ResolverOptions,
    ) -> Self {
        Self {
            universe,
            ops: FamilyOps::new(universe.family()),
            options,
            target_arch,
            repo_ranks: AHashMap::new(),
        }
    }

    /// Attach repository descriptors for priority/official tie-breaking.
    #[must_use]
    pub fn with_repositories(mut self, repos: &[&Repository]) -> Self {
        for (order, repo) in repos.iter().enumerate() {
            self.repo_ranks.insert(
                repo.id.clone(),
                (repo.priority.unwrap_or(u32::MAX), repo.official, order),
            );
        }
        self
    }

    fn rank(&self, pkg: &Package) -> RepoRank {
        self.repo_ranks
            .get(&pkg.repo_id)
            .copied()
            .unwrap_or((u32::MAX, false, usize::MAX))
    }

    /// Resolve a list of requested package names.
    ///
    /// Unknown names become `not_found` entries; everything else proceeds.
    #[must_use]
    pub fn resolve_names(&self, names: &[&str]) -> ResolutionResult {
        let mut requested = Vec::new();
        let mut state = ResolveState::default();

        for &name in names {
            let candidates = self.universe.candidates(name);
            if let Some(best) = self.select_candidate(&candidates) {
                requested.push(best.clone());
            } else {
                state.unresolved.push(UnresolvedDep {
                    requester: "<request>".to_string(),
                    dependency: Dependency::on(name),
                    reason: MissingReason::NotFound,
                });
            }
        }

        self.run(requested, state)
    }

    /// Resolve an explicit set of requested packages.
    #[must_use]
    pub fn resolve(&self, requested: Vec<Package>) -> ResolutionResult {
        self.run(requested, ResolveState::default())
    }

    fn run(&self, requested: Vec<Package>, mut state: ResolveState) -> ResolutionResult {
        for pkg in &requested {
            self.visit(pkg, 0, &mut state);
        }

        let (order, cycles) = state.graph.install_order();
        for cycle in cycles {
            state.warnings.push(cycle);
        }

        // map node keys back to the selected packages, install order first
        let mut by_key: AHashMap<NodeKey, Package> = state
            .selected
            .into_iter()
            .map(|p| (NodeKey::of(&p), p))
            .collect();
        let mut packages = Vec::with_capacity(order.len());
        for key in order {
            if let Some(pkg) = by_key.remove(&key) {
                packages.push(pkg);
            }
        }

        // retained conflict variants ride along at the end, dedup by identity
        let mut seen: AHashSet<PackageIdentity> =
            packages.iter().map(Package::identity).collect();
        for variant in state.extra_variants {
            if seen.insert(variant.identity()) {
                packages.push(variant);
            }
        }

        let conflicts = state
            .conflicts
            .into_iter()
            .map(|(capability, versions)| VersionConflict {
                capability,
                versions,
            })
            .collect();

        let result = ResolutionResult {
            packages,
            unresolved: state.unresolved,
            conflicts,
            warnings: state.warnings,
        };
        info!(
            packages = result.packages.len(),
            unresolved = result.unresolved.len(),
            conflicts = result.conflicts.len(),
            "resolution complete"
        );
        result
    }

    fn visit(&self, pkg: &Package, depth: usize, state: &mut ResolveState) {
        let key = NodeKey::of(pkg);
        if !state.visited.insert(key.clone()) {
            return;
        }
        state.graph.add_node(key.clone());
        if state.selected_ids.insert(pkg.identity()) {
            state.selected.push(pkg.clone());
        }

        if depth > DEPTH_WARNING && !state.depth_warned {
            state.depth_warned = true;
            state.warnings.push(format!(
                "dependency chain deeper than {DEPTH_WARNING} at {}",
                pkg.name
            ));
        }

        let deps = self
            .ops
            .deps_override(pkg)
            .unwrap_or_else(|| pkg.dependencies.clone());

        for dep in &deps {
            if !self.ops.follows(dep, &self.options) {
                continue;
            }
            self.visit_dependency(pkg, &key, dep, depth, state);
        }
    }

    fn visit_dependency(
        &self,
        pkg: &Package,
        key: &NodeKey,
        dep: &Dependency,
        depth: usize,
        state: &mut ResolveState,
    ) {
        // literal name first, then the family's alternate keys
        let mut candidates = self.universe.candidates(&dep.name);
        if candidates.is_empty() {
            for alt in self.ops.candidate_keys(&dep.name) {
                candidates = self.universe.candidates(&alt);
                if !candidates.is_empty() {
                    debug!(dep = %dep.name, via = %alt, "capability matched through alternate key");
                    break;
                }
            }
        }

        if candidates.is_empty() {
            debug!(requester = %pkg.name, dep = %dep.name, "no candidates");
            state.unresolved.push(UnresolvedDep {
                requester: pkg.name.clone(),
                dependency: dep.clone(),
                reason: MissingReason::NotFound,
            });
            return;
        }

        // version constraint
        if let (Some(op), Some(required)) = (dep.op, &dep.version) {
            candidates.retain(|c| {
                self.ops
                    .family()
                    .matches(&c.full_version(), op, required)
            });
            if candidates.is_empty() {
                state.unresolved.push(UnresolvedDep {
                    requester: pkg.name.clone(),
                    dependency: dep.clone(),
                    reason: MissingReason::VersionMismatch,
                });
                return;
            }
        }

        // architecture compatibility
        candidates.retain(|c| c.architecture.is_compatible(self.target_arch));
        if candidates.is_empty() {
            state.unresolved.push(UnresolvedDep {
                requester: pkg.name.clone(),
                dependency: dep.clone(),
                reason: MissingReason::ArchitectureMismatch,
            });
            return;
        }

        // A capability served by several distinct package names is a
        // virtual: the first provider indexed wins and version comparison
        // across unrelated packages is not attempted.
        let distinct_names: AHashSet<&str> =
            candidates.iter().map(|c| c.name.as_str()).collect();
        let best = if distinct_names.len() > 1 {
            debug!(capability = %dep.name, provider = %candidates[0].name, "virtual capability");
            candidates[0]
        } else {
            // conflict: two or more distinct (version, release) pairs remain
            let mut distinct: Vec<&Package> = Vec::new();
            for &candidate in &candidates {
                if !distinct
                    .iter()
                    .any(|d| d.version_release() == candidate.version_release())
                {
                    distinct.push(candidate);
                }
            }
            if distinct.len() >= 2 {
                let mut versions: Vec<String> =
                    distinct.iter().map(|p| p.full_version()).collect();
                versions.sort_by(|a, b| self.ops.family().compare(b, a));
                warn!(capability = %dep.name, versions = ?versions, "version conflict");
                state
                    .conflicts
                    .entry(dep.name.clone())
                    .or_insert(versions);
                // every distinct variant flows into the download set
                for &variant in &distinct {
                    state.extra_variants.push(variant.clone());
                }
            }

            let Some(best) = self.pick_best(&candidates) else {
                return;
            };
            best
        };

        state
            .graph
            .add_edge(key, &NodeKey::of(best), dep.to_string());
        self.visit(best, depth + 1, state);
    }

    /// Selection for a requested capability: first provider indexed when
    /// several distinct package names serve it, version best-match
    /// otherwise.
    fn select_candidate<'p>(&self, candidates: &[&'p Package]) -> Option<&'p Package> {
        let distinct_names: AHashSet<&str> =
            candidates.iter().map(|c| c.name.as_str()).collect();
        if distinct_names.len() > 1 {
            candidates.first().copied()
        } else {
            self.pick_best(candidates)
        }
    }

    /// Best-match rule: highest version under the family order, ties by
    /// repository priority, official flag, then first-indexed.
    fn pick_best<'p>(&self, candidates: &[&'p Package]) -> Option<&'p Package> {
        let mut best: Option<&'p Package> = None;
        for &candidate in candidates {
            best = match best {
                None => Some(candidate),
                Some(current) => {
                    let ord = self.ops.best_match_cmp(
                        candidate,
                        self.rank(candidate),
                        current,
                        self.rank(current),
                    );
                    if ord == std::cmp::Ordering::Greater {
                        Some(candidate)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best
    }
}
