//! The dependency DAG.
//!
//! Nodes are keyed by `(name, version, architecture)` in an arena map so
//! edges can be recorded by stable key rather than pointer. Real
//! distribution graphs are cyclic; the topological sort detects back-edges
//! with a recursion-stack set, logs them, and drops them from the order
//! while keeping both nodes.

use petgraph::graph::{DiGraph, NodeIndex};
use smuggler_core::{AHashMap, Architecture, Package};
use tracing::debug;

/// Stable node key: the resolver's identity for graph purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    /// Package name.
    pub name: String,
    /// Full version string.
    pub version: String,
    /// Architecture.
    pub arch: Architecture,
}

impl NodeKey {
    /// Key for a package.
    #[must_use]
    pub fn of(pkg: &Package) -> Self {
        Self {
            name: pkg.name.clone(),
            version: pkg.full_version(),
            arch: pkg.architecture,
        }
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.version, self.arch)
    }
}

/// Dependency graph with key-addressed nodes.
#[derive(Debug, Default)]
pub struct DepGraph {
    graph: DiGraph<NodeKey, String>,
    indices: AHashMap<NodeKey, NodeIndex>,
}

impl DepGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning its index; an existing key is reused.
    pub fn add_node(&mut self, key: NodeKey) -> NodeIndex {
        if let Some(&idx) = self.indices.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(key.clone());
        self.indices.insert(key, idx);
        idx
    }

    /// Record a dependency edge from `from` to `to`, labelled with the
    /// triggering dependency's display form.
    pub fn add_edge(&mut self, from: &NodeKey, to: &NodeKey, label: String) {
        let from = self.add_node(from.clone());
        let to = self.add_node(to.clone());
        if from != to && self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, label);
        }
    }

    /// Whether the key is already a node.
    #[must_use]
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.indices.contains_key(key)
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Dependencies-first order via depth-first post-order.
    ///
    /// Back-edges (cycles) are reported in the second element and excluded
    /// from the order; every node still appears exactly once.
    #[must_use]
    pub fn install_order(&self) -> (Vec<NodeKey>, Vec<String>) {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Unvisited,
            OnStack,
            Done,
        }

        let mut state = vec![State::Unvisited; self.graph.node_count()];
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut cycles = Vec::new();

        // roots in insertion order keep the output deterministic
        for start in self.graph.node_indices() {
            if state[start.index()] != State::Unvisited {
                continue;
            }

            // iterative DFS: (node, sorted child list, next child position)
            let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = Vec::new();
            state[start.index()] = State::OnStack;
            stack.push((start, self.sorted_children(start), 0));

            loop {
                let next_child = {
                    let Some((node, children, pos)) = stack.last_mut() else {
                        break;
                    };
                    match children.get(*pos) {
                        Some(&child) => {
                            *pos += 1;
                            Some((*node, child))
                        }
                        None => None,
                    }
                };

                match next_child {
                    Some((parent, child)) => match state[child.index()] {
                        State::Unvisited => {
                            state[child.index()] = State::OnStack;
                            let grandchildren = self.sorted_children(child);
                            stack.push((child, grandchildren, 0));
                        }
                        State::OnStack => {
                            let cycle = format!(
                                "dependency cycle: {} -> {}",
                                self.graph[parent], self.graph[child]
                            );
                            debug!("{cycle}");
                            cycles.push(cycle);
                        }
                        State::Done => {}
                    },
                    None => {
                        if let Some((node, _, _)) = stack.pop() {
                            state[node.index()] = State::Done;
                            order.push(self.graph[node].clone());
                        }
                    }
                }
            }
        }

        (order, cycles)
    }

    /// Outgoing neighbours in insertion order (petgraph iterates edges
    /// newest-first, which would make the order depend on edge history).
    fn sorted_children(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors(node)
            .collect();
        children.reverse();
        children.dedup();
        children
    }
}
