// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for extracting the out-of-area remnants of a [`FeederGraph`]
//! into independently owned equivalent graphs, each attached to a
//! synthetic boundary bus.

use std::collections::HashSet;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::records::{Branch, Bus};
use crate::Error;

use super::area::Frontier;
use super::{undirected_neighbors, FeederGraph, NodeIndexMap};

/// A connected out-of-area remnant plus the synthetic boundary bus standing
/// in for its frontier bus.
///
/// Equivalent graphs own their buses and branches outright; building or
/// reducing one never touches the feeder graph it was extracted from.
pub struct EquivalentGraph {
    pub(crate) graph: DiGraph<Bus, Branch>,
    pub(crate) node_indices: NodeIndexMap,
    pub(crate) boundary_bus: String,
    pub(crate) frontier_bus: String,
    pub(crate) source_bus: Option<String>,
}

impl EquivalentGraph {
    /// The code of the synthetic boundary bus the remnant hangs from.
    pub fn boundary_bus(&self) -> &str {
        &self.boundary_bus
    }

    /// The code of the frontier bus the boundary bus was copied from.
    pub fn frontier_bus(&self) -> &str {
        &self.frontier_bus
    }

    /// Returns true if the remnant contains the main source bus, so that
    /// reducing it must account for the path back to the supply.
    pub fn contains_source(&self) -> bool {
        self.source_bus.is_some()
    }

    /// Returns the number of buses, the boundary bus included.
    pub fn bus_count(&self) -> usize {
        self.graph.node_count()
    }
}

/// Mints codes for synthetic boundary buses.
///
/// One allocator lives per extraction run, so repeated runs never
/// interfere with each other.
struct BoundaryAllocator {
    next: usize,
}

impl BoundaryAllocator {
    fn new() -> Self {
        BoundaryAllocator { next: 0 }
    }

    fn mint(&mut self, bus: &str) -> String {
        let code = format!("{}-eq{}", bus, self.next);
        self.next += 1;
        code
    }
}

/// Equivalent graph extraction.
impl FeederGraph {
    /// Builds one [`EquivalentGraph`] per disjoint out-of-area remnant.
    ///
    /// The remnants are found by removing every in-area bus from a copy of
    /// the radial graph; each frontier branch then re-attaches its remnant
    /// to a synthetic boundary bus copied from the frontier bus.
    pub fn equivalent_graphs(&self, frontier: &Frontier) -> Result<Vec<EquivalentGraph>, Error> {
        let mut pruned: DiGraph<Bus, Branch> = DiGraph::new();
        let mut indices = NodeIndexMap::new();
        for (code, &idx) in &self.node_indices {
            if !self.graph[idx].in_area {
                let pruned_idx = pruned.add_node(self.graph[idx].clone());
                indices.insert(code.clone(), pruned_idx);
            }
        }
        for edge in self.graph.edge_indices() {
            let (u, v) = self
                .graph
                .edge_endpoints(edge)
                .ok_or_else(|| Error::internal("Branch without endpoints."))?;
            let (u, v) = (&self.graph[u], &self.graph[v]);
            if !u.in_area && !v.in_area {
                pruned.add_edge(indices[&u.code], indices[&v.code], self.graph[edge].clone());
            }
        }

        let mut allocator = BoundaryAllocator::new();
        let mut boundaries: Vec<(String, String)> = Vec::new();
        for point in frontier {
            let (from, to) = &point.branch;
            let branch = self.branch(from, to)?.clone();
            let mut boundary = self.bus(&point.bus)?.clone();
            let code = allocator.mint(&point.bus);
            boundary.code = code.clone();
            boundary.in_area = false;
            let boundary_idx = pruned.add_node(boundary);
            indices.insert(code.clone(), boundary_idx);

            // The copied branch keeps its stored direction; the boundary
            // bus takes the in-area endpoint's place.
            let excluded = if point.bus == *from { to } else { from };
            let excluded_idx = indices.get(excluded).copied().ok_or_else(|| {
                Error::invalid_graph(format!(
                    "Frontier branch ({from}, {to}) has no out-of-area endpoint."
                ))
            })?;
            if point.bus == *from {
                pruned.add_edge(boundary_idx, excluded_idx, branch);
            } else {
                pruned.add_edge(excluded_idx, boundary_idx, branch);
            }
            boundaries.push((code, point.bus.clone()));
        }

        self.split_components(&pruned, &indices, &boundaries)
    }

    /// Splits the pruned graph into its connected components, each one an
    /// independently owned equivalent graph.
    fn split_components(
        &self,
        pruned: &DiGraph<Bus, Branch>,
        indices: &NodeIndexMap,
        boundaries: &[(String, String)],
    ) -> Result<Vec<EquivalentGraph>, Error> {
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut equivalents = Vec::new();

        for &seed in indices.values() {
            if visited.contains(&seed) {
                continue;
            }
            let mut component: HashSet<NodeIndex> = HashSet::from([seed]);
            let mut stack = vec![seed];
            visited.insert(seed);
            while let Some(u) = stack.pop() {
                for (v, _) in undirected_neighbors(pruned, u) {
                    if visited.insert(v) {
                        component.insert(v);
                        stack.push(v);
                    }
                }
            }

            let mut graph = DiGraph::new();
            let mut node_indices = NodeIndexMap::new();
            for (code, &idx) in indices {
                if component.contains(&idx) {
                    let new_idx = graph.add_node(pruned[idx].clone());
                    node_indices.insert(code.clone(), new_idx);
                }
            }
            for edge in pruned.edge_indices() {
                let (u, v) = pruned
                    .edge_endpoints(edge)
                    .ok_or_else(|| Error::internal("Branch without endpoints."))?;
                if component.contains(&u) {
                    graph.add_edge(
                        node_indices[&pruned[u].code],
                        node_indices[&pruned[v].code],
                        pruned[edge].clone(),
                    );
                }
            }

            let mut in_component = boundaries
                .iter()
                .filter(|(code, _)| node_indices.contains_key(code));
            let (boundary_bus, frontier_bus) = in_component
                .next()
                .ok_or_else(|| {
                    Error::internal("Out-of-area remnant without a frontier branch.")
                })?
                .clone();
            if in_component.next().is_some() {
                return Err(Error::internal(
                    "Out-of-area remnant attached to more than one boundary bus.",
                ));
            }

            let source_bus = node_indices
                .contains_key(&self.main_source_bus)
                .then(|| self.main_source_bus.clone());

            equivalents.push(EquivalentGraph {
                graph,
                node_indices,
                boundary_bus,
                frontier_bus,
                source_bus,
            });
        }

        Ok(equivalents)
    }
}
