// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for turning the raw feeder graph into a radial graph: cycles are
//! broken by opening switched branches, and every remaining branch is
//! re-oriented to point away from the main source bus.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

use crate::Error;

use super::{undirected_neighbors, FeederGraph, NodeIndexMap};

/// A cycle discovered in the undirected view of the graph.
struct CyclePath {
    /// The edges of the cycle, in path order.
    edges: Vec<EdgeIndex>,
    /// The bus codes along the cycle, closed (first == last).
    buses: Vec<String>,
}

/// Radialization.
impl FeederGraph {
    /// Breaks every cycle reachable from the main source bus by opening one
    /// switched branch per cycle, then re-orients all remaining branches
    /// away from the source.
    ///
    /// Returns a `CyclicGraph` error if a discovered cycle carries no
    /// switch on any of its branches.
    pub(crate) fn radialize(&mut self) -> Result<(), Error> {
        let root = self.index_of(&self.main_source_bus)?;

        while let Some(cycle) = self.find_cycle(root) {
            self.open_cycle(&cycle)?;
        }

        self.orient_from_root(root)
    }

    /// Finds one cycle through the component of `root`, if any exists.
    fn find_cycle(&self, root: NodeIndex) -> Option<CyclePath> {
        let mut parent: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut stack = vec![root];
        visited.insert(root);

        while let Some(u) = stack.pop() {
            let parent_edge = parent.get(&u).map(|(_, edge)| *edge);
            for (v, edge) in undirected_neighbors(&self.graph, u) {
                if Some(edge) == parent_edge {
                    continue;
                }
                if visited.contains(&v) {
                    return Some(self.cycle_path(&parent, u, v, edge));
                }
                visited.insert(v);
                parent.insert(v, (u, edge));
                stack.push(v);
            }
        }

        None
    }

    /// Reconstructs the cycle closed by `closing_edge` between `u` and `v`
    /// from the DFS parent chains.
    fn cycle_path(
        &self,
        parent: &HashMap<NodeIndex, (NodeIndex, EdgeIndex)>,
        u: NodeIndex,
        v: NodeIndex,
        closing_edge: EdgeIndex,
    ) -> CyclePath {
        let mut u_chain = vec![u];
        let mut node = u;
        while let Some((p, _)) = parent.get(&node) {
            u_chain.push(*p);
            node = *p;
        }
        let u_ancestors: HashSet<NodeIndex> = u_chain.iter().copied().collect();

        // Walk up from `v` to the first common ancestor.
        let mut v_chain = vec![v];
        let mut v_edges = Vec::new();
        let mut node = v;
        while !u_ancestors.contains(&node) {
            let (p, edge) = parent[&node];
            v_edges.push(edge);
            v_chain.push(p);
            node = p;
        }
        let lca = node;

        let mut edges = Vec::new();
        let mut buses = vec![self.graph[u].code.clone()];
        let mut node = u;
        while node != lca {
            let (p, edge) = parent[&node];
            edges.push(edge);
            buses.push(self.graph[p].code.clone());
            node = p;
        }
        for (p, edge) in v_chain.iter().rev().skip(1).zip(v_edges.iter().rev()) {
            edges.push(*edge);
            buses.push(self.graph[*p].code.clone());
        }
        edges.push(closing_edge);
        buses.push(self.graph[u].code.clone());

        CyclePath { edges, buses }
    }

    /// Opens the first switched branch on the cycle, or fails if the cycle
    /// cannot be opened.
    fn open_cycle(&mut self, cycle: &CyclePath) -> Result<(), Error> {
        let opened = cycle
            .edges
            .iter()
            .find(|&&edge| self.graph[edge].has_switch())
            .copied();

        let Some(edge) = opened else {
            return Err(Error::cyclic_graph(format!(
                "Can't radialize cyclic feeder: no switch can be opened on cycle {}.",
                cycle.buses.join(" -> ")
            )));
        };

        let branch = self
            .graph
            .remove_edge(edge)
            .ok_or_else(|| Error::internal("Cycle edge disappeared before removal."))?;
        tracing::info!(
            branch = %branch.code,
            cycle = %cycle.buses.join(" -> "),
            "Opened a switched branch to break a cycle."
        );
        Ok(())
    }

    /// Rebuilds the graph with every branch oriented along the unique path
    /// from the root to the leaves.
    ///
    /// After cycle removal the graph is a tree, so a breadth-first
    /// traversal from the root fixes each branch's direction. Neighbors
    /// are visited in lexicographic code order to keep branch iteration
    /// deterministic.
    fn orient_from_root(&mut self, root: NodeIndex) -> Result<(), Error> {
        let mut oriented: DiGraph<_, _> = DiGraph::new();
        let mut indices = NodeIndexMap::new();
        for (code, &old_idx) in &self.node_indices {
            let idx = oriented.add_node(self.graph[old_idx].clone());
            indices.insert(code.clone(), idx);
        }

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut queue = VecDeque::from([root]);
        visited.insert(root);
        while let Some(u) = queue.pop_front() {
            let mut neighbors: Vec<(NodeIndex, EdgeIndex)> =
                undirected_neighbors(&self.graph, u)
                    .filter(|(v, _)| !visited.contains(v))
                    .collect();
            neighbors.sort_by(|(a, _), (b, _)| self.graph[*a].code.cmp(&self.graph[*b].code));

            for (v, edge) in neighbors {
                if !visited.insert(v) {
                    continue;
                }
                oriented.add_edge(
                    indices[&self.graph[u].code],
                    indices[&self.graph[v].code],
                    self.graph[edge].clone(),
                );
                queue.push_back(v);
            }
        }

        if visited.len() != self.graph.node_count() {
            let unvisited: BTreeSet<&str> = self
                .node_indices
                .iter()
                .filter(|(_, idx)| !visited.contains(idx))
                .map(|(code, _)| code.as_str())
                .collect();
            return Err(Error::invalid_graph(format!(
                "Buses {:?} are not connected to the main source bus.",
                unvisited
            )));
        }

        self.graph = oriented;
        self.node_indices = indices;
        Ok(())
    }
}
