// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A graph representation of the buses of a distribution feeder and the
//! line segments between them.

mod area;
mod creation;
mod equivalents;
mod lumped;
mod radialize;
mod retrieval;

pub mod iterators;

#[cfg(test)]
pub(crate) mod test_utils;

pub use area::{Frontier, FrontierPoint};
pub use equivalents::EquivalentGraph;

use std::collections::BTreeMap;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::config::FeederGraphConfig;
use crate::records::{Branch, Bus};

/// `Bus`es stored in a `DiGraph` instance can be addressed with
/// `NodeIndex`es.
///
/// `NodeIndexMap` stores the corresponding `NodeIndex` for any bus code, so
/// that buses in the `DiGraph` can be retrieved from their codes. A
/// `BTreeMap` keeps bus iteration in lexicographic code order, which makes
/// every derived ordering reproducible across runs.
pub(crate) type NodeIndexMap = BTreeMap<String, NodeIndex>;

/// A radial graph representation of a distribution feeder.
///
/// Once created, the graph is radial: every branch is oriented away from
/// the main source bus and there is exactly one path from the source to any
/// bus.
#[derive(Debug)]
pub struct FeederGraph {
    pub(crate) graph: DiGraph<Bus, Branch>,
    pub(crate) node_indices: NodeIndexMap,
    pub(crate) main_source_bus: String,
    pub(crate) config: FeederGraphConfig,
}

/// Iterates over the neighbors of `u` in the undirected view of `graph`,
/// together with the connecting edge.
pub(crate) fn undirected_neighbors(
    graph: &DiGraph<Bus, Branch>,
    u: NodeIndex,
) -> impl Iterator<Item = (NodeIndex, EdgeIndex)> + '_ {
    graph
        .edges_directed(u, Direction::Outgoing)
        .map(|edge| (edge.target(), edge.id()))
        .chain(
            graph
                .edges_directed(u, Direction::Incoming)
                .map(|edge| (edge.source(), edge.id())),
        )
}

impl FeederGraph {
    /// Returns the code of the main source bus, the root of the radial
    /// graph.
    pub fn main_source_bus(&self) -> &str {
        &self.main_source_bus
    }

    /// Returns the configuration the graph was created with.
    pub fn config(&self) -> &FeederGraphConfig {
        &self.config
    }

    /// Returns the number of buses in the graph.
    pub fn bus_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of branches in the graph.
    pub fn branch_count(&self) -> usize {
        self.graph.edge_count()
    }
}
