// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving buses and branches from a [`FeederGraph`].

use petgraph::graph::NodeIndex;

use crate::iterators::{Branches, Buses, Neighbors};
use crate::records::{Branch, Bus};
use crate::Error;

use super::FeederGraph;

/// `Bus` and `Branch` retrieval.
impl FeederGraph {
    /// Returns the bus with the given code, if it exists.
    pub fn bus(&self, code: &str) -> Result<&Bus, Error> {
        self.node_indices
            .get(code)
            .map(|idx| &self.graph[*idx])
            .ok_or_else(|| Error::bus_not_found(format!("Bus with code {} not found.", code)))
    }

    /// Returns the branch between the given buses, looked up in either
    /// direction.
    pub fn branch(&self, from: &str, to: &str) -> Result<&Branch, Error> {
        let from_idx = self.index_of(from)?;
        let to_idx = self.index_of(to)?;
        self.graph
            .find_edge_undirected(from_idx, to_idx)
            .map(|(edge, _)| &self.graph[edge])
            .ok_or_else(|| {
                Error::branch_not_found(format!("Branch between {} and {} not found.", from, to))
            })
    }

    /// Returns an iterator over the buses in the graph, in lexicographic
    /// code order.
    pub fn buses(&self) -> Buses<'_> {
        Buses {
            graph: &self.graph,
            iter: self.node_indices.values(),
        }
    }

    /// Returns an iterator over the branches in the graph, with their
    /// endpoint bus codes.
    pub fn branches(&self) -> Branches<'_> {
        Branches {
            graph: &self.graph,
            iter: self.graph.raw_edges().iter(),
        }
    }

    /// Returns an iterator over the *successors* of the bus with the given
    /// code: its neighbors away from the source.
    ///
    /// Returns an error if the given code does not exist.
    pub fn successors(&self, code: &str) -> Result<Neighbors<'_>, Error> {
        self.index_of(code).map(|idx| Neighbors {
            graph: &self.graph,
            iter: self
                .graph
                .neighbors_directed(idx, petgraph::Direction::Outgoing),
        })
    }

    /// Returns an iterator over the *predecessors* of the bus with the
    /// given code: its neighbors towards the source.
    ///
    /// Returns an error if the given code does not exist.
    pub fn predecessors(&self, code: &str) -> Result<Neighbors<'_>, Error> {
        self.index_of(code).map(|idx| Neighbors {
            graph: &self.graph,
            iter: self
                .graph
                .neighbors_directed(idx, petgraph::Direction::Incoming),
        })
    }

    pub(crate) fn index_of(&self, code: &str) -> Result<NodeIndex, Error> {
        self.node_indices
            .get(code)
            .copied()
            .ok_or_else(|| Error::bus_not_found(format!("Bus with code {} not found.", code)))
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::FeederBuilder;
    use crate::Error;

    #[test]
    fn test_bus_and_branch_lookup() -> Result<(), Error> {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").bus("B3");
        builder.line("L1", "B1", "B2").line("L2", "B2", "B3");
        builder.source("SRC", "B1");
        let graph = builder.build()?;

        assert_eq!(graph.bus("B2")?.code, "B2");
        assert_eq!(
            graph.bus("B9"),
            Err(Error::bus_not_found("Bus with code B9 not found."))
        );

        assert_eq!(graph.branch("B1", "B2")?.code, "L1");
        // Lookup works against the stored direction too.
        assert_eq!(graph.branch("B2", "B1")?.code, "L1");
        assert_eq!(
            graph.branch("B1", "B3"),
            Err(Error::branch_not_found("Branch between B1 and B3 not found."))
        );
        Ok(())
    }

    #[test]
    fn test_iteration_order_is_lexicographic() -> Result<(), Error> {
        let mut builder = FeederBuilder::new();
        builder.bus("B3").bus("B1").bus("B2");
        builder.line("L1", "B1", "B2").line("L2", "B2", "B3");
        builder.source("SRC", "B1");
        let graph = builder.build()?;

        let codes: Vec<&str> = graph.buses().map(|bus| bus.code.as_str()).collect();
        assert_eq!(codes, vec!["B1", "B2", "B3"]);
        Ok(())
    }

    #[test]
    fn test_neighbors() -> Result<(), Error> {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").bus("B3").bus("B4");
        builder.line("L1", "B1", "B2");
        builder.line("L2", "B2", "B3");
        builder.line("L3", "B2", "B4");
        builder.source("SRC", "B1");
        let graph = builder.build()?;

        let mut successors: Vec<&str> = graph
            .successors("B2")?
            .map(|bus| bus.code.as_str())
            .collect();
        successors.sort();
        assert_eq!(successors, vec!["B3", "B4"]);

        let predecessors: Vec<&str> = graph
            .predecessors("B2")?
            .map(|bus| bus.code.as_str())
            .collect();
        assert_eq!(predecessors, vec!["B1"]);

        assert!(graph.predecessors("B1")?.next().is_none());
        assert!(graph
            .successors("B9")
            .is_err_and(|e| e == Error::bus_not_found("Bus with code B9 not found.")));
        Ok(())
    }
}
