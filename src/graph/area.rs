// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for selecting the area of interest of a [`FeederGraph`] and
//! recording its frontier.

use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::Error;

use super::{undirected_neighbors, FeederGraph};

/// One attachment point between the area of interest and an excluded
/// remnant of the network.
#[derive(Clone, Debug, PartialEq)]
pub struct FrontierPoint {
    /// The in-area endpoint of the boundary branch.
    pub bus: String,
    /// The boundary branch, as its stored (from, to) bus codes.
    pub branch: (String, String),
}

/// The boundary of the area of interest: one entry per boundary branch.
pub type Frontier = Vec<FrontierPoint>;

/// Area selection.
impl FeederGraph {
    /// Selects a connected area of interest of at most `limit` buses around
    /// `center_bus`, marks every bus and branch as inside or outside the
    /// area, and returns the frontier.
    ///
    /// The area grows breadth-first over the undirected view of the radial
    /// graph, layer by layer, visiting neighbors in lexicographic code
    /// order. `limit` is clamped to the total bus count (and to at least
    /// the center bus itself).
    pub fn define_area(&mut self, center_bus: &str, limit: usize) -> Result<Frontier, Error> {
        let center = self.index_of(center_bus)?;
        let limit = limit.clamp(1, self.graph.node_count());

        let mut area: HashSet<NodeIndex> = HashSet::from([center]);
        let mut layer = vec![center];
        while area.len() < limit {
            let mut next_layer = Vec::new();
            for &u in &layer {
                let mut neighbors: Vec<NodeIndex> = undirected_neighbors(&self.graph, u)
                    .map(|(v, _)| v)
                    .filter(|v| !area.contains(v))
                    .collect();
                neighbors.sort_by(|a, b| self.graph[*a].code.cmp(&self.graph[*b].code));
                neighbors.dedup();

                for v in neighbors {
                    if area.len() >= limit {
                        break;
                    }
                    if area.insert(v) {
                        next_layer.push(v);
                    }
                }
            }
            if next_layer.is_empty() {
                break;
            }
            layer = next_layer;
        }

        for idx in self.graph.node_indices() {
            self.graph[idx].in_area = area.contains(&idx);
        }

        let mut frontier = Frontier::new();
        for edge in self.graph.edge_indices() {
            let (u, v) = self
                .graph
                .edge_endpoints(edge)
                .ok_or_else(|| Error::internal("Branch without endpoints."))?;
            let u_in = area.contains(&u);
            let v_in = area.contains(&v);
            if !(u_in && v_in) && (u_in || v_in) {
                let branch = (self.graph[u].code.clone(), self.graph[v].code.clone());
                let bus = if u_in {
                    branch.0.clone()
                } else {
                    branch.1.clone()
                };
                frontier.push(FrontierPoint { bus, branch });
            }
            self.graph[edge].in_area = u_in && v_in;
        }

        Ok(frontier)
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::FeederBuilder;
    use crate::Error;

    use super::FrontierPoint;

    fn chain_of_five() -> Result<crate::FeederGraph, Error> {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").bus("B3").bus("B4").bus("B5");
        builder.line("L1", "B1", "B2");
        builder.line("L2", "B2", "B3");
        builder.line("L3", "B3", "B4");
        builder.line("L4", "B4", "B5");
        builder.source("SRC", "B1");
        builder.build()
    }

    #[test]
    fn test_area_selection() -> Result<(), Error> {
        let mut graph = chain_of_five()?;
        let frontier = graph.define_area("B3", 3)?;

        let in_area: Vec<&str> = graph
            .buses()
            .filter(|bus| bus.in_area)
            .map(|bus| bus.code.as_str())
            .collect();
        assert_eq!(in_area, vec!["B2", "B3", "B4"]);

        assert!(graph.branch("B2", "B3")?.in_area);
        assert!(graph.branch("B3", "B4")?.in_area);
        assert!(!graph.branch("B1", "B2")?.in_area);
        assert!(!graph.branch("B4", "B5")?.in_area);

        assert_eq!(
            frontier,
            vec![
                FrontierPoint {
                    bus: "B2".to_string(),
                    branch: ("B1".to_string(), "B2".to_string()),
                },
                FrontierPoint {
                    bus: "B4".to_string(),
                    branch: ("B4".to_string(), "B5".to_string()),
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_area_bus_count_is_exact() -> Result<(), Error> {
        for limit in 1..=5 {
            let mut graph = chain_of_five()?;
            graph.define_area("B3", limit)?;
            let count = graph.buses().filter(|bus| bus.in_area).count();
            assert_eq!(count, limit);
        }
        Ok(())
    }

    #[test]
    fn test_limit_is_clamped_to_bus_count() -> Result<(), Error> {
        let mut graph = chain_of_five()?;
        let frontier = graph.define_area("B3", 100)?;
        assert_eq!(graph.buses().filter(|bus| bus.in_area).count(), 5);
        assert!(frontier.is_empty());
        Ok(())
    }

    #[test]
    fn test_area_is_connected() -> Result<(), Error> {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").bus("B3").bus("B4").bus("B5").bus("B6");
        builder.line("L1", "B1", "B2");
        builder.line("L2", "B2", "B3");
        builder.line("L3", "B2", "B4");
        builder.line("L4", "B3", "B5");
        builder.line("L5", "B4", "B6");
        builder.source("SRC", "B1");
        let mut graph = builder.build()?;

        graph.define_area("B2", 4)?;
        // The area grows one layer at a time from the center, so every
        // in-area bus has an in-area neighbor on its path to the center.
        let in_area: Vec<&str> = graph
            .buses()
            .filter(|bus| bus.in_area)
            .map(|bus| bus.code.as_str())
            .collect();
        assert_eq!(in_area, vec!["B1", "B2", "B3", "B4"]);

        let frontier = graph.define_area("B2", 4)?;
        assert_eq!(frontier.len(), 2);
        Ok(())
    }

    #[test]
    fn test_unknown_center_bus() -> Result<(), Error> {
        let mut graph = chain_of_five()?;
        assert!(graph
            .define_area("B9", 3)
            .is_err_and(|e| e == Error::bus_not_found("Bus with code B9 not found.")));
        Ok(())
    }
}
