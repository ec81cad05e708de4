// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Iterators over buses and branches in a `FeederGraph`.

use petgraph::graph::{DiGraph, NodeIndex};

use crate::records::{Branch, Bus};

/// An iterator over the buses in a `FeederGraph`, in lexicographic code
/// order.
pub struct Buses<'a> {
    pub(crate) graph: &'a DiGraph<Bus, Branch>,
    pub(crate) iter: std::collections::btree_map::Values<'a, String, NodeIndex>,
}

impl<'a> Iterator for Buses<'a> {
    type Item = &'a Bus;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|idx| &self.graph[*idx])
    }
}

/// An iterator over the branches in a `FeederGraph`, yielding the endpoint
/// bus codes together with the branch.
pub struct Branches<'a> {
    pub(crate) graph: &'a DiGraph<Bus, Branch>,
    pub(crate) iter: std::slice::Iter<'a, petgraph::graph::Edge<Branch>>,
}

impl<'a> Iterator for Branches<'a> {
    type Item = (&'a str, &'a str, &'a Branch);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|edge| {
            (
                self.graph[edge.source()].code.as_str(),
                self.graph[edge.target()].code.as_str(),
                &edge.weight,
            )
        })
    }
}

/// An iterator over the neighbors of a bus in a `FeederGraph`.
pub struct Neighbors<'a> {
    pub(crate) graph: &'a DiGraph<Bus, Branch>,
    pub(crate) iter: petgraph::graph::Neighbors<'a, Branch>,
}

impl<'a> Iterator for Neighbors<'a> {
    type Item = &'a Bus;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|idx| &self.graph[idx])
    }
}
