// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The network reduction engine: computes, for each frontier point, the
//! equivalent impedance of the remnant hanging off it.
//!
//! Two strategies implement the reduction. Pure remnants fold by series
//! and parallel composition over their tree structure; a remnant that
//! still contains the main source bus must account for the path back to
//! the supply and is reduced through its nodal admittance matrix instead.

mod nodal;
mod tree;

pub use nodal::nodal_equivalent;
pub use tree::fold_remnant;

use crate::config::FeederGraphConfig;
use crate::graph::{EquivalentGraph, Frontier};
use crate::{Error, FeederGraph, Impedance, PhaseMap};

/// The reduction result for one frontier point: the equivalent impedance,
/// per phase, of the remnant attached there.
///
/// An absent phase means the remnant does not carry it, not that its
/// impedance is zero.
#[derive(Clone, Debug, PartialEq)]
pub struct FrontierEquivalent {
    /// The frontier bus the remnant attaches to.
    pub bus: String,
    /// The equivalent impedance seen from the frontier bus, per phase.
    pub impedances: PhaseMap<Impedance>,
}

/// Computes the equivalent impedance of one remnant, dispatching on
/// whether it still contains the main source bus.
pub fn equivalent_impedance(
    equivalent: &EquivalentGraph,
    config: &FeederGraphConfig,
) -> Result<PhaseMap<Impedance>, Error> {
    if equivalent.contains_source() {
        nodal_equivalent(equivalent, config)
    } else {
        fold_remnant(equivalent)
    }
}

/// Reduction over a whole frontier.
impl FeederGraph {
    /// Computes one [`FrontierEquivalent`] per frontier point, extracting
    /// and reducing each remnant independently.
    pub fn equivalent_impedances(
        &self,
        frontier: &Frontier,
    ) -> Result<Vec<FrontierEquivalent>, Error> {
        let equivalents = self.equivalent_graphs(frontier)?;
        let mut results = Vec::with_capacity(equivalents.len());
        for equivalent in &equivalents {
            results.push(FrontierEquivalent {
                bus: equivalent.frontier_bus().to_string(),
                impedances: equivalent_impedance(equivalent, &self.config)?,
            });
        }
        Ok(results)
    }
}
