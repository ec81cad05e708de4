// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Feeder Equivalent Graph

This is a library for reducing a distribution feeder — a graph of buses
and branches carrying sources, loads, capacitors and switches — into a
radial topology plus per-phase equivalent impedances representing
everything outside a chosen area of interest.

A graph representation makes it easy to reason about the feeder's
topology: breaking loops by opening switched branches, orienting every
branch away from the main source, and carving out the neighborhood of a
bus of interest.

## The pipeline

The main struct is [`FeederGraph`], instances of which can be created by
passing the loader's normalized [`FeederRecords`] to the
[`try_new`][FeederGraph::try_new] method. Creation validates the records,
radializes the topology (a cycle that carries no switch on any of its
branches is a fatal error) and annotates every bus and branch with its
lumped per-phase [`Impedance`] at the configured analysis frequency.

[`define_area`][FeederGraph::define_area] then selects a connected area of
interest around a center bus and returns the [`Frontier`]: the boundary
pairs where the area meets the excluded remnants of the network.

[`equivalent_impedances`][FeederGraph::equivalent_impedances] extracts
each remnant into an independently owned [`EquivalentGraph`] and reduces
it to one equivalent impedance per phase, by series/parallel tree folding
for pure remnants, or through the nodal admittance matrix when the
remnant still contains the main source bus. The results feed the
downstream card writer, which is not part of this library.

## Validation

The [`try_new`][FeederGraph::try_new] method performs several checks on
the records, including checking that:

- Bus codes are unique and branch endpoints exist.
- Cables, poles and element host buses resolve.
- There is at least one source record; the first one defines the main
  source bus.
- Every bus is reachable from the main source bus once the graph is
  radial.
*/

mod config;
pub use config::FeederGraphConfig;

mod error;
pub use error::Error;

mod phase;
pub use phase::{Phase, PhaseMap, PhaseSet};

mod impedance;
pub use impedance::{Impedance, ImpedanceParams, DEFAULT_FREQUENCY_HZ};

mod records;
pub use records::{
    Branch, BranchRecord, Bus, BusRecord, CableRecord, CapacitorRecord, FeederRecords, LoadRecord,
    PoleConductor, PoleRecord, SourceRecord, SurgeArresterRecord, SurgeRecord, SwitchRecord,
};

mod graph;
pub use graph::{iterators, EquivalentGraph, FeederGraph, Frontier, FrontierPoint};

mod reduction;
pub use reduction::{equivalent_impedance, fold_remnant, nodal_equivalent, FrontierEquivalent};
