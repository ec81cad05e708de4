// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Nodal admittance reduction, for remnants that still contain the main
//! source bus.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

use crate::config::FeederGraphConfig;
use crate::graph::EquivalentGraph;
use crate::{Error, Impedance, Phase, PhaseMap};

/// One primitive branch: the series impedance of one phase of one edge.
struct Primitive {
    from: String,
    to: String,
    phase: Phase,
    z: Complex64,
}

/// Reduces a remnant through its nodal admittance matrix and returns the
/// equivalent impedance seen from the boundary bus, per phase.
///
/// One node exists per (bus, phase) pair and one primitive branch per
/// (edge, phase it carries). The bus admittance matrix is assembled as
/// incidenceᵀ · diag(admittance) · incidence, each defined shunt admittance
/// is added to its diagonal entry (a bus with no shunt simply contributes
/// nothing), and the matrix is inverted; the answer per phase is the bus
/// impedance matrix diagonal at the boundary node, scaled by the
/// configured correction factor.
///
/// The reference node absorbs the main source bus, when present, and every
/// shuntless leaf other than the boundary bus; current leaving through an
/// open line end then returns through the reference, which is what the
/// tree-folding strategy's open-end handling amounts to.
pub fn nodal_equivalent(
    equivalent: &EquivalentGraph,
    config: &FeederGraphConfig,
) -> Result<PhaseMap<Impedance>, Error> {
    let primitives = collect_primitives(equivalent)?;
    let index = index_nodes(equivalent, &primitives);

    let node_count = index.len();
    if node_count == 0 {
        return Ok(PhaseMap::new());
    }

    // Primitive branches with both endpoints folded into the reference
    // carry no information; drop them. Zero series impedances would make
    // the primitive admittance infinite and are replaced by a negligible
    // value instead.
    let kept: Vec<(Option<usize>, Option<usize>, Complex64)> = primitives
        .iter()
        .map(|p| {
            let i = index.get(&(p.from.clone(), p.phase)).copied();
            let j = index.get(&(p.to.clone(), p.phase)).copied();
            let z = if p.z.norm() == 0.0 {
                Complex64::new(f64::EPSILON, 0.0)
            } else {
                p.z
            };
            (i, j, z)
        })
        .filter(|(i, j, _)| i.is_some() || j.is_some())
        .collect();

    let mut incidence = DMatrix::<Complex64>::zeros(kept.len(), node_count);
    for (row, (i, j, _)) in kept.iter().enumerate() {
        if let Some(i) = i {
            incidence[(row, *i)] = Complex64::new(1.0, 0.0);
        }
        if let Some(j) = j {
            incidence[(row, *j)] = Complex64::new(-1.0, 0.0);
        }
    }
    let admittances = DMatrix::from_diagonal(&DVector::from_iterator(
        kept.len(),
        kept.iter().map(|(_, _, z)| 1.0 / z),
    ));

    let mut ybus = incidence.transpose() * admittances * incidence;
    for ((code, phase), &i) in &index {
        // The boundary bus's copied shunt belongs to the area side of the
        // frontier and is not part of the remnant.
        if *code == equivalent.boundary_bus {
            continue;
        }
        let bus = &equivalent.graph[equivalent.node_indices[code]];
        if let Some(z) = bus.shunt.get(*phase) {
            if z.complex().norm() > 0.0 {
                ybus[(i, i)] += 1.0 / z.complex();
            }
        }
    }

    let zbus = ybus
        .try_inverse()
        .ok_or_else(|| Error::internal("Singular bus admittance matrix."))?;

    let boundary_idx = equivalent
        .node_indices
        .get(&equivalent.boundary_bus)
        .copied()
        .ok_or_else(|| Error::internal("Equivalent graph without its boundary bus."))?;
    let mut result = PhaseMap::new();
    for phase in equivalent.graph[boundary_idx].phases.iter() {
        if let Some(&i) = index.get(&(equivalent.boundary_bus.clone(), phase)) {
            let z = zbus[(i, i)] * config.nodal_correction;
            result.set(phase, Impedance::from_complex(z, config.frequency_hz)?);
        }
    }
    Ok(result)
}

/// Collects one primitive branch per (edge, phase), ordered by endpoint
/// codes and phase so node and branch numbering is reproducible.
fn collect_primitives(equivalent: &EquivalentGraph) -> Result<Vec<Primitive>, Error> {
    let mut primitives = Vec::new();
    for edge in equivalent.graph.edge_indices() {
        let (u, v) = equivalent
            .graph
            .edge_endpoints(edge)
            .ok_or_else(|| Error::internal("Branch without endpoints."))?;
        let from = equivalent.graph[u].code.clone();
        let to = equivalent.graph[v].code.clone();
        for (phase, z) in equivalent.graph[edge].series.iter() {
            primitives.push(Primitive {
                from: from.clone(),
                to: to.clone(),
                phase,
                z: z.complex(),
            });
        }
    }
    primitives.sort_by(|a, b| {
        (&a.from, &a.to, a.phase.index()).cmp(&(&b.from, &b.to, b.phase.index()))
    });
    Ok(primitives)
}

/// Assigns a matrix index to every (bus, phase) node that is not folded
/// into the reference, in lexicographic order.
fn index_nodes(
    equivalent: &EquivalentGraph,
    primitives: &[Primitive],
) -> BTreeMap<(String, Phase), usize> {
    let mut degree: BTreeMap<(&str, Phase), usize> = BTreeMap::new();
    for p in primitives {
        *degree.entry((p.from.as_str(), p.phase)).or_default() += 1;
        *degree.entry((p.to.as_str(), p.phase)).or_default() += 1;
    }

    let mut index = BTreeMap::new();
    for (code, &idx) in &equivalent.node_indices {
        let bus = &equivalent.graph[idx];
        let is_source = Some(code.as_str()) == equivalent.source_bus.as_deref();
        let is_boundary = *code == equivalent.boundary_bus;
        for phase in bus.phases.iter() {
            let degree = degree.get(&(code.as_str(), phase)).copied().unwrap_or(0);
            let has_shunt = !is_boundary
                && bus
                    .shunt
                    .get(phase)
                    .is_some_and(|z| z.complex().norm() > 0.0);
            if degree == 0 && !has_shunt {
                continue;
            }
            let is_reference = is_source || (degree == 1 && !has_shunt && !is_boundary);
            if !is_reference {
                let next = index.len();
                index.insert((code.clone(), phase), next);
            }
        }
    }
    index
}
