// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for annotating every bus with its lumped shunt impedance and
//! every branch with its lumped series impedance.

use crate::records::{Branch, Bus};
use crate::{Error, Impedance, Phase, PhaseMap};

use super::FeederGraph;

/// Lumped impedance annotation.
impl FeederGraph {
    /// Computes the per-phase shunt impedance of every bus and the
    /// per-phase series impedance of every branch, at the configured
    /// analysis frequency.
    pub(crate) fn annotate_impedances(&mut self) -> Result<(), Error> {
        let frequency_hz = self.config.frequency_hz;

        for idx in self.graph.node_indices() {
            let shunt = bus_shunt(&self.graph[idx], frequency_hz)?;
            self.graph[idx].shunt = shunt;
        }

        for edge in self.graph.edge_indices() {
            let series = branch_series(&self.graph[edge], frequency_hz)?;
            self.graph[edge].series = series;
        }

        Ok(())
    }
}

/// Combines every load and capacitor attached to the bus into one shunt
/// impedance per phase, by repeated parallel combination.
///
/// A phase with no attached element stays absent (open).
fn bus_shunt(bus: &Bus, frequency_hz: f64) -> Result<PhaseMap<Impedance>, Error> {
    let mut shunt: PhaseMap<Impedance> = PhaseMap::new();

    for load in bus.loads.values() {
        for phase in load.phases.iter().filter(|phase| *phase != Phase::N) {
            let z = Impedance::from_rl(load.resistance, load.inductance, frequency_hz)?;
            let combined = match shunt.get(phase) {
                Some(existing) => existing.parallel(&z),
                None => z,
            };
            shunt.set(phase, combined);
        }
    }

    for capacitor in bus.capacitors.values() {
        for phase in capacitor.phases.iter().filter(|phase| *phase != Phase::N) {
            let z = Impedance::from_rc(0.0, capacitor.capacitance, frequency_hz)?;
            let combined = match shunt.get(phase) {
                Some(existing) => existing.parallel(&z),
                None => z,
            };
            shunt.set(phase, combined);
        }
    }

    Ok(shunt)
}

/// Computes the per-phase series impedance of a branch from its cable and
/// pole geometry.
///
/// The resistance is the per-length cable resistivity times the branch
/// length. The reactance comes from a self/mutual geometric-mean-distance
/// inductance model over the pole's conductors; the branch's phases zip
/// positionally with the pole conductor rows.
fn branch_series(branch: &Branch, frequency_hz: f64) -> Result<PhaseMap<Impedance>, Error> {
    let conductors = &branch.pole.conductors;
    let resistance = branch.length_m * branch.cable.resistivity;
    let rmg = branch.cable.outer_radius_m;

    // Mean height above ground, adjusted for sag.
    let mean_heights: Vec<f64> = conductors
        .iter()
        .map(|c| c.height_m - 0.7 * (c.height_m - c.sag_height_m))
        .collect();

    let n = conductors.len();
    let mut dist_horiz = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                dist_horiz[i][j] = (conductors[i].distance_m - conductors[j].distance_m).abs();
            }
        }
    }

    let inductances = line_inductances(&mean_heights, dist_horiz, branch.length_m, rmg);

    let mut series = PhaseMap::new();
    for (phase, inductance) in branch.phases.iter().zip(inductances) {
        series.set(
            phase,
            Impedance::from_rl(resistance, inductance, frequency_hz)?,
        );
    }

    Ok(series)
}

/// The self/mutual geometric inductance model of an overhead line segment.
///
/// Self terms use the conductor's geometric mean radius against its image;
/// mutual terms use the image distance over the horizontal separation. The
/// effective inductance of a conductor is its self term plus the average
/// of its mutual terms, which collapses the phase coupling to one scalar
/// per conductor.
fn line_inductances(
    mean_heights: &[f64],
    mut dist_horiz: Vec<Vec<f64>>,
    length_m: f64,
    rmg: f64,
) -> Vec<f64> {
    let n = mean_heights.len();

    let mut dist_img = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i != j {
                dist_img[i][j] =
                    (4.0 * mean_heights[i] * mean_heights[j] + dist_horiz[i][j]).sqrt();
            }
        }
    }

    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j {
                matrix[i][j] =
                    4.6052e-4 * ((2.0 * mean_heights[i]) / rmg).log10() * (length_m / 1e3);
            } else {
                if dist_horiz[i][j] == 0.0 {
                    tracing::warn!(
                        "Conductors {i} and {j} share a horizontal position; \
                         substituting a negligible separation."
                    );
                    dist_horiz[i][j] = f64::EPSILON;
                }
                matrix[i][j] =
                    -(4.6052e-4 * (dist_img[i][j] / dist_horiz[i][j]).log10()) * (length_m / 1e3);
            }
        }
    }

    (0..n)
        .map(|i| {
            if n == 1 {
                matrix[i][i]
            } else {
                let row_sum: f64 = matrix[i].iter().sum();
                matrix[i][i] + (row_sum - matrix[i][i]) / (n - 1) as f64
            }
        })
        .collect()
}
