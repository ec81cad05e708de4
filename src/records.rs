// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the normalized input records produced by the grid
//! loader, and the `Bus` and `Branch` types the `FeederGraph` stores them
//! in once attached.

use std::collections::BTreeMap;

use crate::{Impedance, Phase, PhaseMap, PhaseSet};

/// A network node: an electrical junction of the distribution feeder.
#[derive(Clone, Debug, PartialEq)]
pub struct BusRecord {
    pub code: String,
    /// Horizontal position, used for diagnostics only.
    pub x: f64,
    /// Vertical position, used for diagnostics only.
    pub y: f64,
}

/// A line segment connecting two buses.
#[derive(Clone, Debug, PartialEq)]
pub struct BranchRecord {
    pub code: String,
    pub from: String,
    pub to: String,
    /// Segment length, in meters.
    pub length_m: f64,
    /// The phases the segment carries.
    pub phases: PhaseSet,
    /// Code of the cable used by every conductor of the segment.
    pub cable: String,
    /// Code of the pole geometry the conductors hang from.
    pub pole: String,
    /// Ground resistivity along the segment, in ohm-meter.
    pub ground_resistivity: f64,
}

/// A voltage source feeding the network at a bus.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceRecord {
    pub code: String,
    pub bus: String,
    pub phases: PhaseSet,
    /// RMS line voltage, in volt.
    pub vrms: f64,
    /// Source frequency, in Hz.
    pub frequency_hz: f64,
}

/// A load connected at a bus, as a per-phase series (R, L) pair.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadRecord {
    pub code: String,
    pub bus: String,
    pub phases: PhaseSet,
    /// Series resistance of each present phase, in ohm.
    pub resistance: f64,
    /// Series inductance of each present phase, in henry.
    pub inductance: f64,
}

impl LoadRecord {
    /// Derives the series (R, L) pair from apparent power, power factor and
    /// RMS line voltage.
    ///
    /// Single- and two-phase loads see the phase voltage and the full
    /// apparent power; a three-phase load splits its power evenly across
    /// the phases.
    pub fn from_power(
        code: impl Into<String>,
        bus: impl Into<String>,
        phases: PhaseSet,
        s_va: f64,
        power_factor: f64,
        vrms: f64,
        frequency_hz: f64,
    ) -> Self {
        let v = if phases.len() == 2 {
            vrms
        } else {
            vrms / 3.0_f64.sqrt()
        };
        let s = if phases.len() == 3 { s_va / 3.0 } else { s_va };
        let p = s * power_factor;
        let z = (v * v / p) * power_factor;
        let theta = power_factor.acos();
        LoadRecord {
            code: code.into(),
            bus: bus.into(),
            phases,
            resistance: z * power_factor,
            inductance: (z * theta.sin()) / (2.0 * std::f64::consts::PI * frequency_hz),
        }
    }
}

/// A shunt capacitor bank connected at a bus.
#[derive(Clone, Debug, PartialEq)]
pub struct CapacitorRecord {
    pub code: String,
    pub bus: String,
    pub phases: PhaseSet,
    /// Capacitance of each present phase, in farad.
    pub capacitance: f64,
}

impl CapacitorRecord {
    /// Derives the per-phase capacitance from reactive power and RMS line
    /// voltage, with the same voltage and three-phase scaling rules as
    /// [`LoadRecord::from_power`].
    pub fn from_reactive_power(
        code: impl Into<String>,
        bus: impl Into<String>,
        phases: PhaseSet,
        q_var: f64,
        vrms: f64,
        frequency_hz: f64,
    ) -> Self {
        let v = if phases.len() == 2 {
            vrms
        } else {
            vrms / 3.0_f64.sqrt()
        };
        let q = if phases.len() == 3 { q_var / 3.0 } else { q_var };
        CapacitorRecord {
            code: code.into(),
            bus: bus.into(),
            phases,
            capacitance: q / (2.0 * std::f64::consts::PI * frequency_hz * v * v),
        }
    }
}

/// A switch mounted on a branch, openable to break loops.
#[derive(Clone, Debug, PartialEq)]
pub struct SwitchRecord {
    pub code: String,
    pub from: String,
    pub to: String,
    /// Closing time, in seconds, for the downstream simulation.
    pub t_close_s: f64,
    /// Opening time, in seconds, for the downstream simulation.
    pub t_open_s: f64,
}

/// A surge arrester installed at a bus.
#[derive(Clone, Debug, PartialEq)]
pub struct SurgeArresterRecord {
    pub code: String,
    pub bus: String,
}

/// A surge injection at a bus, for the downstream simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct SurgeRecord {
    pub code: String,
    pub bus: String,
    /// Peak amplitude, in ampere.
    pub amplitude_a: f64,
    /// Front time, in seconds.
    pub t_front_s: f64,
    /// Decay time constant, in seconds.
    pub tau_s: f64,
}

/// Conductor geometry and material data for a cable type.
#[derive(Clone, Debug, PartialEq)]
pub struct CableRecord {
    pub code: String,
    /// Inner conductor radius, in meters.
    pub inner_radius_m: f64,
    /// Outer conductor radius, in meters, used as the geometric mean radius.
    pub outer_radius_m: f64,
    /// Per-length resistivity, in ohm per meter.
    pub resistivity: f64,
}

/// One conductor position on a pole.
#[derive(Clone, Debug, PartialEq)]
pub struct PoleConductor {
    pub phase: Phase,
    /// Horizontal offset from the pole axis, in meters.
    pub distance_m: f64,
    /// Attachment height above ground, in meters.
    pub height_m: f64,
    /// Conductor height at mid-span, in meters (attachment height minus
    /// sag).
    pub sag_height_m: f64,
}

/// Pole geometry: the ordered conductor positions of a line structure.
#[derive(Clone, Debug, PartialEq)]
pub struct PoleRecord {
    pub code: String,
    pub conductors: Vec<PoleConductor>,
}

/// The normalized in-memory feeder description handed over by the grid
/// loader.
#[derive(Clone, Debug, Default)]
pub struct FeederRecords {
    pub buses: Vec<BusRecord>,
    pub branches: Vec<BranchRecord>,
    pub sources: Vec<SourceRecord>,
    pub loads: Vec<LoadRecord>,
    pub capacitors: Vec<CapacitorRecord>,
    pub switches: Vec<SwitchRecord>,
    pub surge_arresters: Vec<SurgeArresterRecord>,
    pub surges: Vec<SurgeRecord>,
    pub cables: Vec<CableRecord>,
    pub poles: Vec<PoleRecord>,
}

/// A bus of the feeder graph, with its attached elements and computed
/// per-phase shunt impedance.
///
/// Attached elements are keyed by their record code so iteration order is
/// deterministic.
#[derive(Clone, Debug, PartialEq)]
pub struct Bus {
    pub code: String,
    pub position: (f64, f64),
    pub phases: PhaseSet,
    pub sources: BTreeMap<String, SourceRecord>,
    pub loads: BTreeMap<String, LoadRecord>,
    pub capacitors: BTreeMap<String, CapacitorRecord>,
    pub surge_arresters: BTreeMap<String, SurgeArresterRecord>,
    pub surges: BTreeMap<String, SurgeRecord>,
    /// Parallel combination of the attached loads and capacitors, per
    /// phase; `None` where no element is attached.
    pub shunt: PhaseMap<Impedance>,
    /// Whether the bus lies inside the area of interest.
    pub in_area: bool,
}

impl Bus {
    pub(crate) fn new(record: &BusRecord) -> Self {
        Bus {
            code: record.code.clone(),
            position: (record.x, record.y),
            phases: PhaseSet::EMPTY,
            sources: BTreeMap::new(),
            loads: BTreeMap::new(),
            capacitors: BTreeMap::new(),
            surge_arresters: BTreeMap::new(),
            surges: BTreeMap::new(),
            shunt: PhaseMap::new(),
            in_area: false,
        }
    }
}

/// A branch of the feeder graph: a directed line segment between two buses,
/// with its switches and computed per-phase series impedance.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    pub code: String,
    pub length_m: f64,
    pub phases: PhaseSet,
    pub cable: CableRecord,
    pub pole: PoleRecord,
    pub ground_resistivity: f64,
    pub switches: BTreeMap<String, SwitchRecord>,
    /// Series impedance of each carried phase; `None` where the phase is
    /// absent.
    pub series: PhaseMap<Impedance>,
    /// Whether both endpoints lie inside the area of interest.
    pub in_area: bool,
}

impl Branch {
    /// Returns true if any switch is mounted on the branch.
    pub fn has_switch(&self) -> bool {
        !self.switches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_load_from_power_three_phase() {
        let load = LoadRecord::from_power(
            "LD1",
            "B1",
            PhaseSet::ABC,
            9000.0,
            0.9,
            13800.0,
            60.0,
        );
        // v = 13800/sqrt(3), s = 3000 per phase, p = 2700,
        // z = (v^2/p)*fp = 21160, r = z*fp.
        assert_relative_eq!(load.resistance, 19044.0, max_relative = 1e-9);
        assert_relative_eq!(load.inductance, 24.46591, max_relative = 1e-5);
    }

    #[test]
    fn test_load_from_power_two_phase() {
        let phases = PhaseSet::single(Phase::A).with(Phase::B);
        let load = LoadRecord::from_power("LD1", "B1", phases, 5000.0, 1.0, 240.0, 60.0);
        // Two-phase loads see the full line voltage and apparent power, and
        // a unity power factor leaves no inductive part.
        assert_relative_eq!(load.resistance, 240.0 * 240.0 / 5000.0, max_relative = 1e-9);
        assert_relative_eq!(load.inductance, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_capacitor_from_reactive_power() {
        let capacitor = CapacitorRecord::from_reactive_power(
            "CP1",
            "B1",
            PhaseSet::ABC,
            300_000.0,
            13800.0,
            60.0,
        );
        // q = 100000 per phase, v^2 = 13800^2/3.
        let v2 = 13800.0 * 13800.0 / 3.0;
        let expected = 100_000.0 / (2.0 * std::f64::consts::PI * 60.0 * v2);
        assert_relative_eq!(capacitor.capacitance, expected, max_relative = 1e-9);
    }
}
