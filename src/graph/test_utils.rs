// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains the
//! `FeederBuilder`, which can declaratively build feeder record sets for
//! use in tests.

use crate::records::{
    BranchRecord, BusRecord, CableRecord, CapacitorRecord, FeederRecords, LoadRecord,
    PoleConductor, PoleRecord, SourceRecord, SwitchRecord,
};
use crate::{Error, FeederGraph, FeederGraphConfig, Phase, PhaseSet};

/// A builder for creating feeder record sets easily, for use in tests.
///
/// A default cable (`CBL`) and a default three-conductor pole (`PL3`) are
/// always present; lines added with [`FeederBuilder::line`] use them.
#[derive(Clone)]
pub(crate) struct FeederBuilder {
    pub(crate) records: FeederRecords,
}

impl FeederBuilder {
    pub(crate) fn new() -> Self {
        let mut records = FeederRecords::default();
        records.cables.push(CableRecord {
            code: "CBL".to_string(),
            inner_radius_m: 0.0,
            outer_radius_m: 0.01,
            resistivity: 0.0005,
        });
        records.poles.push(PoleRecord {
            code: "PL3".to_string(),
            conductors: [Phase::A, Phase::B, Phase::C]
                .into_iter()
                .enumerate()
                .map(|(n, phase)| PoleConductor {
                    phase,
                    distance_m: 0.75 * n as f64,
                    height_m: 10.0,
                    sag_height_m: 9.5,
                })
                .collect(),
        });
        FeederBuilder { records }
    }

    /// Adds a bus at the origin.
    pub(crate) fn bus(&mut self, code: &str) -> &mut Self {
        self.records.buses.push(BusRecord {
            code: code.to_string(),
            x: 0.0,
            y: 0.0,
        });
        self
    }

    /// Adds a 1 km three-phase line on the default cable and pole.
    pub(crate) fn line(&mut self, code: &str, from: &str, to: &str) -> &mut Self {
        self.line_with_phases(code, from, to, PhaseSet::ABC)
    }

    /// Adds a 1 km line carrying the given phases.
    pub(crate) fn line_with_phases(
        &mut self,
        code: &str,
        from: &str,
        to: &str,
        phases: PhaseSet,
    ) -> &mut Self {
        self.records.branches.push(BranchRecord {
            code: code.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            length_m: 1000.0,
            phases,
            cable: "CBL".to_string(),
            pole: "PL3".to_string(),
            ground_resistivity: 100.0,
        });
        self
    }

    /// Adds a 1 km line on a previously added pole.
    pub(crate) fn line_with_pole(
        &mut self,
        code: &str,
        from: &str,
        to: &str,
        phases: PhaseSet,
        pole: &str,
    ) -> &mut Self {
        self.line_with_phases(code, from, to, phases);
        self.records
            .branches
            .last_mut()
            .expect("line was just added")
            .pole = pole.to_string();
        self
    }

    /// Adds a line carrying a normally-closed switch.
    pub(crate) fn switched_line(&mut self, code: &str, from: &str, to: &str) -> &mut Self {
        self.line(code, from, to);
        self.records.switches.push(SwitchRecord {
            code: format!("SW-{code}"),
            from: from.to_string(),
            to: to.to_string(),
            t_close_s: 0.0,
            t_open_s: 1.0,
        });
        self
    }

    /// Adds a three-phase source.
    pub(crate) fn source(&mut self, code: &str, bus: &str) -> &mut Self {
        self.records.sources.push(SourceRecord {
            code: code.to_string(),
            bus: bus.to_string(),
            phases: PhaseSet::ABC,
            vrms: 13800.0,
            frequency_hz: 60.0,
        });
        self
    }

    /// Adds a load with the given series (R, L) pair on each phase.
    pub(crate) fn load(
        &mut self,
        code: &str,
        bus: &str,
        phases: PhaseSet,
        resistance: f64,
        inductance: f64,
    ) -> &mut Self {
        self.records.loads.push(LoadRecord {
            code: code.to_string(),
            bus: bus.to_string(),
            phases,
            resistance,
            inductance,
        });
        self
    }

    /// Adds a capacitor with the given capacitance on each phase.
    pub(crate) fn capacitor(
        &mut self,
        code: &str,
        bus: &str,
        phases: PhaseSet,
        capacitance: f64,
    ) -> &mut Self {
        self.records.capacitors.push(CapacitorRecord {
            code: code.to_string(),
            bus: bus.to_string(),
            phases,
            capacitance,
        });
        self
    }

    /// Adds a pole geometry.
    pub(crate) fn pole(&mut self, record: PoleRecord) -> &mut Self {
        self.records.poles.push(record);
        self
    }

    /// Builds the `FeederGraph` with the default configuration.
    pub(crate) fn build(&self) -> Result<FeederGraph, Error> {
        FeederGraph::try_new(self.records.clone(), FeederGraphConfig::default())
    }
}
