// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`FeederGraph`] instances from feeder records.

use std::collections::BTreeMap;

use petgraph::graph::DiGraph;

use crate::config::FeederGraphConfig;
use crate::records::{Branch, Bus, FeederRecords, SwitchRecord};
use crate::{Error, PhaseMap};

use super::{FeederGraph, NodeIndexMap};

/// `FeederGraph` instantiation.
impl FeederGraph {
    /// Creates a new [`FeederGraph`] from the given feeder records.
    ///
    /// The raw graph is radialized (cycles are broken by opening switched
    /// branches, remaining branches are re-oriented away from the main
    /// source bus) and every bus and branch is annotated with its lumped
    /// per-phase impedance.
    ///
    /// Returns an error if the records are inconsistent, or if a cycle
    /// without any switched branch makes the graph impossible to
    /// radialize.
    pub fn try_new(records: FeederRecords, config: FeederGraphConfig) -> Result<Self, Error> {
        let main_source_bus = records
            .sources
            .first()
            .map(|source| source.bus.clone())
            .ok_or_else(|| Error::invalid_graph("No source record found."))?;

        let (graph, node_indices) = Self::create_graph(&records)?;

        let mut fg = Self {
            graph,
            node_indices,
            main_source_bus,
            config,
        };
        fg.attach_elements(&records)?;
        fg.radialize()?;
        fg.annotate_impedances()?;

        Ok(fg)
    }

    fn create_graph(records: &FeederRecords) -> Result<(DiGraph<Bus, Branch>, NodeIndexMap), Error> {
        let mut graph = DiGraph::new();
        let mut indices = NodeIndexMap::new();

        for record in &records.buses {
            if indices.contains_key(&record.code) {
                return Err(Error::invalid_graph(format!(
                    "Duplicate bus code found: {}",
                    record.code
                )));
            }
            let idx = graph.add_node(Bus::new(record));
            indices.insert(record.code.clone(), idx);
        }

        let cables: BTreeMap<&str, _> = records
            .cables
            .iter()
            .map(|cable| (cable.code.as_str(), cable))
            .collect();
        let poles: BTreeMap<&str, _> = records
            .poles
            .iter()
            .map(|pole| (pole.code.as_str(), pole))
            .collect();

        for record in &records.branches {
            if record.from == record.to {
                return Err(Error::invalid_graph(format!(
                    "Branch {}: can't connect a bus to itself.",
                    record.code
                )));
            }
            for code in [&record.from, &record.to] {
                if !indices.contains_key(code) {
                    return Err(Error::invalid_graph(format!(
                        "Branch {}: can't find a bus with code {}.",
                        record.code, code
                    )));
                }
            }
            let cable = *cables.get(record.cable.as_str()).ok_or_else(|| {
                Error::invalid_graph(format!(
                    "Branch {}: can't find a cable with code {}.",
                    record.code, record.cable
                ))
            })?;
            let pole = *poles.get(record.pole.as_str()).ok_or_else(|| {
                Error::invalid_graph(format!(
                    "Branch {}: can't find a pole with code {}.",
                    record.code, record.pole
                ))
            })?;

            let from_idx = indices[&record.from];
            let to_idx = indices[&record.to];
            graph.add_edge(
                from_idx,
                to_idx,
                Branch {
                    code: record.code.clone(),
                    length_m: record.length_m,
                    phases: record.phases,
                    cable: cable.clone(),
                    pole: pole.clone(),
                    ground_resistivity: record.ground_resistivity,
                    switches: BTreeMap::new(),
                    series: PhaseMap::new(),
                    in_area: false,
                },
            );
            for idx in [from_idx, to_idx] {
                let bus = &mut graph[idx];
                bus.phases = bus.phases.union(record.phases);
            }
        }

        Ok((graph, indices))
    }

    fn attach_elements(&mut self, records: &FeederRecords) -> Result<(), Error> {
        for source in &records.sources {
            let idx = self.host_bus_index("Source", &source.code, &source.bus)?;
            let bus = &mut self.graph[idx];
            bus.phases = bus.phases.union(source.phases);
            bus.sources.insert(source.code.clone(), source.clone());
        }

        for load in &records.loads {
            let idx = self.host_bus_index("Load", &load.code, &load.bus)?;
            let bus = &mut self.graph[idx];
            bus.phases = bus.phases.union(load.phases);
            bus.loads.insert(load.code.clone(), load.clone());
        }

        for capacitor in &records.capacitors {
            let idx = self.host_bus_index("Capacitor", &capacitor.code, &capacitor.bus)?;
            let bus = &mut self.graph[idx];
            bus.phases = bus.phases.union(capacitor.phases);
            bus.capacitors
                .insert(capacitor.code.clone(), capacitor.clone());
        }

        for arrester in &records.surge_arresters {
            let idx = self.host_bus_index("Surge arrester", &arrester.code, &arrester.bus)?;
            self.graph[idx]
                .surge_arresters
                .insert(arrester.code.clone(), arrester.clone());
        }

        for surge in &records.surges {
            let idx = self.host_bus_index("Surge", &surge.code, &surge.bus)?;
            self.graph[idx].surges.insert(surge.code.clone(), surge.clone());
        }

        for switch in &records.switches {
            self.attach_switch(switch)?;
        }

        Ok(())
    }

    /// Attaches a switch record to the branch it is mounted on.
    ///
    /// A switch whose (from, to) pair names the stored branch direction in
    /// reverse attaches to the reversed edge, with its endpoints swapped to
    /// match.
    fn attach_switch(&mut self, switch: &SwitchRecord) -> Result<(), Error> {
        for code in [&switch.from, &switch.to] {
            if !self.node_indices.contains_key(code) {
                return Err(Error::invalid_graph(format!(
                    "Switch {}: can't find a bus with code {}.",
                    switch.code, code
                )));
            }
        }
        let from_idx = self.node_indices[&switch.from];
        let to_idx = self.node_indices[&switch.to];

        let (edge, record) = if let Some(edge) = self.graph.find_edge(from_idx, to_idx) {
            (edge, switch.clone())
        } else if let Some(edge) = self.graph.find_edge(to_idx, from_idx) {
            let mut inverted = switch.clone();
            inverted.from = switch.to.clone();
            inverted.to = switch.from.clone();
            (edge, inverted)
        } else {
            return Err(Error::invalid_graph(format!(
                "Switch {}: can't find a branch between {} and {}.",
                switch.code, switch.from, switch.to
            )));
        };

        let branch = self
            .graph
            .edge_weight_mut(edge)
            .ok_or_else(|| Error::internal("Branch disappeared while attaching a switch."))?;
        branch.switches.insert(record.code.clone(), record);
        Ok(())
    }

    fn host_bus_index(
        &self,
        kind: &str,
        code: &str,
        bus: &str,
    ) -> Result<petgraph::graph::NodeIndex, Error> {
        self.node_indices.get(bus).copied().ok_or_else(|| {
            Error::invalid_graph(format!("{kind} {code}: can't find a bus with code {bus}."))
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::FeederBuilder;
    use crate::records::{BusRecord, SwitchRecord};
    use crate::{Error, FeederGraph, FeederGraphConfig, Phase, PhaseSet};

    #[test]
    fn test_bus_validation() {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").line("L1", "B1", "B2");
        builder.source("S1", "B1");

        assert!(builder.clone().build().is_ok());

        builder.records.buses.push(BusRecord {
            code: "B2".to_string(),
            x: 0.0,
            y: 0.0,
        });
        assert!(builder
            .build()
            .is_err_and(|e| e == Error::invalid_graph("Duplicate bus code found: B2")));
    }

    #[test]
    fn test_branch_validation() {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").line("L1", "B1", "B2");
        builder.source("S1", "B1");

        builder.line("L2", "B2", "B3");
        assert!(builder.clone().build().is_err_and(
            |e| e == Error::invalid_graph("Branch L2: can't find a bus with code B3.")
        ));

        builder.records.branches.pop();
        builder.line("L2", "B2", "B2");
        assert!(builder.clone().build().is_err_and(
            |e| e == Error::invalid_graph("Branch L2: can't connect a bus to itself.")
        ));

        builder.records.branches.pop();
        builder.line("L2", "B1", "B2");
        builder.records.branches.last_mut().unwrap().cable = "XX".to_string();
        assert!(builder.build().is_err_and(
            |e| e == Error::invalid_graph("Branch L2: can't find a cable with code XX.")
        ));
    }

    #[test]
    fn test_source_required() {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").line("L1", "B1", "B2");
        assert!(builder
            .build()
            .is_err_and(|e| e == Error::invalid_graph("No source record found.")));
    }

    #[test]
    fn test_element_host_bus_validation() {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").line("L1", "B1", "B2");
        builder.source("S1", "B1");
        builder.load("LD1", "B9", PhaseSet::ABC, 10.0, 0.01);

        assert!(builder.build().is_err_and(
            |e| e == Error::invalid_graph("Load LD1: can't find a bus with code B9.")
        ));
    }

    #[test]
    fn test_switch_attachment() -> Result<(), Error> {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").bus("B3");
        builder.line("L1", "B1", "B2").line("L2", "B2", "B3");
        builder.source("S1", "B1");
        // The switch names the branch endpoints in reverse order.
        builder.records.switches.push(SwitchRecord {
            code: "SW1".to_string(),
            from: "B3".to_string(),
            to: "B2".to_string(),
            t_close_s: 0.0,
            t_open_s: 1.0,
        });

        let graph = builder.build()?;
        let branch = graph.branch("B2", "B3")?;
        assert!(branch.has_switch());
        let switch = &branch.switches["SW1"];
        assert_eq!(switch.from, "B2");
        assert_eq!(switch.to, "B3");
        Ok(())
    }

    #[test]
    fn test_switch_branch_validation() {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").bus("B3");
        builder.line("L1", "B1", "B2").line("L2", "B2", "B3");
        builder.source("S1", "B1");
        builder.records.switches.push(SwitchRecord {
            code: "SW1".to_string(),
            from: "B1".to_string(),
            to: "B3".to_string(),
            t_close_s: 0.0,
            t_open_s: 1.0,
        });

        assert!(builder.build().is_err_and(|e| e
            == Error::invalid_graph("Switch SW1: can't find a branch between B1 and B3.")));
    }

    #[test]
    fn test_bus_phases_are_derived() -> Result<(), Error> {
        let mut builder = FeederBuilder::new();
        builder.bus("B1").bus("B2").bus("B3");
        builder.line("L1", "B1", "B2");
        builder.line_with_phases("L2", "B2", "B3", PhaseSet::single(Phase::A));
        builder.source("S1", "B1");

        let graph = builder.build()?;
        assert_eq!(graph.bus("B1")?.phases, PhaseSet::ABC);
        assert_eq!(graph.bus("B2")?.phases, PhaseSet::ABC);
        assert_eq!(graph.bus("B3")?.phases, PhaseSet::single(Phase::A));
        assert_eq!(graph.main_source_bus(), "B1");
        Ok(())
    }

    #[test]
    fn test_empty_records() {
        assert!(FeederGraph::try_new(Default::default(), FeederGraphConfig::default())
            .is_err_and(|e| e == Error::invalid_graph("No source record found.")));
    }
}
