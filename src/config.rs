// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for the `FeederGraph`.

/// Configuration options for the `FeederGraph`.
#[derive(Clone, Debug)]
pub struct FeederGraphConfig {
    /// The analysis frequency, in Hz, at which every lumped and equivalent
    /// impedance is computed.
    pub frequency_hz: f64,

    /// Correction factor applied to equivalent impedances obtained from the
    /// nodal admittance reduction, calibrated against the downstream
    /// simulator's internal inductance formula.
    pub nodal_correction: f64,
}

impl Default for FeederGraphConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 60.0,
            nodal_correction: 1.0,
        }
    }
}
