// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `Impedance` value type, which represents one
//! phase's series impedance at a reference frequency.

use std::cmp::Ordering;
use std::f64::consts::PI;
use std::fmt::Display;

use num_complex::Complex64;

use crate::{Error, Phase, PhaseMap};

/// The reference frequency, in Hz, used when none is given at construction.
pub const DEFAULT_FREQUENCY_HZ: f64 = 60.0;

/// Construction parameters for an [`Impedance`].
///
/// Exactly one of the canonical parameter groups `(r, x)`, `(r, l)`,
/// `(r, c)` or `(z)` may be supplied; anything else is rejected by
/// [`Impedance::try_new`]. A missing `f` defaults to
/// [`DEFAULT_FREQUENCY_HZ`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ImpedanceParams {
    /// Resistance, in ohm.
    pub r: Option<f64>,
    /// Reactance, in ohm.
    pub x: Option<f64>,
    /// Inductance, in henry.
    pub l: Option<f64>,
    /// Capacitance, in farad.
    pub c: Option<f64>,
    /// Complex impedance, in ohm.
    pub z: Option<Complex64>,
    /// Reference frequency, in Hz.
    pub f: Option<f64>,
}

/// One phase's series impedance at a reference frequency.
///
/// Resistance, reactance, inductance, capacitance and the complex value are
/// all kept mutually consistent, so any representation can be read back
/// regardless of which parameter group was used at construction.
#[derive(Clone, Copy, Debug)]
pub struct Impedance {
    r: f64,
    x: f64,
    l: f64,
    c: f64,
    z: Complex64,
    f: f64,
}

impl Impedance {
    /// Creates a new `Impedance` from the given parameters.
    ///
    /// Returns an `InvalidImpedance` error if the frequency is zero, or if
    /// zero or more than one canonical parameter group is supplied.
    pub fn try_new(params: ImpedanceParams) -> Result<Self, Error> {
        let f = params.f.unwrap_or(DEFAULT_FREQUENCY_HZ);
        if f == 0.0 {
            return Err(Error::invalid_impedance(
                "Value 0 not allowed for frequency: f = 0.",
            ));
        }

        let passed = [
            params.r.is_some(),
            params.x.is_some(),
            params.l.is_some(),
            params.c.is_some(),
            params.z.is_some(),
        ];
        let combination = match passed {
            [true, true, false, false, false] => {
                let (r, x) = (params.r.unwrap_or(0.0), params.x.unwrap_or(0.0));
                Some((r, x))
            }
            [true, false, true, false, false] => {
                let (r, l) = (params.r.unwrap_or(0.0), params.l.unwrap_or(0.0));
                Some((r, 2.0 * PI * f * l))
            }
            [true, false, false, true, false] => {
                let (r, c) = (params.r.unwrap_or(0.0), params.c.unwrap_or(0.0));
                Some((r, -1.0 / (2.0 * PI * f * c)))
            }
            [false, false, false, false, true] => {
                let z = params.z.unwrap_or_default();
                Some((z.re, z.im))
            }
            _ => None,
        };

        let Some((r, x)) = combination else {
            let names = ["R", "X", "L", "C", "Z"];
            let supplied = names
                .iter()
                .zip(passed)
                .filter(|(_, used)| *used)
                .map(|(name, _)| *name)
                .collect::<Vec<_>>();
            return Err(Error::invalid_impedance(format!(
                "Incorrect impedance parameter combination [{}]. \
                 Use one of (R and X), (R and L), (R and C), (Z).",
                supplied.join(", ")
            )));
        };

        Ok(Self::from_rectangular(r, x, f))
    }

    /// Creates an `Impedance` from resistance and reactance.
    pub fn from_rx(r: f64, x: f64, f: f64) -> Result<Self, Error> {
        Self::try_new(ImpedanceParams {
            r: Some(r),
            x: Some(x),
            f: Some(f),
            ..Default::default()
        })
    }

    /// Creates an `Impedance` from resistance and inductance.
    pub fn from_rl(r: f64, l: f64, f: f64) -> Result<Self, Error> {
        Self::try_new(ImpedanceParams {
            r: Some(r),
            l: Some(l),
            f: Some(f),
            ..Default::default()
        })
    }

    /// Creates an `Impedance` from resistance and capacitance.
    pub fn from_rc(r: f64, c: f64, f: f64) -> Result<Self, Error> {
        Self::try_new(ImpedanceParams {
            r: Some(r),
            c: Some(c),
            f: Some(f),
            ..Default::default()
        })
    }

    /// Creates an `Impedance` from a complex value.
    pub fn from_complex(z: Complex64, f: f64) -> Result<Self, Error> {
        Self::try_new(ImpedanceParams {
            z: Some(z),
            f: Some(f),
            ..Default::default()
        })
    }

    /// Derives every stored representation from `(r, x)` at a frequency that
    /// has already been validated as nonzero.
    fn from_rectangular(r: f64, x: f64, f: f64) -> Self {
        let l = x / (2.0 * PI * f);
        let c = -1.0 / (2.0 * PI * f * x);
        Impedance {
            r,
            x,
            l,
            c,
            z: Complex64::new(r, x),
            f,
        }
    }

    /// Resistance, in ohm.
    pub fn resistance(&self) -> f64 {
        self.r
    }

    /// Reactance, in ohm, at the reference frequency.
    pub fn reactance(&self) -> f64 {
        self.x
    }

    /// Inductance, in henry.
    pub fn inductance(&self) -> f64 {
        self.l
    }

    /// Capacitance, in farad.
    pub fn capacitance(&self) -> f64 {
        self.c
    }

    /// The complex impedance, in ohm, at the reference frequency.
    pub fn complex(&self) -> Complex64 {
        self.z
    }

    /// The reference frequency, in Hz.
    pub fn frequency(&self) -> f64 {
        self.f
    }

    /// The impedance magnitude, in ohm, at the reference frequency.
    pub fn magnitude(&self) -> f64 {
        self.z.norm()
    }

    /// Returns the equivalent impedance at a different reference frequency.
    ///
    /// Resistance and inductance are preserved; the reactance scales
    /// linearly with the frequency and the capacitance is re-derived.
    pub fn to_frequency(&self, f: f64) -> Result<Self, Error> {
        if f == 0.0 {
            return Err(Error::invalid_impedance(
                "Value 0 not allowed for frequency: f = 0.",
            ));
        }
        Ok(self.at_frequency(f))
    }

    /// Infallible rescaling, for use with frequencies already known to be
    /// nonzero (the stored reference frequency of any valid impedance).
    ///
    /// Resistance and inductance carry over unchanged.
    fn at_frequency(&self, f: f64) -> Self {
        if f == self.f {
            return *self;
        }
        let x = 2.0 * PI * f * self.l;
        Impedance {
            r: self.r,
            x,
            l: self.l,
            c: -1.0 / (2.0 * PI * f * x),
            z: Complex64::new(self.r, x),
            f,
        }
    }

    /// Series combination, at `self`'s reference frequency.
    pub fn series(&self, other: &Impedance) -> Impedance {
        let z = self.z + other.at_frequency(self.f).z;
        Self::from_rectangular(z.re, z.im, self.f)
    }

    /// Parallel combination, at `self`'s reference frequency.
    ///
    /// A zero-magnitude operand is treated as an open branch and the other
    /// operand is returned unchanged.
    pub fn parallel(&self, other: &Impedance) -> Impedance {
        let other = other.at_frequency(self.f);
        if self.z.norm() == 0.0 {
            return other;
        }
        if other.z.norm() == 0.0 {
            return *self;
        }
        let y = 1.0 / self.z + 1.0 / other.z;
        let z = if y.norm() == 0.0 {
            Complex64::new(0.0, 0.0)
        } else {
            1.0 / y
        };
        Self::from_rectangular(z.re, z.im, self.f)
    }
}

impl std::ops::Add for Impedance {
    type Output = Impedance;

    fn add(self, other: Impedance) -> Impedance {
        self.series(&other)
    }
}

impl PartialEq for Impedance {
    fn eq(&self, other: &Self) -> bool {
        self.z == other.at_frequency(self.f).z
    }
}

impl PartialOrd for Impedance {
    /// Orders impedances by magnitude, after rescaling the right operand to
    /// the left operand's reference frequency.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.magnitude()
            .partial_cmp(&other.at_frequency(self.f).magnitude())
    }
}

impl Display for Impedance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+j{} at f = {} Hz", self.r, self.x, self.f)
    }
}

/// Per-phase series and parallel composition.
///
/// A phase missing from either operand is open, so the other operand's
/// value passes through unchanged.
impl PhaseMap<Impedance> {
    /// Phase-wise series combination of two per-phase impedance maps.
    pub fn series(&self, other: &Self) -> Self {
        self.combine(other, |z1, z2| z1.series(z2))
    }

    /// Phase-wise parallel combination of two per-phase impedance maps.
    pub fn parallel(&self, other: &Self) -> Self {
        self.combine(other, |z1, z2| z1.parallel(z2))
    }

    fn combine(&self, other: &Self, op: impl Fn(&Impedance, &Impedance) -> Impedance) -> Self {
        let mut result = PhaseMap::new();
        for phase in Phase::ALL {
            match (self.get(phase), other.get(phase)) {
                (Some(z1), Some(z2)) => result.set(phase, op(z1, z2)),
                (Some(z1), None) => result.set(phase, *z1),
                (None, Some(z2)) => result.set(phase, *z2),
                (None, None) => {}
            }
        }
        result
    }
}
