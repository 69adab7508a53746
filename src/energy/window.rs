// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Real-axis energy discretization.

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Which bin receives a value lying exactly halfway between two bin
/// centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    #[default]
    Lower,
    Upper,
}

/// `resolution` evenly spaced energies covering `[lower_bound, upper_bound]`
/// inclusively.
///
/// Energy `n` is the center of bin `n`. Bin `n` covers
/// `[energy(n) - dE/2, energy(n) + dE/2]`.
///
/// Deserialization goes through [`EnergyWindow::new`], so a serialized
/// window is held to the same checks as one built in code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnergyWindow")]
pub struct EnergyWindow {
    lower_bound: f64,
    upper_bound: f64,
    resolution: usize,
}

/// Unchecked wire form of [`EnergyWindow`].
#[derive(Deserialize)]
struct RawEnergyWindow {
    lower_bound: f64,
    upper_bound: f64,
    resolution: usize,
}

impl TryFrom<RawEnergyWindow> for EnergyWindow {
    type Error = ExtractionError;

    fn try_from(raw: RawEnergyWindow) -> Result<Self, Self::Error> {
        Self::new(raw.lower_bound, raw.upper_bound, raw.resolution)
    }
}

impl Default for EnergyWindow {
    fn default() -> Self {
        Self {
            lower_bound: -1.0,
            upper_bound: 1.0,
            resolution: 1000,
        }
    }
}

impl EnergyWindow {
    /// Create a window. Bounds must be finite with `lower_bound <
    /// upper_bound`, and `resolution` must be at least 2.
    pub fn new(
        lower_bound: f64,
        upper_bound: f64,
        resolution: usize,
    ) -> Result<Self, ExtractionError> {
        if !lower_bound.is_finite() || !upper_bound.is_finite() {
            return Err(ExtractionError::InvalidWindow(format!(
                "bounds must be finite, got [{}, {}]",
                lower_bound, upper_bound
            )));
        }
        if lower_bound >= upper_bound {
            return Err(ExtractionError::InvalidWindow(format!(
                "lower bound {} must be below upper bound {}",
                lower_bound, upper_bound
            )));
        }
        if resolution < 2 {
            return Err(ExtractionError::InvalidWindow(format!(
                "resolution must be at least 2, got {}",
                resolution
            )));
        }
        Ok(Self {
            lower_bound,
            upper_bound,
            resolution,
        })
    }

    /// Energy of the first bin center.
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// Energy of the last bin center.
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Number of bins.
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Spacing dE between neighbouring energies.
    pub fn spacing(&self) -> f64 {
        (self.upper_bound - self.lower_bound) / (self.resolution - 1) as f64
    }

    /// Energy at bin center `n`.
    pub fn energy(&self, n: usize) -> f64 {
        self.lower_bound + n as f64 * self.spacing()
    }

    /// All bin centers, ascending.
    pub fn energies(&self) -> Vec<f64> {
        (0..self.resolution).map(|n| self.energy(n)).collect()
    }

    /// Bin whose center is nearest to `energy`, or `None` outside the window.
    pub fn bin(&self, energy: f64, tie_break: TieBreak) -> Option<usize> {
        let x = (energy - self.lower_bound) / self.spacing();
        let last = (self.resolution - 1) as f64;
        if !(-0.5..=last + 0.5).contains(&x) {
            return None;
        }
        let n = match tie_break {
            TieBreak::Lower => (x - 0.5).ceil(),
            TieBreak::Upper => (x + 0.5).floor(),
        };
        Some(n.clamp(0.0, last) as usize)
    }
}
