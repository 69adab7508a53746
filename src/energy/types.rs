// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Energy representation types.

use serde::{Deserialize, Serialize};

use super::smooth::Smoothing;
use super::window::EnergyWindow;

/// Representation of the energy coordinate of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyType {
    /// Real energy axis
    #[default]
    Real,
    /// Fermionic Matsubara frequencies i(2n+1)πT
    FermionicMatsubara,
    /// Bosonic Matsubara frequencies i2nπT
    BosonicMatsubara,
}

impl std::fmt::Display for EnergyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnergyType::Real => write!(f, "real"),
            EnergyType::FermionicMatsubara => write!(f, "fermionic_matsubara"),
            EnergyType::BosonicMatsubara => write!(f, "bosonic_matsubara"),
        }
    }
}

/// Particle statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistics {
    #[default]
    FermiDirac,
    BoseEinstein,
}

/// Energy metadata attached to an energy-resolved property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnergyAxis {
    Real {
        window: EnergyWindow,
        smoothing: Smoothing,
    },
    FermionicMatsubara {
        count: usize,
        temperature: f64,
    },
    BosonicMatsubara {
        count: usize,
        temperature: f64,
    },
}

impl EnergyAxis {
    /// Number of energy points.
    pub fn len(&self) -> usize {
        match self {
            EnergyAxis::Real { window, .. } => window.resolution(),
            EnergyAxis::FermionicMatsubara { count, .. }
            | EnergyAxis::BosonicMatsubara { count, .. } => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Energy type of the axis.
    pub fn energy_type(&self) -> EnergyType {
        match self {
            EnergyAxis::Real { .. } => EnergyType::Real,
            EnergyAxis::FermionicMatsubara { .. } => EnergyType::FermionicMatsubara,
            EnergyAxis::BosonicMatsubara { .. } => EnergyType::BosonicMatsubara,
        }
    }

    /// Real-axis window, if this is a real axis.
    pub fn window(&self) -> Option<&EnergyWindow> {
        match self {
            EnergyAxis::Real { window, .. } => Some(window),
            _ => None,
        }
    }
}
