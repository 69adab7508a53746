// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! State occupation and state selection.

use serde::{Deserialize, Serialize};

use crate::energy::Statistics;
use crate::error::ExtractionError;

/// Thermal occupation of eigenstates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Occupation {
    pub statistics: Statistics,
    pub chemical_potential: f64,
    pub temperature: f64,
}

impl Default for Occupation {
    fn default() -> Self {
        Self {
            statistics: Statistics::FermiDirac,
            chemical_potential: 0.0,
            temperature: 0.0,
        }
    }
}

impl Occupation {
    /// Create an occupation and validate its parameters.
    pub fn new(
        statistics: Statistics,
        chemical_potential: f64,
        temperature: f64,
    ) -> Result<Self, ExtractionError> {
        let occupation = Self {
            statistics,
            chemical_potential,
            temperature,
        };
        occupation.validate()?;
        Ok(occupation)
    }

    /// Check the chemical potential and temperature.
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if !self.chemical_potential.is_finite() {
            return Err(ExtractionError::InvalidOccupation(format!(
                "chemical potential must be finite, got {}",
                self.chemical_potential
            )));
        }
        if !(self.temperature >= 0.0 && self.temperature.is_finite()) {
            return Err(ExtractionError::InvalidOccupation(format!(
                "temperature must be finite and non-negative, got {}",
                self.temperature
            )));
        }
        if self.statistics == Statistics::BoseEinstein && self.temperature == 0.0 {
            return Err(ExtractionError::InvalidOccupation(
                "Bose-Einstein statistics require a positive temperature".into(),
            ));
        }
        Ok(())
    }

    /// Occupation f(E) of a state at `energy`.
    ///
    /// Bose-Einstein occupation is only defined for `energy` above the
    /// chemical potential. At `energy == μ` this returns infinity and below
    /// it a negative value. Use [`Occupation::checked_at`] to reject those.
    pub fn at(&self, energy: f64) -> f64 {
        let x = energy - self.chemical_potential;
        match self.statistics {
            Statistics::FermiDirac if self.temperature == 0.0 => {
                if x < 0.0 {
                    1.0
                } else if x > 0.0 {
                    0.0
                } else {
                    0.5
                }
            }
            Statistics::FermiDirac => {
                let x = x / self.temperature;
                // Split on the sign of x so the exponential never overflows.
                if x > 0.0 {
                    let e = (-x).exp();
                    e / (1.0 + e)
                } else {
                    1.0 / (1.0 + x.exp())
                }
            }
            Statistics::BoseEinstein => 1.0 / (x / self.temperature).exp_m1(),
        }
    }

    /// Like [`Occupation::at`], but fails with `InvalidOccupation` where the
    /// occupation is not a finite non-negative number.
    pub fn checked_at(&self, energy: f64) -> Result<f64, ExtractionError> {
        let f = self.at(energy);
        if !(f.is_finite() && f >= 0.0) {
            return Err(ExtractionError::InvalidOccupation(format!(
                "{:?} occupation undefined at E = {} with chemical potential {}",
                self.statistics, energy, self.chemical_potential
            )));
        }
        Ok(f)
    }
}

/// Eigenstates to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StateSelection {
    #[default]
    All,
    States(Vec<usize>),
}

impl StateSelection {
    /// Concrete state numbers, range-checked against `count`.
    pub fn resolve(&self, count: usize) -> Result<Vec<usize>, ExtractionError> {
        match self {
            StateSelection::All => Ok((0..count).collect()),
            StateSelection::States(states) => {
                if let Some(&state) = states.iter().find(|&&s| s >= count) {
                    return Err(ExtractionError::StateOutOfRange { state, count });
                }
                Ok(states.clone())
            }
        }
    }
}

impl From<Vec<usize>> for StateSelection {
    fn from(states: Vec<usize>) -> Self {
        StateSelection::States(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_temperature_step() {
        let f = Occupation::default();
        assert_eq!(f.at(-0.1), 1.0);
        assert_eq!(f.at(0.0), 0.5);
        assert_eq!(f.at(0.1), 0.0);
    }

    #[test]
    fn test_fermi_dirac_symmetry() {
        let f = Occupation::new(Statistics::FermiDirac, 0.3, 0.05).unwrap();
        assert_relative_eq!(f.at(0.3), 0.5);
        assert_relative_eq!(f.at(0.4) + f.at(0.2), 1.0, epsilon = 1e-12);
        // Far from the chemical potential the tails saturate without overflow.
        assert_eq!(f.at(1e6), 0.0);
        assert_eq!(f.at(-1e6), 1.0);
    }

    #[test]
    fn test_bose_einstein() {
        let f = Occupation::new(Statistics::BoseEinstein, 0.0, 1.0).unwrap();
        assert_relative_eq!(f.at(1.0), 1.0 / (1f64.exp() - 1.0), epsilon = 1e-12);
        assert!(Occupation::new(Statistics::BoseEinstein, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_bose_einstein_below_chemical_potential() {
        let f = Occupation::new(Statistics::BoseEinstein, 0.5, 1.0).unwrap();
        assert_relative_eq!(f.checked_at(1.5).unwrap(), f.at(1.5));
        assert!(matches!(
            f.checked_at(0.5),
            Err(ExtractionError::InvalidOccupation(_))
        ));
        assert!(matches!(
            f.checked_at(-1.0),
            Err(ExtractionError::InvalidOccupation(_))
        ));

        // Fermi-Dirac is defined everywhere.
        let fd = Occupation::default();
        assert_eq!(fd.checked_at(0.0).unwrap(), 0.5);
    }

    #[test]
    fn test_negative_temperature_rejected() {
        assert!(Occupation::new(Statistics::FermiDirac, 0.0, -1.0).is_err());
    }

    #[test]
    fn test_state_selection() {
        assert_eq!(StateSelection::All.resolve(3).unwrap(), vec![0, 1, 2]);
        assert_eq!(
            StateSelection::from(vec![2, 0]).resolve(3).unwrap(),
            vec![2, 0]
        );
        assert_eq!(
            StateSelection::from(vec![0, 3]).resolve(3),
            Err(ExtractionError::StateOutOfRange { state: 3, count: 3 })
        );
    }
}
