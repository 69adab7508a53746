// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Matsubara frequency grids.

use std::f64::consts::PI;

use num_complex::Complex64;

use super::types::Statistics;
use crate::error::ExtractionError;

/// The first `count` non-negative Matsubara frequencies at `temperature`.
///
/// Fermionic: iω_n = i(2n+1)πT. Bosonic: iω_n = i2nπT.
pub fn matsubara_energies(
    statistics: Statistics,
    count: usize,
    temperature: f64,
) -> Result<Vec<Complex64>, ExtractionError> {
    if !(temperature > 0.0 && temperature.is_finite()) {
        return Err(ExtractionError::EnergyType {
            context: "matsubara_energies".into(),
            message: format!(
                "Matsubara frequencies require a positive temperature, got {}",
                temperature
            ),
        });
    }
    let offset = match statistics {
        Statistics::FermiDirac => 1.0,
        Statistics::BoseEinstein => 0.0,
    };
    Ok((0..count)
        .map(|n| Complex64::new(0.0, (2.0 * n as f64 + offset) * PI * temperature))
        .collect())
}
