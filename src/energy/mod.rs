// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Energy discretization and broadening.
//!
//! - [`EnergyWindow`]: evenly spaced real-axis bins with nearest-bin
//!   deposition and an explicit [`TieBreak`]
//! - [`Smoothing`]: Gaussian or Lorentzian convolution of binned data
//! - [`matsubara_energies`]: fermionic and bosonic imaginary-axis grids
//! - [`EnergyAxis`]: energy metadata carried by property containers

pub mod matsubara;
pub mod smooth;
pub mod types;
pub mod window;

pub use matsubara::matsubara_energies;
pub use smooth::{Kernel, Smoothing};
pub use types::{EnergyAxis, EnergyType, Statistics};
pub use window::{EnergyWindow, TieBreak};
