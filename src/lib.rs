// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! eigenprop: property extraction from eigen-decomposed lattice models
//!
//! This crate computes physical observables (densities of states, local
//! densities, magnetization, Green's functions, expectation values, entropy)
//! from a completed eigen-decomposition of a Hamiltonian on a sparse,
//! arbitrarily indexed basis. Callers select basis elements with wildcard
//! patterns instead of enumerating them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           PropertyExtractor              │
//! ├──────────────────┬──────────────────────┤
//! │  PatternMatcher  │  PropertyAccumulator │
//! │  (IndexSpace)    │  (rayon traversal)   │
//! ├──────────────────┴──────────────────────┤
//! │   Eigensolution   │  EnergyWindow        │
//! │   (ndarray)       │  DevicePool          │
//! └───────────────────┴─────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`index`]: Indices, wildcard patterns and pattern matching
//! - [`eigen`]: Eigensolution interface and state occupation
//! - [`energy`]: Energy windows, broadening and Matsubara grids
//! - [`property`]: Property extraction and result containers
//! - [`device`]: Compute device lease pool
//! - [`config`]: Configuration management
//! - [`logging`]: Tracing subscriber setup
//! - [`error`]: Error types

pub mod config;
pub mod device;
pub mod eigen;
pub mod energy;
pub mod error;
pub mod index;
pub mod logging;
pub mod property;

pub use config::Config;
pub use device::{DeviceLease, DevicePool};
pub use eigen::{DenseEigensolution, Eigensolution, Occupation, StateSelection};
pub use energy::{EnergyType, EnergyWindow, Smoothing, TieBreak};
pub use error::{Error, Result};
pub use index::{CompoundIndex, CompoundPattern, Index, IndexSpace, Pattern, Subindex};
pub use property::{ElectronFluctuationVertex, InteractionAmplitude, PropertyExtractor};

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
