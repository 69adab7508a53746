// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Property extraction.
//!
//! - [`PropertyExtractor`]: pattern-driven requests against an eigensolution
//! - [`ElectronFluctuationVertex`]: self-energy vertex from a susceptibility
//! - [`PropertyAccumulator`]: the per-property kernel run over match groups
//! - [`Property`]: keyed, block-structured result container

pub mod accumulate;
pub mod extractor;
pub mod types;
pub mod vertex;

pub use accumulate::{traverse, PropertyAccumulator, Traversal};
pub use extractor::{ExtractorConfig, PropertyExtractor};
pub use types::{
    Density, Dos, EigenValues, GreensFunction, GreensFunctionType, Ldos, Magnetization, Property,
    SelfEnergyVertex, SpinMatrix, SpinPolarizedLdos, Susceptibility, WaveFunctions,
};
pub use vertex::{ElectronFluctuationVertex, InteractionAmplitude, AMPLITUDE_CUTOFF};
