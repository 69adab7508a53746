// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Eigensolution access and state occupation.

pub mod occupation;
pub mod solution;

pub use occupation::{Occupation, StateSelection};
pub use solution::{DenseEigensolution, Eigensolution};
