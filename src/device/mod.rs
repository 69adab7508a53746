// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Compute device pool.

pub mod pool;
pub mod probe;

pub use pool::{DeviceLease, DevicePool};
pub use probe::{DeviceProbe, EnvProbe, FixedProbe, NUM_DEVICES_ENV};
