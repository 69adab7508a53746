// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Device discovery.

use std::env;

use crate::error::{Error, Result};

/// Environment variable read by [`EnvProbe`].
pub const NUM_DEVICES_ENV: &str = "EIGENPROP_NUM_DEVICES";

/// Reports how many compute devices are available.
pub trait DeviceProbe: Send + Sync {
    fn name(&self) -> &str;

    /// Number of devices. An error leaves the pool empty.
    fn probe(&self) -> Result<usize>;
}

/// A fixed device count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedProbe(pub usize);

impl DeviceProbe for FixedProbe {
    fn name(&self) -> &str {
        "fixed"
    }

    fn probe(&self) -> Result<usize> {
        Ok(self.0)
    }
}

/// Reads the device count from `EIGENPROP_NUM_DEVICES`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvProbe;

impl DeviceProbe for EnvProbe {
    fn name(&self) -> &str {
        "env"
    }

    fn probe(&self) -> Result<usize> {
        let value = env::var(NUM_DEVICES_ENV)
            .map_err(|_| Error::Config(format!("{} is not set", NUM_DEVICES_ENV)))?;
        value.trim().parse().map_err(|_| {
            Error::Config(format!(
                "{} must be a non-negative integer, got '{}'",
                NUM_DEVICES_ENV, value
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_probe() {
        assert_eq!(FixedProbe(3).probe().unwrap(), 3);
    }

    // The only test touching EIGENPROP_NUM_DEVICES, so the steps run in
    // sequence here.
    #[test]
    fn test_env_probe() {
        env::remove_var(NUM_DEVICES_ENV);
        assert!(EnvProbe.probe().is_err());

        env::set_var(NUM_DEVICES_ENV, "4");
        assert_eq!(EnvProbe.probe().unwrap(), 4);

        env::set_var(NUM_DEVICES_ENV, "many");
        assert!(matches!(EnvProbe.probe(), Err(Error::Config(_))));

        env::remove_var(NUM_DEVICES_ENV);
    }
}
