// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management for property extraction.
//!
//! Configuration is loaded from multiple sources with the following priority
//! (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. eigenprop.yaml file
//! 3. Environment variables (EIGENPROP_*)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::eigen::Occupation;
use crate::energy::{EnergyType, EnergyWindow, Kernel, Smoothing, Statistics, TieBreak};
use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Energy axis settings
    #[serde(default)]
    pub energy: EnergyConfig,

    /// Broadening of energy-resolved properties
    #[serde(default)]
    pub broadening: BroadeningConfig,

    /// State occupation
    #[serde(default)]
    pub occupation: OccupationConfig,

    /// Parallel traversal
    #[serde(default)]
    pub parallel: ParallelConfig,

    /// Compute device pool
    #[serde(default)]
    pub devices: DevicesConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                config = Self::from_file(path)?;
            }
        } else {
            for path in &["eigenprop.yaml", "eigenprop.yml"] {
                let path = Path::new(path);
                if path.exists() {
                    config = Self::from_file(path)?;
                    break;
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Parse a YAML file without environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("EIGENPROP_ENERGY_TYPE") {
            match serde_yaml::from_str(&val) {
                Ok(energy_type) => self.energy.energy_type = energy_type,
                Err(_) => tracing::warn!(value = %val, "Ignoring invalid EIGENPROP_ENERGY_TYPE"),
            }
        }
        if let Ok(val) = env::var("EIGENPROP_LOWER_BOUND") {
            if let Ok(bound) = val.parse() {
                self.energy.lower_bound = bound;
            }
        }
        if let Ok(val) = env::var("EIGENPROP_UPPER_BOUND") {
            if let Ok(bound) = val.parse() {
                self.energy.upper_bound = bound;
            }
        }
        if let Ok(val) = env::var("EIGENPROP_RESOLUTION") {
            if let Ok(resolution) = val.parse() {
                self.energy.resolution = resolution;
            }
        }
        if let Ok(val) = env::var("EIGENPROP_BROADENING_WIDTH") {
            if let Ok(width) = val.parse() {
                self.broadening.width = width;
            }
        }
        if let Ok(val) = env::var("EIGENPROP_TEMPERATURE") {
            if let Ok(temperature) = val.parse() {
                self.occupation.temperature = temperature;
            }
        }
        if let Ok(val) = env::var("EIGENPROP_CHEMICAL_POTENTIAL") {
            if let Ok(mu) = val.parse() {
                self.occupation.chemical_potential = mu;
            }
        }
        if let Ok(val) = env::var("EIGENPROP_PARALLEL") {
            self.parallel.enabled = val.to_lowercase() == "true" || val == "1";
        }
        if let Ok(val) = env::var("EIGENPROP_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("EIGENPROP_LOG_FORMAT") {
            self.logging.format = val;
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        self.energy.window()?;

        if self.energy.energy_type != EnergyType::Real && self.energy.num_matsubara_energies == 0 {
            return Err(Error::Config(format!(
                "num_matsubara_energies must be positive for energy type {}",
                self.energy.energy_type
            )));
        }
        if !(self.energy.energy_infinitesimal > 0.0) {
            return Err(Error::Config(format!(
                "energy_infinitesimal must be positive, got {}",
                self.energy.energy_infinitesimal
            )));
        }
        if !(self.broadening.width >= 0.0) {
            return Err(Error::Config(format!(
                "broadening width cannot be negative, got {}",
                self.broadening.width
            )));
        }
        self.occupation
            .occupation()
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        if self.energy.energy_type != EnergyType::Real && self.occupation.temperature == 0.0 {
            return Err(Error::Config(
                "Matsubara energies require a positive temperature".into(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(Error::Config(format!(
                "log format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            )));
        }
        if self.devices.count == Some(0) {
            tracing::warn!(
                "Device pool configured with zero devices, leased calculations will fail"
            );
        }
        Ok(())
    }
}

/// Energy axis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Real axis or Matsubara frequencies
    #[serde(default)]
    pub energy_type: EnergyType,

    /// Lowest energy of the real-axis window
    #[serde(default = "default_lower_bound")]
    pub lower_bound: f64,

    /// Highest energy of the real-axis window
    #[serde(default = "default_upper_bound")]
    pub upper_bound: f64,

    /// Number of real-axis energy points
    #[serde(default = "default_resolution")]
    pub resolution: usize,

    /// Number of Matsubara frequencies
    #[serde(default = "default_num_matsubara_energies")]
    pub num_matsubara_energies: usize,

    /// Infinitesimal η of the Green's function denominators
    #[serde(default = "default_energy_infinitesimal")]
    pub energy_infinitesimal: f64,

    /// Divide the DOS by the number of states
    #[serde(default)]
    pub normalize_dos: bool,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            energy_type: EnergyType::Real,
            lower_bound: default_lower_bound(),
            upper_bound: default_upper_bound(),
            resolution: default_resolution(),
            num_matsubara_energies: default_num_matsubara_energies(),
            energy_infinitesimal: default_energy_infinitesimal(),
            normalize_dos: false,
        }
    }
}

impl EnergyConfig {
    /// The configured real-axis window.
    pub fn window(&self) -> Result<EnergyWindow> {
        EnergyWindow::new(self.lower_bound, self.upper_bound, self.resolution)
            .map_err(|e| Error::Config(e.to_string()))
    }
}

fn default_lower_bound() -> f64 {
    -1.0
}

fn default_upper_bound() -> f64 {
    1.0
}

fn default_resolution() -> usize {
    1000
}

fn default_num_matsubara_energies() -> usize {
    100
}

fn default_energy_infinitesimal() -> f64 {
    1e-3
}

/// Broadening configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BroadeningConfig {
    /// Kernel width, 0 disables broadening
    #[serde(default)]
    pub width: f64,

    /// Kernel shape
    #[serde(default)]
    pub kernel: Kernel,

    /// Bin receiving values exactly between two bins
    #[serde(default)]
    pub tie_break: TieBreak,

    /// Kernel half-window in bins (derived from the width when unset)
    #[serde(default)]
    pub window: Option<usize>,
}

impl BroadeningConfig {
    /// Broadening as a [`Smoothing`] kernel.
    pub fn smoothing(&self) -> Smoothing {
        Smoothing {
            width: self.width,
            kernel: self.kernel,
            window: self.window,
        }
    }
}

/// Occupation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OccupationConfig {
    #[serde(default)]
    pub statistics: Statistics,

    #[serde(default)]
    pub chemical_potential: f64,

    /// Temperature in energy units (k_B = 1)
    #[serde(default)]
    pub temperature: f64,
}

impl OccupationConfig {
    /// Occupation described by this section. Validation happens in
    /// [`Occupation::validate`].
    pub fn occupation(&self) -> Occupation {
        Occupation {
            statistics: self.statistics,
            chemical_potential: self.chemical_potential,
            temperature: self.temperature,
        }
    }
}

/// Parallel traversal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Disable to force sequential traversal
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Device pool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevicesConfig {
    /// Fixed device count (probed from the environment when unset)
    #[serde(default)]
    pub count: Option<usize>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.energy.energy_type, EnergyType::Real);
        assert_eq!(config.energy.lower_bound, -1.0);
        assert_eq!(config.energy.upper_bound, 1.0);
        assert_eq!(config.energy.resolution, 1000);
        assert_eq!(config.energy.energy_infinitesimal, 1e-3);
        assert_eq!(config.broadening.width, 0.0);
        assert_eq!(config.occupation.statistics, Statistics::FermiDirac);
        assert_eq!(config.occupation.temperature, 0.0);
        assert!(config.parallel.enabled);
        assert!(config.devices.count.is_none());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut bad_config = Config::default();
        bad_config.energy.resolution = 1;
        assert!(bad_config.validate().is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
energy:
  lower_bound: -3.0
  upper_bound: 3.0
  resolution: 601
broadening:
  width: 0.05
  kernel: lorentzian
  tie_break: upper
occupation:
  temperature: 0.01
parallel:
  enabled: false
devices:
  count: 2
"#
        )
        .unwrap();

        let config = Config::from_file(f.path()).unwrap();
        assert_eq!(config.energy.lower_bound, -3.0);
        assert_eq!(config.energy.resolution, 601);
        // Unset fields keep their defaults.
        assert_eq!(config.energy.energy_infinitesimal, 1e-3);
        assert_eq!(config.broadening.kernel, Kernel::Lorentzian);
        assert_eq!(config.broadening.tie_break, TieBreak::Upper);
        assert_eq!(config.occupation.temperature, 0.01);
        assert!(!config.parallel.enabled);
        assert_eq!(config.devices.count, Some(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let path = std::path::Path::new("/tmp/does_not_exist_eigenprop_test.yaml");
        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.energy.energy_infinitesimal, 1e-3);
    }

    #[test]
    fn test_config_load_invalid_yaml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{{{{not: valid: yaml::::").unwrap();

        let result = Config::load(Some(f.path()));
        assert!(matches!(result, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_env_override_window() {
        let mut config = Config::default();
        std::env::set_var("EIGENPROP_LOWER_BOUND", "-5");
        std::env::set_var("EIGENPROP_RESOLUTION", "11");
        config.apply_env_overrides();
        assert_eq!(config.energy.lower_bound, -5.0);
        assert_eq!(config.energy.resolution, 11);
        std::env::remove_var("EIGENPROP_LOWER_BOUND");
        std::env::remove_var("EIGENPROP_RESOLUTION");
    }

    #[test]
    fn test_env_override_energy_type() {
        let mut config = Config::default();
        std::env::set_var("EIGENPROP_ENERGY_TYPE", "bosonic_matsubara");
        config.apply_env_overrides();
        assert_eq!(config.energy.energy_type, EnergyType::BosonicMatsubara);

        std::env::set_var("EIGENPROP_ENERGY_TYPE", "imaginary");
        config.apply_env_overrides();
        assert_eq!(config.energy.energy_type, EnergyType::BosonicMatsubara);
        std::env::remove_var("EIGENPROP_ENERGY_TYPE");
    }

    #[test]
    fn test_env_override_parallel() {
        let mut config = Config::default();
        std::env::set_var("EIGENPROP_PARALLEL", "false");
        config.apply_env_overrides();
        assert!(!config.parallel.enabled);

        std::env::set_var("EIGENPROP_PARALLEL", "1");
        config.apply_env_overrides();
        assert!(config.parallel.enabled);
        std::env::remove_var("EIGENPROP_PARALLEL");
    }

    #[test]
    fn test_env_override_log_level() {
        let mut config = Config::default();
        std::env::set_var("EIGENPROP_LOG_LEVEL", "debug");
        config.apply_env_overrides();
        assert_eq!(config.logging.level, "debug");
        std::env::remove_var("EIGENPROP_LOG_LEVEL");
    }

    #[test]
    fn test_validate_matsubara_count() {
        let mut config = Config::default();
        config.energy.energy_type = EnergyType::FermionicMatsubara;
        config.occupation.temperature = 0.1;
        config.energy.num_matsubara_energies = 0;
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("num_matsubara_energies"));

        config.energy.num_matsubara_energies = 16;
        assert!(config.validate().is_ok());

        config.occupation.temperature = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_negative_width() {
        let mut config = Config::default();
        config.broadening.width = -0.1;
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("width"));
    }

    #[test]
    fn test_validate_infinitesimal() {
        let mut config = Config::default();
        config.energy.energy_infinitesimal = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_occupation() {
        let mut config = Config::default();
        config.occupation.temperature = -1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.occupation.statistics = Statistics::BoseEinstein;
        assert!(config.validate().is_err());
        config.occupation.temperature = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".into();
        assert!(config.validate().is_err());
    }
}
