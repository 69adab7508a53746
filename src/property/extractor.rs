// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pattern-driven extraction of physical properties from an eigensolution.
//!
//! Every request resolves its patterns against the index space of the
//! eigensolution and runs the matching accumulator over the resulting
//! groups. The returned containers are keyed by residual index: range
//! wildcards stay in the key, summation and spin wildcards are contracted.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use eigenprop::{Config, PropertyExtractor};
//!
//! let config = Config::load(None)?;
//! let extractor = PropertyExtractor::from_config(Arc::new(solution), &config)?;
//!
//! let dos = extractor.calculate_dos()?;
//! let ldos = extractor.calculate_ldos(&["{*, sum}".parse()?])?;
//! ```

use std::slice;
use std::sync::Arc;

use num_complex::Complex64;
use tracing::info;

use super::accumulate::{
    occupations, traverse, Binning, DensityAccumulator, DosAccumulator,
    GreensFunctionAccumulator, LdosAccumulator, MagnetizationAccumulator,
    SpinPolarizedLdosAccumulator, Traversal, WaveFunctionAccumulator,
};
use super::types::{
    Density, Dos, EigenValues, GreensFunction, GreensFunctionType, Ldos, Magnetization,
    SpinPolarizedLdos, WaveFunctions,
};
use crate::config::Config;
use crate::device::DevicePool;
use crate::eigen::{Eigensolution, Occupation, StateSelection};
use crate::energy::{
    matsubara_energies, EnergyAxis, EnergyType, EnergyWindow, Smoothing, Statistics, TieBreak,
};
use crate::error::{Error, ExtractionError, IndexError, Result};
use crate::index::{CompoundPattern, Index, MatchGroup, Pattern, PatternMatcher, Subindex};

/// Per-extractor calculation parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    pub energy_type: EnergyType,
    pub window: EnergyWindow,
    pub smoothing: Smoothing,
    pub tie_break: TieBreak,
    pub num_matsubara_energies: usize,
    /// η in the real-axis Green's function denominators.
    pub energy_infinitesimal: f64,
    pub normalize_dos: bool,
    pub occupation: Occupation,
    pub parallel: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            energy_type: EnergyType::Real,
            window: EnergyWindow::default(),
            smoothing: Smoothing::none(),
            tie_break: TieBreak::Lower,
            num_matsubara_energies: 100,
            energy_infinitesimal: 1e-3,
            normalize_dos: false,
            occupation: Occupation::default(),
            parallel: true,
        }
    }
}

impl ExtractorConfig {
    /// Check the occupation and the numeric parameters.
    pub fn validate(&self) -> Result<()> {
        self.occupation.validate()?;
        if !(self.energy_infinitesimal > 0.0) {
            return Err(Error::Config(format!(
                "energy_infinitesimal must be positive, got {}",
                self.energy_infinitesimal
            )));
        }
        if !(self.smoothing.width >= 0.0) {
            return Err(Error::Config(format!(
                "broadening width cannot be negative, got {}",
                self.smoothing.width
            )));
        }
        Ok(())
    }
}

impl TryFrom<&Config> for ExtractorConfig {
    type Error = Error;

    fn try_from(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            energy_type: config.energy.energy_type,
            window: config.energy.window()?,
            smoothing: config.broadening.smoothing(),
            tie_break: config.broadening.tie_break,
            num_matsubara_energies: config.energy.num_matsubara_energies,
            energy_infinitesimal: config.energy.energy_infinitesimal,
            normalize_dos: config.energy.normalize_dos,
            occupation: config.occupation.occupation(),
            parallel: config.parallel.enabled,
        })
    }
}

/// Extracts properties from a shared eigensolution.
pub struct PropertyExtractor {
    solution: Arc<dyn Eigensolution>,
    config: ExtractorConfig,
    devices: Option<Arc<DevicePool>>,
}

impl PropertyExtractor {
    /// Create an extractor over `solution`. Fails if `config` is invalid.
    pub fn new(solution: Arc<dyn Eigensolution>, config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            solution,
            config,
            devices: None,
        })
    }

    /// Create an extractor from the `energy`, `broadening`, `occupation` and
    /// `parallel` sections of `config`.
    pub fn from_config(solution: Arc<dyn Eigensolution>, config: &Config) -> Result<Self> {
        Self::new(solution, ExtractorConfig::try_from(config)?)
    }

    /// Hold a device lease per block while computing Green's functions.
    pub fn with_devices(mut self, devices: Arc<DevicePool>) -> Self {
        self.devices = Some(devices);
        self
    }

    /// Extraction settings in effect.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The eigensolution being queried.
    pub fn solution(&self) -> &dyn Eigensolution {
        self.solution.as_ref()
    }

    /// All eigenvalues in ascending order.
    pub fn eigen_values(&self) -> EigenValues {
        EigenValues::new(self.solution.eigenvalues().to_vec())
    }

    /// Eigenvalue of `state`.
    pub fn eigen_value(&self, state: usize) -> Result<f64> {
        Ok(self.solution.eigenvalue(state)?)
    }

    /// Amplitude of `state` at `index`.
    pub fn amplitude(&self, state: usize, index: &Index) -> Result<Complex64> {
        self.solution.amplitude(state, index)
    }

    /// Amplitudes of the selected states on every index matched by
    /// `patterns`.
    pub fn calculate_wave_functions(
        &self,
        patterns: &[Pattern],
        states: &StateSelection,
    ) -> Result<WaveFunctions> {
        reject_wildcards(patterns, &[Subindex::Sum, Subindex::Spin], "wave functions")?;
        let states = states.resolve(self.solution.eigenvalue_count())?;
        let groups = self.matcher().match_patterns(patterns)?;
        info!(
            property = "wave_functions",
            groups = groups.len(),
            states = states.len(),
            "Extracting property"
        );

        let accumulator = WaveFunctionAccumulator {
            solution: self.solution(),
            states: states.clone(),
        };
        let amplitudes = traverse(&accumulator, groups, None, self.traversal(false))?;
        Ok(WaveFunctions::new(states, amplitudes))
    }

    /// Green's function over the (to, from) pairs matched by `patterns`.
    ///
    /// Real-axis kinds need a real energy axis, `Matsubara` needs the
    /// fermionic Matsubara axis.
    pub fn calculate_greens_function(
        &self,
        patterns: &[CompoundPattern],
        kind: GreensFunctionType,
    ) -> Result<GreensFunction> {
        const CONTEXT: &str = "Green's function";
        for pattern in patterns {
            reject_wildcards(pattern.components(), &[Subindex::Spin], CONTEXT)?;
        }

        let (points, axis) = match kind {
            GreensFunctionType::Matsubara => {
                self.require_energy_type(EnergyType::FermionicMatsubara, CONTEXT)?;
                let temperature = self.config.occupation.temperature;
                let mu = self.config.occupation.chemical_potential;
                let points: Vec<Complex64> = matsubara_energies(
                    Statistics::FermiDirac,
                    self.config.num_matsubara_energies,
                    temperature,
                )?
                .into_iter()
                .map(|w| w + mu)
                .collect();
                let axis = EnergyAxis::FermionicMatsubara {
                    count: self.config.num_matsubara_energies,
                    temperature,
                };
                (points, axis)
            }
            _ => {
                self.require_energy_type(EnergyType::Real, CONTEXT)?;
                let window = self.config.window;
                let points: Vec<Complex64> = window
                    .energies()
                    .into_iter()
                    .map(|e| Complex64::new(e, 0.0))
                    .collect();
                let axis = EnergyAxis::Real {
                    window,
                    smoothing: Smoothing::none(),
                };
                (points, axis)
            }
        };

        let groups = self.matcher().match_compound(patterns, 2, CONTEXT)?;
        info!(
            property = "greens_function",
            kind = ?kind,
            groups = groups.len(),
            "Extracting property"
        );

        let accumulator = GreensFunctionAccumulator {
            solution: self.solution(),
            kind,
            points,
            infinitesimal: self.config.energy_infinitesimal,
        };
        let values = traverse(&accumulator, groups, Some(axis), self.traversal(true))?;
        Ok(GreensFunction::new(kind, values))
    }

    /// Density of states on the real-axis window.
    pub fn calculate_dos(&self) -> Result<Dos> {
        let (window, axis) = self.real_axis("DOS")?;
        let count = self.solution.eigenvalue_count();
        let mut weight = 1.0 / window.spacing();
        if self.config.normalize_dos && count > 0 {
            weight /= count as f64;
        }
        info!(property = "dos", states = count, "Extracting property");

        let accumulator = DosAccumulator {
            binning: self.binning(&window),
            weight,
        };
        let groups = vec![MatchGroup {
            key: (),
            members: (0..count).collect(),
        }];
        traverse(&accumulator, groups, Some(axis), self.traversal(false))
    }

    /// Σ_n f(E_n) ψ_n(to) ψ_n*(from)
    pub fn calculate_expectation_value(&self, to: &Index, from: &Index) -> Result<Complex64> {
        let space = self.solution.index_space();
        let to = space.require_offset(to)?;
        let from = space.require_offset(from)?;
        Ok(self
            .occupations()?
            .iter()
            .enumerate()
            .filter(|(_, &f)| f != 0.0)
            .map(|(n, &f)| {
                f * self.solution.amplitude_at(n, to) * self.solution.amplitude_at(n, from).conj()
            })
            .sum())
    }

    /// Density Σ_n f(E_n) |ψ_n(x)|² for the union of `patterns`.
    ///
    /// `Sum` positions are summed into one key. Spin wildcards are rejected.
    pub fn calculate_density(&self, patterns: &[Pattern]) -> Result<Density> {
        reject_wildcards(patterns, &[Subindex::Spin], "density")?;
        let groups = self.matcher().match_patterns(patterns)?;
        self.density(groups)
    }

    /// Density on `pattern` with `All` and `Sum` positions taking the values
    /// `0..ranges[i]`.
    pub fn calculate_density_in_ranges(
        &self,
        pattern: &Pattern,
        ranges: &[usize],
    ) -> Result<Density> {
        reject_wildcards(slice::from_ref(pattern), &[Subindex::Spin], "density")?;
        let groups = self.matcher().match_ranges(pattern, ranges)?;
        self.density(groups)
    }

    /// 2x2 spin density matrix Σ_n f(E_n) ψ_n*(σ) ψ_n(σ') per key.
    ///
    /// Every pattern needs exactly one spin wildcard.
    pub fn calculate_magnetization(&self, patterns: &[Pattern]) -> Result<Magnetization> {
        require_spin(patterns, "magnetization")?;
        let groups = self.matcher().match_patterns(patterns)?;
        self.magnetization(groups)
    }

    /// Magnetization over the ranges form of `pattern`.
    pub fn calculate_magnetization_in_ranges(
        &self,
        pattern: &Pattern,
        ranges: &[usize],
    ) -> Result<Magnetization> {
        require_spin(slice::from_ref(pattern), "magnetization")?;
        let groups = self.matcher().match_ranges(pattern, ranges)?;
        self.magnetization(groups)
    }

    /// Local density of states on the real axis for the union of `patterns`.
    pub fn calculate_ldos(&self, patterns: &[Pattern]) -> Result<Ldos> {
        reject_wildcards(patterns, &[Subindex::Spin], "LDOS")?;
        let groups = self.matcher().match_patterns(patterns)?;
        self.ldos(groups)
    }

    /// LDOS over the ranges form of `pattern`.
    pub fn calculate_ldos_in_ranges(&self, pattern: &Pattern, ranges: &[usize]) -> Result<Ldos> {
        reject_wildcards(slice::from_ref(pattern), &[Subindex::Spin], "LDOS")?;
        let groups = self.matcher().match_ranges(pattern, ranges)?;
        self.ldos(groups)
    }

    /// Spin-resolved LDOS, one `SpinMatrix` per energy and key.
    ///
    /// Every pattern needs exactly one spin wildcard.
    pub fn calculate_spin_polarized_ldos(&self, patterns: &[Pattern]) -> Result<SpinPolarizedLdos> {
        require_spin(patterns, "spin-polarized LDOS")?;
        let groups = self.matcher().match_patterns(patterns)?;
        self.spin_polarized_ldos(groups)
    }

    /// Spin-polarized LDOS over the ranges form of `pattern`.
    pub fn calculate_spin_polarized_ldos_in_ranges(
        &self,
        pattern: &Pattern,
        ranges: &[usize],
    ) -> Result<SpinPolarizedLdos> {
        require_spin(slice::from_ref(pattern), "spin-polarized LDOS")?;
        let groups = self.matcher().match_ranges(pattern, ranges)?;
        self.spin_polarized_ldos(groups)
    }

    /// Entropy -Σ_n p_n ln p_n with p_n = f(E_n).
    pub fn calculate_entropy(&self) -> Result<f64> {
        let entropy: f64 = self
            .occupations()?
            .into_iter()
            .filter(|&p| p > 0.0)
            .map(|p| p * p.ln())
            .sum();
        Ok(-entropy)
    }

    fn density(&self, groups: Vec<MatchGroup<Index>>) -> Result<Density> {
        info!(property = "density", groups = groups.len(), "Extracting property");
        let accumulator = DensityAccumulator {
            solution: self.solution(),
            occupations: self.occupations()?,
        };
        traverse(&accumulator, groups, None, self.traversal(false))
    }

    fn magnetization(&self, groups: Vec<MatchGroup<Index>>) -> Result<Magnetization> {
        info!(property = "magnetization", groups = groups.len(), "Extracting property");
        let accumulator = MagnetizationAccumulator {
            solution: self.solution(),
            occupations: self.occupations()?,
        };
        traverse(&accumulator, groups, None, self.traversal(false))
    }

    fn ldos(&self, groups: Vec<MatchGroup<Index>>) -> Result<Ldos> {
        let (window, axis) = self.real_axis("LDOS")?;
        info!(property = "ldos", groups = groups.len(), "Extracting property");
        let accumulator = LdosAccumulator {
            solution: self.solution(),
            binning: self.binning(&window),
        };
        traverse(&accumulator, groups, Some(axis), self.traversal(false))
    }

    fn spin_polarized_ldos(&self, groups: Vec<MatchGroup<Index>>) -> Result<SpinPolarizedLdos> {
        let (window, axis) = self.real_axis("spin-polarized LDOS")?;
        info!(property = "spin_polarized_ldos", groups = groups.len(), "Extracting property");
        let accumulator = SpinPolarizedLdosAccumulator {
            solution: self.solution(),
            binning: self.binning(&window),
        };
        traverse(&accumulator, groups, Some(axis), self.traversal(false))
    }

    fn matcher(&self) -> PatternMatcher<'_> {
        PatternMatcher::new(self.solution.index_space())
    }

    fn traversal(&self, leased: bool) -> Traversal<'_> {
        Traversal {
            parallel: self.config.parallel,
            devices: if leased { self.devices.as_deref() } else { None },
        }
    }

    fn occupations(&self) -> Result<Vec<f64>> {
        occupations(self.solution(), &self.config.occupation)
    }

    fn binning(&self, window: &EnergyWindow) -> Binning {
        Binning::new(
            self.solution(),
            window,
            self.config.tie_break,
            self.config.smoothing,
        )
    }

    fn real_axis(&self, context: &str) -> Result<(EnergyWindow, EnergyAxis)> {
        self.require_energy_type(EnergyType::Real, context)?;
        let window = self.config.window;
        Ok((
            window,
            EnergyAxis::Real {
                window,
                smoothing: self.config.smoothing,
            },
        ))
    }

    fn require_energy_type(&self, required: EnergyType, context: &str) -> Result<()> {
        if self.config.energy_type == required {
            Ok(())
        } else {
            Err(ExtractionError::EnergyType {
                context: context.into(),
                message: format!(
                    "requires energy type {}, configured {}",
                    required, self.config.energy_type
                ),
            }
            .into())
        }
    }
}

fn reject_wildcards(patterns: &[Pattern], wildcards: &[Subindex], context: &str) -> Result<()> {
    for pattern in patterns {
        if let Some(wildcard) = wildcards.iter().find(|w| pattern.contains(**w)) {
            return Err(IndexError::UnsupportedWildcard {
                wildcard: wildcard.to_string(),
                context: format!("{} (pattern {})", context, pattern),
            }
            .into());
        }
    }
    Ok(())
}

fn require_spin(patterns: &[Pattern], context: &str) -> Result<()> {
    for pattern in patterns {
        if pattern.spin_position()?.is_none() {
            return Err(IndexError::UnsupportedWildcard {
                wildcard: Subindex::Spin.to_string(),
                context: format!("{} requires one spin subindex (pattern {})", context, pattern),
            }
            .into());
        }
    }
    Ok(())
}
