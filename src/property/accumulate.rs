// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-property accumulation kernels and the shared block traversal.
//!
//! Every extraction resolves its request into match groups, lays out one
//! zeroed block per group and hands each block to a
//! [`PropertyAccumulator`] together with the group members. Blocks are
//! disjoint, so groups are processed in parallel without locking.

use std::hash::Hash;

use num_complex::Complex64;
use rayon::prelude::*;
use tracing::debug;

use super::types::{GreensFunctionType, Property, SpinMatrix};
use crate::device::DevicePool;
use crate::eigen::{Eigensolution, Occupation};
use crate::energy::{EnergyAxis, EnergyWindow, Smoothing, TieBreak};
use crate::error::{Error, IndexError, Result};
use crate::index::{MatchGroup, Site};

/// Fills the block of one output key from its members.
pub trait PropertyAccumulator: Sync {
    /// What a match group contributes, one per contracted element.
    type Member: Sync;
    /// Stored value type.
    type Value: Copy + Default + Send + Sync;

    /// Values per output key.
    fn block_size(&self) -> usize;

    /// Add the contribution of `member` to `block`.
    fn accumulate(&self, member: &Self::Member, block: &mut [Self::Value]) -> Result<()>;

    /// Post-process a fully accumulated block.
    fn finalize(&self, _block: &mut [Self::Value]) {}
}

/// How the traversal runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Traversal<'p> {
    pub parallel: bool,
    /// Every block holds a lease from this pool while it is computed.
    pub devices: Option<&'p DevicePool>,
}

/// Run `accumulator` over `groups` and collect the blocks into a property.
///
/// Any error from any block aborts the whole traversal.
pub fn traverse<A, K>(
    accumulator: &A,
    groups: Vec<MatchGroup<K, A::Member>>,
    axis: Option<EnergyAxis>,
    traversal: Traversal<'_>,
) -> Result<Property<K, A::Value>>
where
    A: PropertyAccumulator,
    K: Clone + Eq + Hash,
{
    let (keys, members): (Vec<K>, Vec<Vec<A::Member>>) =
        groups.into_iter().map(|g| (g.key, g.members)).unzip();
    let block_size = accumulator.block_size();
    let mut property = Property::zeroed(keys, block_size, axis);
    if block_size == 0 || members.is_empty() {
        return Ok(property);
    }

    debug!(
        groups = members.len(),
        block_size,
        parallel = traversal.parallel,
        "Traversing match groups"
    );

    let devices = traversal.devices;
    if traversal.parallel {
        property
            .data_mut()
            .par_chunks_mut(block_size)
            .zip(members.par_iter())
            .try_for_each(|(block, group)| fill_block(accumulator, devices, group, block))?;
    } else {
        property
            .data_mut()
            .chunks_mut(block_size)
            .zip(members.iter())
            .try_for_each(|(block, group)| fill_block(accumulator, devices, group, block))?;
    }
    Ok(property)
}

fn fill_block<A: PropertyAccumulator>(
    accumulator: &A,
    devices: Option<&DevicePool>,
    members: &[A::Member],
    block: &mut [A::Value],
) -> Result<()> {
    let _lease = devices.map(DevicePool::allocate).transpose()?;
    for member in members {
        accumulator.accumulate(member, block)?;
    }
    accumulator.finalize(block);
    Ok(())
}

/// Occupation weights f(E_n) for every state. Fails if any state has no
/// defined occupation.
pub(crate) fn occupations(
    solution: &dyn Eigensolution,
    occupation: &Occupation,
) -> Result<Vec<f64>> {
    solution
        .eigenvalues()
        .iter()
        .map(|&e| occupation.checked_at(e).map_err(Error::from))
        .collect()
}

/// Spin partner of a site matched by a spin pattern.
fn partner(site: &Site) -> Result<usize> {
    site.spin_partner.ok_or_else(|| {
        IndexError::UnsupportedWildcard {
            wildcard: "spin".into(),
            context: format!("index {} matched without a spin subindex", site.index),
        }
        .into()
    })
}

/// Real-axis binning shared by the energy-resolved accumulators.
#[derive(Debug, Clone)]
pub(crate) struct Binning {
    /// Bin of each eigenvalue, `None` outside the window.
    bins: Vec<Option<usize>>,
    resolution: usize,
    spacing: f64,
    smoothing: Smoothing,
}

impl Binning {
    /// Bin every eigenvalue of `solution` into `window` once.
    pub(crate) fn new(
        solution: &dyn Eigensolution,
        window: &EnergyWindow,
        tie_break: TieBreak,
        smoothing: Smoothing,
    ) -> Self {
        Self {
            bins: solution
                .eigenvalues()
                .iter()
                .map(|&e| window.bin(e, tie_break))
                .collect(),
            resolution: window.resolution(),
            spacing: window.spacing(),
            smoothing,
        }
    }

    fn states(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bins
            .iter()
            .enumerate()
            .filter_map(|(n, bin)| bin.map(|bin| (n, bin)))
    }
}

/// Histogram of eigenvalues weighted `1/dE` (or `1/(N dE)` when normalized).
pub(crate) struct DosAccumulator {
    pub binning: Binning,
    pub weight: f64,
}

impl PropertyAccumulator for DosAccumulator {
    /// Eigenstate number.
    type Member = usize;
    type Value = f64;

    fn block_size(&self) -> usize {
        self.binning.resolution
    }

    fn accumulate(&self, state: &usize, block: &mut [f64]) -> Result<()> {
        if let Some(bin) = self.binning.bins[*state] {
            block[bin] += self.weight;
        }
        Ok(())
    }

    fn finalize(&self, block: &mut [f64]) {
        self.binning.smoothing.apply(block, self.binning.spacing);
    }
}

/// Σ_n f(E_n) |ψ_n(x)|²
pub(crate) struct DensityAccumulator<'a> {
    pub solution: &'a dyn Eigensolution,
    pub occupations: Vec<f64>,
}

impl PropertyAccumulator for DensityAccumulator<'_> {
    type Member = Site;
    type Value = f64;

    fn block_size(&self) -> usize {
        1
    }

    fn accumulate(&self, site: &Site, block: &mut [f64]) -> Result<()> {
        for (n, &f) in self.occupations.iter().enumerate() {
            if f != 0.0 {
                block[0] += f * self.solution.amplitude_at(n, site.offset).norm_sqr();
            }
        }
        Ok(())
    }
}

/// Σ_n f(E_n) ψ_n*(x,σ) ψ_n(x,σ')
pub(crate) struct MagnetizationAccumulator<'a> {
    pub solution: &'a dyn Eigensolution,
    pub occupations: Vec<f64>,
}

impl PropertyAccumulator for MagnetizationAccumulator<'_> {
    type Member = Site;
    type Value = SpinMatrix;

    fn block_size(&self) -> usize {
        1
    }

    fn accumulate(&self, site: &Site, block: &mut [SpinMatrix]) -> Result<()> {
        let down = partner(site)?;
        for (n, &f) in self.occupations.iter().enumerate() {
            if f != 0.0 {
                let spinor = SpinMatrix::from_spinor(
                    self.solution.amplitude_at(n, site.offset),
                    self.solution.amplitude_at(n, down),
                );
                block[0] += spinor * f;
            }
        }
        Ok(())
    }
}

/// |ψ_n(x)|²/dE deposited in the bin of E_n.
pub(crate) struct LdosAccumulator<'a> {
    pub solution: &'a dyn Eigensolution,
    pub binning: Binning,
}

impl PropertyAccumulator for LdosAccumulator<'_> {
    type Member = Site;
    type Value = f64;

    fn block_size(&self) -> usize {
        self.binning.resolution
    }

    fn accumulate(&self, site: &Site, block: &mut [f64]) -> Result<()> {
        let weight = 1.0 / self.binning.spacing;
        for (n, bin) in self.binning.states() {
            block[bin] += self.solution.amplitude_at(n, site.offset).norm_sqr() * weight;
        }
        Ok(())
    }

    fn finalize(&self, block: &mut [f64]) {
        self.binning.smoothing.apply(block, self.binning.spacing);
    }
}

/// Spin matrix of ψ_n(x)/dE deposited in the bin of E_n.
pub(crate) struct SpinPolarizedLdosAccumulator<'a> {
    pub solution: &'a dyn Eigensolution,
    pub binning: Binning,
}

impl PropertyAccumulator for SpinPolarizedLdosAccumulator<'_> {
    type Member = Site;
    type Value = SpinMatrix;

    fn block_size(&self) -> usize {
        self.binning.resolution
    }

    fn accumulate(&self, site: &Site, block: &mut [SpinMatrix]) -> Result<()> {
        let down = partner(site)?;
        let weight = 1.0 / self.binning.spacing;
        for (n, bin) in self.binning.states() {
            let spinor = SpinMatrix::from_spinor(
                self.solution.amplitude_at(n, site.offset),
                self.solution.amplitude_at(n, down),
            );
            block[bin] += spinor * weight;
        }
        Ok(())
    }

    fn finalize(&self, block: &mut [SpinMatrix]) {
        self.binning.smoothing.apply(block, self.binning.spacing);
    }
}

/// Amplitudes of the selected states.
pub(crate) struct WaveFunctionAccumulator<'a> {
    pub solution: &'a dyn Eigensolution,
    pub states: Vec<usize>,
}

impl PropertyAccumulator for WaveFunctionAccumulator<'_> {
    type Member = Site;
    type Value = Complex64;

    fn block_size(&self) -> usize {
        self.states.len()
    }

    fn accumulate(&self, site: &Site, block: &mut [Complex64]) -> Result<()> {
        for (value, &state) in block.iter_mut().zip(&self.states) {
            *value += self.solution.amplitude_at(state, site.offset);
        }
        Ok(())
    }
}

/// Σ_n ψ_n(to) ψ_n*(from) / (z - E_n) over a grid of complex energies.
pub(crate) struct GreensFunctionAccumulator<'a> {
    pub solution: &'a dyn Eigensolution,
    pub kind: GreensFunctionType,
    /// Real energies for real-axis kinds, iω_m + μ for Matsubara.
    pub points: Vec<Complex64>,
    pub infinitesimal: f64,
}

impl GreensFunctionAccumulator<'_> {
    fn kernel(&self, z: Complex64, energy: f64) -> Complex64 {
        let eta = Complex64::new(0.0, self.infinitesimal);
        let retarded = || 1.0 / (z + eta - energy);
        let advanced = || 1.0 / (z - eta - energy);
        match self.kind {
            GreensFunctionType::Retarded => retarded(),
            GreensFunctionType::Advanced => advanced(),
            GreensFunctionType::Principal => 0.5 * (retarded() + advanced()),
            GreensFunctionType::NonPrincipal => 0.5 * (retarded() - advanced()),
            GreensFunctionType::Matsubara => 1.0 / (z - energy),
        }
    }
}

impl PropertyAccumulator for GreensFunctionAccumulator<'_> {
    /// (to, from) sites.
    type Member = Vec<Site>;
    type Value = Complex64;

    fn block_size(&self) -> usize {
        self.points.len()
    }

    fn accumulate(&self, sites: &Vec<Site>, block: &mut [Complex64]) -> Result<()> {
        let (to, from) = match sites.as_slice() {
            [to, from] => (to.offset, from.offset),
            _ => {
                return Err(IndexError::ArityMismatch {
                    context: "Green's function member".into(),
                    expected: 2,
                    actual: sites.len(),
                }
                .into())
            }
        };
        for (n, &energy) in self.solution.eigenvalues().iter().enumerate() {
            let weight =
                self.solution.amplitude_at(n, to) * self.solution.amplitude_at(n, from).conj();
            if weight == Complex64::new(0.0, 0.0) {
                continue;
            }
            for (value, &z) in block.iter_mut().zip(&self.points) {
                *value += weight * self.kernel(z, energy);
            }
        }
        Ok(())
    }
}
