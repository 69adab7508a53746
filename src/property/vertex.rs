// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Electron fluctuation self-energy vertex.
//!
//! The vertex for a compound index `{k}, {b0}, {b1}, {b2}, {b3}` contracts
//! the susceptibility with a left (incoming) and right (outgoing) list of
//! two-body interaction amplitudes:
//!
//! ```text
//! V(k, b0..b3)[n] = m · Σ_in Σ_out A_in · A_out · χ({k}, {c0_out}, {a1_out}, {c1_in}, {a0_in})[n]
//! ```
//!
//! restricted to `a1_in == b3`, `c0_in == b2`, `a0_out == b0` and
//! `c1_out == b1`.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::accumulate::{traverse, PropertyAccumulator, Traversal};
use super::types::{SelfEnergyVertex, Susceptibility};
use crate::energy::EnergyAxis;
use crate::error::{ExtractionError, IndexError, Result};
use crate::index::{CompoundIndex, Index, MatchGroup};

/// Amplitudes below this magnitude are skipped.
pub const AMPLITUDE_CUTOFF: f64 = 1e-10;

const CONTEXT: &str = "self-energy vertex";

/// Two-body interaction term `A c†(c0) c†(c1) c(a0) c(a1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionAmplitude {
    pub creation: [Index; 2],
    pub annihilation: [Index; 2],
    pub amplitude: Complex64,
}

impl InteractionAmplitude {
    /// Create an amplitude for `A c†(c0) c†(c1) c(a0) c(a1)`.
    pub fn new(creation: [Index; 2], annihilation: [Index; 2], amplitude: Complex64) -> Self {
        Self {
            creation,
            annihilation,
            amplitude,
        }
    }

    /// Leading subindex of each operator as `[c0, c1, a0, a1]`.
    fn leading(&self) -> Result<[i32; 4]> {
        let lead = |index: &Index| {
            index.at(0).ok_or_else(|| IndexError::ComponentArity {
                component: 0,
                expected: 1,
                actual: 0,
            })
        };
        Ok([
            lead(&self.creation[0])?,
            lead(&self.creation[1])?,
            lead(&self.annihilation[0])?,
            lead(&self.annihilation[1])?,
        ])
    }
}

/// Contracts a susceptibility with left and right interaction amplitudes.
#[derive(Debug, Clone)]
pub struct ElectronFluctuationVertex<'a> {
    susceptibility: &'a Susceptibility,
    left: Vec<InteractionAmplitude>,
    right: Vec<InteractionAmplitude>,
    multiplier: f64,
    parallel: bool,
}

impl<'a> ElectronFluctuationVertex<'a> {
    /// Create a vertex calculator over `susceptibility` with no interaction
    /// terms, multiplier 1 and parallel evaluation.
    pub fn new(susceptibility: &'a Susceptibility) -> Self {
        Self {
            susceptibility,
            left: Vec::new(),
            right: Vec::new(),
            multiplier: 1.0,
            parallel: true,
        }
    }

    /// Interaction amplitudes contracted on the left of the susceptibility.
    pub fn with_left_interaction(mut self, left: Vec<InteractionAmplitude>) -> Self {
        self.left = left;
        self
    }

    /// Interaction amplitudes contracted on the right of the susceptibility.
    pub fn with_right_interaction(mut self, right: Vec<InteractionAmplitude>) -> Self {
        self.right = right;
        self
    }

    /// Scale factor applied to every vertex element.
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Sequential evaluation when `false`.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Scale factor applied to every vertex element.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Vertex for one compound index, one value per susceptibility energy.
    pub fn calculate_self_energy_vertex(&self, index: &CompoundIndex) -> Result<Vec<Complex64>> {
        let mut vertex = vec![Complex64::new(0.0, 0.0); self.energy_count()?];
        self.contract(index, &mut vertex)?;
        Ok(vertex)
    }

    /// Vertex for several compound indices, keyed in the given order.
    pub fn calculate_self_energy_vertices(
        &self,
        indices: &[CompoundIndex],
    ) -> Result<SelfEnergyVertex> {
        let energies = self.energy_count()?;
        let mut groups: Vec<MatchGroup<CompoundIndex, CompoundIndex>> =
            Vec::with_capacity(indices.len());
        for (n, index) in indices.iter().enumerate() {
            if indices[..n].contains(index) {
                return Err(IndexError::Duplicate(index.to_string()).into());
            }
            groups.push(MatchGroup {
                key: index.clone(),
                members: vec![index.clone()],
            });
        }

        info!(
            indices = groups.len(),
            energies,
            left = self.left.len(),
            right = self.right.len(),
            "Calculating self-energy vertices"
        );
        let accumulator = VertexAccumulator {
            vertex: self,
            energies,
        };
        traverse(
            &accumulator,
            groups,
            self.susceptibility.axis().copied(),
            Traversal {
                parallel: self.parallel,
                devices: None,
            },
        )
    }

    fn energy_count(&self) -> Result<usize> {
        match self.susceptibility.axis() {
            Some(axis @ (EnergyAxis::Real { .. } | EnergyAxis::BosonicMatsubara { .. })) => {
                Ok(axis.len())
            }
            Some(axis) => Err(ExtractionError::EnergyType {
                context: CONTEXT.into(),
                message: format!(
                    "susceptibility must be real or bosonic Matsubara, got {}",
                    axis.energy_type()
                ),
            }
            .into()),
            None => Err(ExtractionError::EnergyType {
                context: CONTEXT.into(),
                message: "susceptibility is not energy resolved".into(),
            }
            .into()),
        }
    }

    fn contract(&self, index: &CompoundIndex, vertex: &mut [Complex64]) -> Result<()> {
        let components = index.split_exact(5, 1, CONTEXT)?;
        let k = &components[0];
        let mut b = [0i32; 4];
        for (value, component) in b.iter_mut().zip(&components[1..]) {
            *value = component.subindices()[0];
        }

        for incoming in &self.left {
            let [c0_in, c1_in, a0_in, a1_in] = incoming.leading()?;
            if a1_in != b[3] || c0_in != b[2] || incoming.amplitude.norm() < AMPLITUDE_CUTOFF {
                continue;
            }
            for outgoing in &self.right {
                let [c0_out, c1_out, a0_out, a1_out] = outgoing.leading()?;
                if a0_out != b[0]
                    || c1_out != b[1]
                    || outgoing.amplitude.norm() < AMPLITUDE_CUTOFF
                {
                    continue;
                }

                let key = CompoundIndex::from_components(vec![
                    k.clone(),
                    Index::from([c0_out]),
                    Index::from([a1_out]),
                    Index::from([c1_in]),
                    Index::from([a0_in]),
                ]);
                let chi = self
                    .susceptibility
                    .block(&key)
                    .ok_or_else(|| IndexError::UnknownIndex(key.to_string()))?;

                let weight = incoming.amplitude * outgoing.amplitude * self.multiplier;
                for (value, &x) in vertex.iter_mut().zip(chi) {
                    *value += weight * x;
                }
            }
        }
        Ok(())
    }
}

struct VertexAccumulator<'v, 'a> {
    vertex: &'v ElectronFluctuationVertex<'a>,
    energies: usize,
}

impl PropertyAccumulator for VertexAccumulator<'_, '_> {
    type Member = CompoundIndex;
    type Value = Complex64;

    fn block_size(&self) -> usize {
        self.energies
    }

    fn accumulate(&self, index: &CompoundIndex, block: &mut [Complex64]) -> Result<()> {
        self.vertex.contract(index, block)
    }
}
