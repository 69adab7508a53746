// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Property containers.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::{AddAssign, Mul};

use num_complex::Complex64;
use serde::Serialize;

use crate::energy::EnergyAxis;
use crate::error::{ExtractionError, IndexError, Result};
use crate::index::{CompoundIndex, Index};

/// Values laid out in one contiguous block per key.
///
/// Blocks follow the key order produced by the matcher. Energy-resolved
/// properties carry the [`EnergyAxis`] their blocks are sampled on.
#[derive(Debug, Clone, Serialize)]
pub struct Property<K, T>
where
    K: Eq + Hash,
{
    keys: Vec<K>,
    #[serde(skip)]
    lookup: HashMap<K, usize>,
    block_size: usize,
    axis: Option<EnergyAxis>,
    data: Vec<T>,
}

impl<K, T> Property<K, T>
where
    K: Clone + Eq + Hash,
    T: Copy + Default,
{
    /// Zero-initialized container with one block per key.
    pub fn zeroed(keys: Vec<K>, block_size: usize, axis: Option<EnergyAxis>) -> Self {
        let lookup = keys
            .iter()
            .enumerate()
            .map(|(n, key)| (key.clone(), n))
            .collect();
        let data = vec![T::default(); keys.len() * block_size];
        Self {
            keys,
            lookup,
            block_size,
            axis,
            data,
        }
    }

    /// Container over precomputed data, such as a susceptibility produced
    /// by another solver.
    pub fn from_blocks(
        keys: Vec<K>,
        block_size: usize,
        axis: Option<EnergyAxis>,
        data: Vec<T>,
    ) -> Result<Self>
    where
        K: fmt::Display,
    {
        if data.len() != keys.len() * block_size {
            return Err(ExtractionError::Layout(format!(
                "{} values for {} keys of block size {}",
                data.len(),
                keys.len(),
                block_size
            ))
            .into());
        }
        if let Some(axis) = &axis {
            if axis.len() != block_size {
                return Err(ExtractionError::Layout(format!(
                    "block size {} does not match an energy axis of {} points",
                    block_size,
                    axis.len()
                ))
                .into());
            }
        }
        let mut lookup = HashMap::with_capacity(keys.len());
        for (n, key) in keys.iter().enumerate() {
            if lookup.insert(key.clone(), n).is_some() {
                return Err(IndexError::Duplicate(key.to_string()).into());
            }
        }
        Ok(Self {
            keys,
            lookup,
            block_size,
            axis,
            data,
        })
    }

    /// Keys in block order.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Values stored per key.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Energy axis of each block, if the property is energy resolved.
    pub fn axis(&self) -> Option<&EnergyAxis> {
        self.axis.as_ref()
    }

    /// Flat data, block after block.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Whether `key` has a block.
    pub fn contains(&self, key: &K) -> bool {
        self.lookup.contains_key(key)
    }

    /// Block of values stored for `key`.
    pub fn block(&self, key: &K) -> Option<&[T]> {
        let n = *self.lookup.get(key)?;
        Some(&self.data[n * self.block_size..(n + 1) * self.block_size])
    }

    /// Value `n` of the block stored for `key`.
    pub fn get(&self, key: &K, n: usize) -> Option<T> {
        self.block(key)?.get(n).copied()
    }

    /// Keys paired with their blocks, in layout order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[T])> {
        self.keys
            .iter()
            .zip(self.data.chunks(self.block_size.max(1)))
    }
}

/// Eigenvalues in ascending order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EigenValues(Vec<f64>);

impl EigenValues {
    pub(crate) fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    /// Eigenvalues as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Eigenvalue of `state`, if present.
    pub fn get(&self, state: usize) -> Option<f64> {
        self.0.get(state).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

/// 2x2 spin matrix with element `[σ][σ']` holding ψ*(σ)ψ(σ').
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SpinMatrix(pub [[Complex64; 2]; 2]);

impl SpinMatrix {
    /// Outer product ψ*(σ)ψ(σ') of a two-component spinor.
    pub fn from_spinor(up: Complex64, down: Complex64) -> Self {
        let spinor = [up, down];
        let mut m = [[Complex64::new(0.0, 0.0); 2]; 2];
        for (a, row) in m.iter_mut().enumerate() {
            for (b, element) in row.iter_mut().enumerate() {
                *element = spinor[a].conj() * spinor[b];
            }
        }
        Self(m)
    }

    /// Element `[row][column]`.
    pub fn at(&self, row: usize, column: usize) -> Complex64 {
        self.0[row][column]
    }

    /// Trace, the total weight of both spin components.
    pub fn trace(&self) -> Complex64 {
        self.0[0][0] + self.0[1][1]
    }
}

impl Mul<f64> for SpinMatrix {
    type Output = SpinMatrix;

    fn mul(mut self, rhs: f64) -> SpinMatrix {
        for row in &mut self.0 {
            for element in row {
                *element *= rhs;
            }
        }
        self
    }
}

impl AddAssign for SpinMatrix {
    fn add_assign(&mut self, rhs: SpinMatrix) {
        for (row, other) in self.0.iter_mut().zip(rhs.0) {
            for (element, value) in row.iter_mut().zip(other) {
                *element += value;
            }
        }
    }
}

/// Density of states, a single block over the energy window.
pub type Dos = Property<(), f64>;

/// Occupation-weighted density per index.
pub type Density = Property<Index, f64>;

/// Occupation-weighted spin matrix per index.
pub type Magnetization = Property<Index, SpinMatrix>;

/// Energy-resolved density per index.
pub type Ldos = Property<Index, f64>;

/// Energy-resolved spin matrix per index.
pub type SpinPolarizedLdos = Property<Index, SpinMatrix>;

/// Energy-resolved values over five-component compound indices.
pub type Susceptibility = Property<CompoundIndex, Complex64>;

/// Self-energy vertex over five-component compound indices.
pub type SelfEnergyVertex = Property<CompoundIndex, Complex64>;

/// Amplitudes of selected eigenstates per index.
#[derive(Debug, Clone, Serialize)]
pub struct WaveFunctions {
    states: Vec<usize>,
    amplitudes: Property<Index, Complex64>,
}

impl WaveFunctions {
    pub(crate) fn new(states: Vec<usize>, amplitudes: Property<Index, Complex64>) -> Self {
        Self { states, amplitudes }
    }

    /// Selected states; block position `i` holds state `states()[i]`.
    pub fn states(&self) -> &[usize] {
        &self.states
    }

    /// Amplitudes keyed by index, one value per selected state.
    pub fn amplitudes(&self) -> &Property<Index, Complex64> {
        &self.amplitudes
    }

    /// Amplitude of `state` at `index`, if both were extracted.
    pub fn amplitude(&self, index: &Index, state: usize) -> Option<Complex64> {
        let position = self.states.iter().position(|&s| s == state)?;
        self.amplitudes.get(index, position)
    }
}

/// Green's function flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GreensFunctionType {
    Retarded,
    Advanced,
    /// ½(G_R + G_A)
    Principal,
    /// ½(G_R - G_A)
    NonPrincipal,
    Matsubara,
}

/// Green's function over (to, from) compound indices.
#[derive(Debug, Clone, Serialize)]
pub struct GreensFunction {
    kind: GreensFunctionType,
    values: Property<CompoundIndex, Complex64>,
}

impl GreensFunction {
    pub(crate) fn new(
        kind: GreensFunctionType,
        values: Property<CompoundIndex, Complex64>,
    ) -> Self {
        Self { kind, values }
    }

    /// Flavour of this Green's function.
    pub fn kind(&self) -> GreensFunctionType {
        self.kind
    }

    /// Values keyed by `(to, from)`, one block per key.
    pub fn values(&self) -> &Property<CompoundIndex, Complex64> {
        &self.values
    }

    /// Energy-resolved block for `(to, from)`.
    pub fn block(&self, key: &CompoundIndex) -> Option<&[Complex64]> {
        self.values.block(key)
    }
}
