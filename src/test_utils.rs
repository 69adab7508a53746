// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Shared test fixtures with closed-form eigensolutions.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::eigen::DenseEigensolution;
use crate::index::{Index, IndexSpace};

/// Open tight-binding chain of `sites` sites with hopping `t`.
///
/// E_k = -2t cos(kπ/(N+1)), ψ_k(j) = sqrt(2/(N+1)) sin((j+1)kπ/(N+1)) for
/// k = 1..=N, indices `{j}`.
pub fn open_chain(sites: usize, t: f64) -> DenseEigensolution {
    let space = IndexSpace::new((0..sites as i32).map(|j| Index::from([j]))).unwrap();
    let (energies, profiles) = chain_modes(sites, t);

    let mut vectors: Array2<Complex64> = Array2::zeros((sites, sites));
    for (k, profile) in profiles.iter().enumerate() {
        for (j, &value) in profile.iter().enumerate() {
            vectors[[j, k]] = Complex64::new(value, 0.0);
        }
    }
    DenseEigensolution::new(space, Array1::from(energies), vectors).unwrap()
}

/// Open chain with spin, indices `{j, s}`, Zeeman split `h`: spin 0 is
/// shifted by -h and spin 1 by +h.
pub fn spinful_chain(sites: usize, t: f64, h: f64) -> DenseEigensolution {
    let mut indices = Vec::new();
    for j in 0..sites as i32 {
        for s in 0..2 {
            indices.push(Index::from([j, s]));
        }
    }
    let space = IndexSpace::new(indices).unwrap();
    let (energies, profiles) = chain_modes(sites, t);

    let mut modes: Vec<(f64, usize, i32)> = Vec::new();
    for (k, &energy) in energies.iter().enumerate() {
        modes.push((energy - h, k, 0));
        modes.push((energy + h, k, 1));
    }
    modes.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut vectors: Array2<Complex64> = Array2::zeros((2 * sites, 2 * sites));
    for (state, &(_, k, spin)) in modes.iter().enumerate() {
        for (j, &value) in profiles[k].iter().enumerate() {
            let row = space.offset(&Index::from([j as i32, spin])).unwrap();
            vectors[[row, state]] = Complex64::new(value, 0.0);
        }
    }
    let eigenvalues: Array1<f64> = modes.iter().map(|m| m.0).collect();
    DenseEigensolution::new(space, eigenvalues, vectors).unwrap()
}

/// Two sites with eigenvalues {-1, 1} and eigenvectors (1, ±1)/√2.
pub fn two_site_model() -> DenseEigensolution {
    let space = IndexSpace::new([Index::from([0]), Index::from([1])]).unwrap();
    let a = Complex64::new(FRAC_1_SQRT_2, 0.0);
    let vectors = ndarray::array![[a, a], [a, -a]];
    DenseEigensolution::new(space, ndarray::array![-1.0, 1.0], vectors).unwrap()
}

fn chain_modes(sites: usize, t: f64) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = sites as f64 + 1.0;
    let norm = (2.0 / n).sqrt();
    (1..=sites)
        .map(|k| {
            let q = k as f64 * PI / n;
            let profile: Vec<f64> = (1..=sites).map(|j| norm * (j as f64 * q).sin()).collect();
            (-2.0 * t * q.cos(), profile)
        })
        .unzip()
}
