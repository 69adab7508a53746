// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end extraction through the public API.

use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use approx::assert_relative_eq;
use ndarray::{array, Array1, Array2};
use num_complex::Complex64;

use eigenprop::energy::EnergyAxis;
use eigenprop::property::{ExtractorConfig, GreensFunctionType, Property, Susceptibility};
use eigenprop::{
    CompoundIndex, CompoundPattern, Config, DenseEigensolution, DevicePool,
    ElectronFluctuationVertex, EnergyWindow, Index, IndexSpace, InteractionAmplitude, Pattern,
    PropertyExtractor,
};

fn two_site_model() -> DenseEigensolution {
    let space = IndexSpace::new([Index::from([0]), Index::from([1])]).unwrap();
    let a = Complex64::new(FRAC_1_SQRT_2, 0.0);
    DenseEigensolution::new(space, array![-1.0, 1.0], array![[a, a], [a, -a]]).unwrap()
}

/// Two-leg ladder: an open chain along `x` times a two-site rung along `y`.
fn ladder(sites: usize) -> DenseEigensolution {
    let mut indices = Vec::new();
    for x in 0..sites as i32 {
        for y in 0..2 {
            indices.push(Index::from([x, y]));
        }
    }
    let space = IndexSpace::new(indices).unwrap();

    let n = sites as f64 + 1.0;
    let rung = [[FRAC_1_SQRT_2, FRAC_1_SQRT_2], [FRAC_1_SQRT_2, -FRAC_1_SQRT_2]];
    let mut modes = Vec::new();
    for k in 1..=sites {
        for (m, rung_energy) in [-1.0, 1.0].into_iter().enumerate() {
            let q = k as f64 * PI / n;
            modes.push((-2.0 * q.cos() + rung_energy, q, m));
        }
    }
    modes.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut vectors: Array2<Complex64> = Array2::zeros((2 * sites, 2 * sites));
    for (state, &(_, q, m)) in modes.iter().enumerate() {
        for x in 0..sites {
            for y in 0..2 {
                let row = space.offset(&Index::from([x as i32, y as i32])).unwrap();
                let value = (2.0 / n).sqrt() * ((x + 1) as f64 * q).sin() * rung[m][y];
                vectors[[row, state]] = Complex64::new(value, 0.0);
            }
        }
    }
    let eigenvalues: Array1<f64> = modes.iter().map(|m| m.0).collect();
    DenseEigensolution::new(space, eigenvalues, vectors).unwrap()
}

fn extractor(solution: DenseEigensolution, config: ExtractorConfig) -> PropertyExtractor {
    PropertyExtractor::new(Arc::new(solution), config).unwrap()
}

fn pattern(text: &str) -> Pattern {
    text.parse().unwrap()
}

#[test]
fn test_two_site_dos_end_to_end() {
    let config = ExtractorConfig {
        window: EnergyWindow::new(-2.0, 2.0, 2).unwrap(),
        ..Default::default()
    };
    let dos = extractor(two_site_model(), config).calculate_dos().unwrap();
    // dE = 4: -1 lands in the bin at -2, 1 in the bin at 2.
    assert_eq!(dos.data(), &[0.25, 0.25]);

    let config = ExtractorConfig {
        window: EnergyWindow::new(-2.0, 2.0, 9).unwrap(),
        ..Default::default()
    };
    let dos = extractor(two_site_model(), config).calculate_dos().unwrap();
    let nonzero: Vec<usize> = dos
        .data()
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0.0)
        .map(|(n, _)| n)
        .collect();
    assert_eq!(nonzero, vec![2, 6]);
}

#[test]
fn test_summed_ldos_equals_manual_sum() {
    let config = ExtractorConfig {
        window: EnergyWindow::new(-4.0, 4.0, 81).unwrap(),
        ..Default::default()
    };
    let extractor = extractor(ladder(4), config);

    let summed = extractor.calculate_ldos(&[pattern("{sum, sum}")]).unwrap();
    assert_eq!(summed.len(), 1);
    let summed = summed.block(&Index::new(vec![])).unwrap();

    let per_index = extractor.calculate_ldos(&[pattern("{*, *}")]).unwrap();
    assert_eq!(per_index.len(), 8);
    let mut manual = vec![0.0; 81];
    for (_, block) in per_index.iter() {
        for (acc, value) in manual.iter_mut().zip(block) {
            *acc += value;
        }
    }
    let dos = extractor.calculate_dos().unwrap();
    for n in 0..81 {
        assert_relative_eq!(summed[n], manual[n], epsilon = 1e-10);
        assert_relative_eq!(summed[n], dos.data()[n], epsilon = 1e-10);
    }

    // Explicit ranges resolve to the same container as the pattern list.
    let ranged = extractor.calculate_ldos_in_ranges(&pattern("{*, sum}"), &[4, 2]).unwrap();
    let listed = extractor.calculate_ldos(&[pattern("{*, sum}")]).unwrap();
    assert_eq!(ranged.keys(), listed.keys());
    assert_eq!(ranged.data(), listed.data());
}

#[test]
fn test_overlapping_patterns_union() {
    let extractor = extractor(ladder(3), ExtractorConfig::default());
    let density = extractor
        .calculate_density(&[pattern("{0, *}"), pattern("{*, 1}")])
        .unwrap();
    let keys: Vec<String> = density.keys().iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, ["{0, 0}", "{0, 1}", "{1, 1}", "{2, 1}"]);
}

#[test]
fn test_retarded_is_conjugate_of_advanced() {
    let config = ExtractorConfig {
        window: EnergyWindow::new(-3.0, 3.0, 25).unwrap(),
        energy_infinitesimal: 0.02,
        ..Default::default()
    };
    let extractor = extractor(ladder(3), config);
    let patterns: Vec<CompoundPattern> = vec!["{*, *}, {*, *}".parse().unwrap()];
    let retarded = extractor
        .calculate_greens_function(&patterns, GreensFunctionType::Retarded)
        .unwrap();
    let advanced = extractor
        .calculate_greens_function(&patterns, GreensFunctionType::Advanced)
        .unwrap();
    assert_eq!(retarded.values().len(), 36);

    for x in 0..3 {
        for y in 0..2 {
            let key: CompoundIndex = format!("{{{x}, {y}}}, {{{x}, {y}}}").parse().unwrap();
            let r = retarded.block(&key).unwrap();
            let a = advanced.block(&key).unwrap();
            for (r, a) in r.iter().zip(a) {
                assert_relative_eq!(r.re, a.conj().re, epsilon = 1e-12);
                assert_relative_eq!(r.im, a.conj().im, epsilon = 1e-12);
            }
        }
    }
}

fn amplitude(c0: i32, c1: i32, a0: i32, a1: i32, value: f64) -> InteractionAmplitude {
    InteractionAmplitude::new(
        [Index::from([c0]), Index::from([c1])],
        [Index::from([a0]), Index::from([a1])],
        Complex64::new(value, 0.5 * value),
    )
}

fn orbital_susceptibility() -> Susceptibility {
    let mut keys = Vec::new();
    for k in 0..2 {
        for a in 0..2 {
            for b in 0..2 {
                for c in 0..2 {
                    for d in 0..2 {
                        keys.push(CompoundIndex::from_components(vec![
                            Index::from([k]),
                            Index::from([a]),
                            Index::from([b]),
                            Index::from([c]),
                            Index::from([d]),
                        ]));
                    }
                }
            }
        }
    }
    let axis = EnergyAxis::BosonicMatsubara {
        count: 5,
        temperature: 0.05,
    };
    let values: Vec<Complex64> = (0..keys.len() * 5)
        .map(|n| Complex64::new((n as f64 * 0.37).sin(), (n as f64 * 0.11).cos()))
        .collect();
    Property::from_blocks(keys, 5, Some(axis), values).unwrap()
}

#[test]
fn test_vertex_invariant_under_reordering_and_parsing() {
    let chi = orbital_susceptibility();
    let left = vec![
        amplitude(1, 0, 1, 0, 2.0),
        amplitude(1, 1, 0, 0, -0.7),
        amplitude(0, 1, 1, 0, 1.3),
        amplitude(1, 0, 0, 0, 1e-12),
    ];
    let right = vec![
        amplitude(0, 1, 0, 1, 0.4),
        amplitude(1, 1, 0, 0, 3.0),
        amplitude(0, 1, 0, 0, -1.1),
    ];

    let forward = ElectronFluctuationVertex::new(&chi)
        .with_left_interaction(left.clone())
        .with_right_interaction(right.clone())
        .with_multiplier(-0.5);
    let reversed = ElectronFluctuationVertex::new(&chi)
        .with_left_interaction(left.into_iter().rev().collect())
        .with_right_interaction(right.into_iter().rev().collect())
        .with_multiplier(-0.5);

    let built = CompoundIndex::from_components(vec![
        Index::from([1]),
        Index::from([0]),
        Index::from([1]),
        Index::from([1]),
        Index::from([0]),
    ]);
    let parsed: CompoundIndex = "{1}, {0}, {1}, {1}, {0}".parse().unwrap();
    assert_eq!(built, parsed);

    let a = forward.calculate_self_energy_vertex(&built).unwrap();
    let b = reversed.calculate_self_energy_vertex(&parsed).unwrap();
    assert_eq!(a.len(), 5);
    assert!(a.iter().any(|v| v.norm() > 0.0));
    for (a, b) in a.iter().zip(&b) {
        assert_relative_eq!(a.re, b.re, epsilon = 1e-12);
        assert_relative_eq!(a.im, b.im, epsilon = 1e-12);
    }
}

#[test]
fn test_device_pool_blocks_when_exhausted() {
    let pool = Arc::new(DevicePool::with_devices(2));
    let first = pool.allocate().unwrap();
    let second = pool.allocate().unwrap();
    assert_ne!(first.id(), second.id());

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || {
            let lease = pool.allocate().unwrap();
            tx.send(lease.id()).unwrap();
        })
    };

    // The third request waits while both devices are leased.
    assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());

    let freed = first.id();
    drop(first);
    let id = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert_eq!(id, freed);
    waiter.join().unwrap();

    drop(second);
    assert_eq!(pool.busy_count(), 0);
}

#[test]
fn test_config_driven_extraction() {
    let mut config = Config::default();
    config.energy.lower_bound = -2.0;
    config.energy.upper_bound = 2.0;
    config.energy.resolution = 5;
    config.energy.normalize_dos = true;
    config.parallel.enabled = false;

    let extractor = PropertyExtractor::from_config(Arc::new(two_site_model()), &config).unwrap();
    let dos = extractor.calculate_dos().unwrap();
    assert_eq!(dos.data(), &[0.0, 0.5, 0.0, 0.5, 0.0]);

    let density = extractor.calculate_density(&[pattern("{*}")]).unwrap();
    assert_relative_eq!(density.data()[0], 0.5, epsilon = 1e-12);
}
