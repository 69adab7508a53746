// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Eigensolution interface.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::error::{ExtractionError, IndexError, Result};
use crate::index::{Index, IndexSpace};

/// A completed eigen-decomposition over a sparse index space.
///
/// Implementations are immutable once built and are shared read-only across
/// the extraction worker threads.
pub trait Eigensolution: Send + Sync {
    /// The basis the eigenvectors are expanded in.
    fn index_space(&self) -> &IndexSpace;

    /// All eigenvalues, non-decreasing.
    fn eigenvalues(&self) -> &[f64];

    /// Amplitude of eigenstate `state` on the basis element at `offset`.
    ///
    /// Callers guarantee `state < eigenvalue_count()` and
    /// `offset < index_space().len()`.
    fn amplitude_at(&self, state: usize, offset: usize) -> Complex64;

    fn eigenvalue_count(&self) -> usize {
        self.eigenvalues().len()
    }

    /// Eigenvalue of `state`.
    fn eigenvalue(&self, state: usize) -> std::result::Result<f64, ExtractionError> {
        self.eigenvalues()
            .get(state)
            .copied()
            .ok_or(ExtractionError::StateOutOfRange {
                state,
                count: self.eigenvalue_count(),
            })
    }

    /// Amplitude of eigenstate `state` on `index`.
    fn amplitude(&self, state: usize, index: &Index) -> Result<Complex64> {
        self.check_state(state)?;
        let offset = self
            .index_space()
            .offset(index)
            .ok_or_else(|| IndexError::UnknownIndex(index.to_string()))?;
        Ok(self.amplitude_at(state, offset))
    }

    fn check_state(&self, state: usize) -> std::result::Result<(), ExtractionError> {
        let count = self.eigenvalue_count();
        if state < count {
            Ok(())
        } else {
            Err(ExtractionError::StateOutOfRange { state, count })
        }
    }
}

/// Eigensolution held in memory as dense arrays.
///
/// Column `n` of the eigenvector matrix is eigenstate `n`, rows follow the
/// canonical order of the index space.
#[derive(Debug, Clone)]
pub struct DenseEigensolution {
    space: IndexSpace,
    eigenvalues: Vec<f64>,
    eigenvectors: Array2<Complex64>,
}

impl DenseEigensolution {
    /// Create a dense eigensolution.
    ///
    /// `eigenvectors` holds one state per column with rows in the canonical
    /// order of `space`. Eigenvalues must be finite and non-decreasing.
    pub fn new(
        space: IndexSpace,
        eigenvalues: Array1<f64>,
        eigenvectors: Array2<Complex64>,
    ) -> std::result::Result<Self, ExtractionError> {
        let (rows, columns) = eigenvectors.dim();
        if rows != space.len() {
            return Err(ExtractionError::InvalidEigensolution(format!(
                "eigenvector matrix has {} rows, index space has {} elements",
                rows,
                space.len()
            )));
        }
        if columns != eigenvalues.len() {
            return Err(ExtractionError::InvalidEigensolution(format!(
                "eigenvector matrix has {} columns, got {} eigenvalues",
                columns,
                eigenvalues.len()
            )));
        }
        if eigenvalues.iter().any(|e| !e.is_finite()) {
            return Err(ExtractionError::InvalidEigensolution(
                "eigenvalues must be finite".into(),
            ));
        }
        if let Some(n) = eigenvalues
            .windows(2)
            .into_iter()
            .position(|pair| pair[0] > pair[1])
        {
            return Err(ExtractionError::InvalidEigensolution(format!(
                "eigenvalues must be non-decreasing, E[{}] = {} > E[{}] = {}",
                n,
                eigenvalues[n],
                n + 1,
                eigenvalues[n + 1]
            )));
        }

        Ok(Self {
            space,
            eigenvalues: eigenvalues.to_vec(),
            eigenvectors,
        })
    }

    /// Eigenvector matrix, one state per column.
    pub fn eigenvectors(&self) -> &Array2<Complex64> {
        &self.eigenvectors
    }
}

impl Eigensolution for DenseEigensolution {
    fn index_space(&self) -> &IndexSpace {
        &self.space
    }

    fn eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    fn amplitude_at(&self, state: usize, offset: usize) -> Complex64 {
        self.eigenvectors[[offset, state]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_utils::two_site_model;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_rejects_unsorted_eigenvalues() {
        let space = IndexSpace::new([Index::from([0]), Index::from([1])]).unwrap();
        let vectors = Array2::from_elem((2, 2), Complex64::new(0.5, 0.0));
        let result = DenseEigensolution::new(space, array![1.0, -1.0], vectors);
        assert!(matches!(
            result,
            Err(ExtractionError::InvalidEigensolution(_))
        ));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let space = IndexSpace::new([Index::from([0]), Index::from([1])]).unwrap();
        let vectors = Array2::from_elem((3, 2), Complex64::new(0.0, 0.0));
        assert!(DenseEigensolution::new(space, array![-1.0, 1.0], vectors).is_err());
    }

    #[test]
    fn test_amplitude_lookup() {
        let solution = two_site_model();
        let a = solution.amplitude(1, &Index::from([1])).unwrap();
        assert_relative_eq!(a.re, -std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);

        let err = solution.amplitude(2, &Index::from([0])).unwrap_err();
        assert!(matches!(
            err,
            Error::Extraction(ExtractionError::StateOutOfRange { state: 2, count: 2 })
        ));

        let err = solution.amplitude(0, &Index::from([7])).unwrap_err();
        assert!(matches!(err, Error::Index(IndexError::UnknownIndex(_))));
    }

    #[test]
    fn test_eigenvalue_range_check() {
        let solution = two_site_model();
        assert_eq!(solution.eigenvalue(0).unwrap(), -1.0);
        assert!(solution.eigenvalue(5).is_err());
    }
}
