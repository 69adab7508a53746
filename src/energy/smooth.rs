// Copyright 2026 QubitOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Broadening of binned spectral data.
//!
//! Smoothing convolves a histogram with a discrete kernel sampled at the
//! bin spacing and normalized to unit sum, so the total weight of bins far
//! from the window edges is preserved.

use std::f64::consts::PI;
use std::ops::{AddAssign, Mul};

use serde::{Deserialize, Serialize};

/// Smoothing kernel shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    /// exp(-x²/2σ²)
    #[default]
    Gaussian,
    /// γ/π(x²+γ²)
    Lorentzian,
}

impl Kernel {
    fn value(&self, x: f64, width: f64) -> f64 {
        match self {
            Kernel::Gaussian => (-x * x / (2.0 * width * width)).exp(),
            Kernel::Lorentzian => width / (PI * (x * x + width * width)),
        }
    }

    /// Half-window in units of the width.
    fn reach(&self) -> f64 {
        match self {
            Kernel::Gaussian => 5.0,
            Kernel::Lorentzian => 20.0,
        }
    }
}

/// Broadening parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Smoothing {
    /// σ (Gaussian) or γ (Lorentzian). Zero disables smoothing.
    pub width: f64,
    pub kernel: Kernel,
    /// Half-window in bins. Derived from the width when unset.
    pub window: Option<usize>,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::none()
    }
}

impl Smoothing {
    /// No broadening.
    pub fn none() -> Self {
        Self {
            width: 0.0,
            kernel: Kernel::Gaussian,
            window: None,
        }
    }

    /// Gaussian broadening with standard deviation `width`.
    pub fn gaussian(width: f64) -> Self {
        Self {
            width,
            kernel: Kernel::Gaussian,
            window: None,
        }
    }

    /// Lorentzian broadening with half width `width`.
    pub fn lorentzian(width: f64) -> Self {
        Self {
            width,
            kernel: Kernel::Lorentzian,
            window: None,
        }
    }

    /// Whether the kernel changes its input.
    pub fn is_active(&self) -> bool {
        self.width > 0.0
    }

    /// Normalized kernel weights for offsets `-W..=W` bins.
    pub fn weights(&self, spacing: f64, resolution: usize) -> Vec<f64> {
        if !self.is_active() {
            return vec![1.0];
        }
        let half = self
            .window
            .unwrap_or_else(|| (self.kernel.reach() * self.width / spacing).ceil() as usize)
            .min(resolution.saturating_sub(1));

        let mut weights: Vec<f64> = (-(half as i64)..=half as i64)
            .map(|j| self.kernel.value(j as f64 * spacing, self.width))
            .collect();
        let total: f64 = weights.iter().sum();
        for w in &mut weights {
            *w /= total;
        }
        weights
    }

    /// Convolve `data` in place. A no-op when the width is zero.
    pub fn apply<T>(&self, data: &mut [T], spacing: f64)
    where
        T: Copy + Default + AddAssign + Mul<f64, Output = T>,
    {
        if !self.is_active() || data.is_empty() {
            return;
        }
        let weights = self.weights(spacing, data.len());
        let half = (weights.len() / 2) as i64;
        let source = data.to_vec();
        let len = data.len() as i64;

        for (n, out) in data.iter_mut().enumerate() {
            let mut acc = T::default();
            for (k, w) in weights.iter().enumerate() {
                let m = n as i64 + half - k as i64;
                if (0..len).contains(&m) {
                    acc += source[m as usize] * *w;
                }
            }
            *out = acc;
        }
    }
}
