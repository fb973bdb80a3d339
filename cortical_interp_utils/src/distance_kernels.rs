/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete distance-weighting kernel functions.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{KernelFromParams, KernelParams, constants::GAUSSIAN_SIGMA_DIVISOR};

/// Clamped falloff term `max(0, 1 - d / d_cancel)` shared by the
/// polynomial kernels.
///
/// A cancel distance of zero admits only coincident vertices, which
/// keep full weight.
#[inline(always)]
fn falloff(d: f64, cancel_distance: f64) -> f64 {
    match cancel_distance.abs() < f64::EPSILON {
        true => {
            if d.abs() < f64::EPSILON {
                1.0
            } else {
                0.0
            }
        }
        false => (1.0 - d / cancel_distance).max(0.0),
    }
}

/// Linear distance kernel with `w(d) = 1 - d/d_cancel`, clamped to zero.
#[derive(Clone, Debug, Copy)]
pub struct LinearKernel {
    pub cancel_distance: f64,
}

impl LinearKernel {
    #[inline(always)]
    pub fn weight(&self, d: f64) -> f64 {
        falloff(d, self.cancel_distance)
    }
}

impl KernelFromParams for LinearKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        LinearKernel {
            cancel_distance: p.cancel_distance,
        }
    }
}

/// Square distance kernel with `w(d) = (1 - d/d_cancel)^2`, clamped to zero.
#[derive(Clone, Debug, Copy)]
pub struct SquareKernel {
    pub cancel_distance: f64,
}

impl SquareKernel {
    #[inline(always)]
    pub fn weight(&self, d: f64) -> f64 {
        falloff(d, self.cancel_distance).powi(2)
    }
}

impl KernelFromParams for SquareKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        SquareKernel {
            cancel_distance: p.cancel_distance,
        }
    }
}

/// Cubic distance kernel with `w(d) = (1 - d/d_cancel)^3`, clamped to zero.
#[derive(Clone, Debug, Copy)]
pub struct CubicKernel {
    pub cancel_distance: f64,
}

impl CubicKernel {
    #[inline(always)]
    pub fn weight(&self, d: f64) -> f64 {
        falloff(d, self.cancel_distance).powi(3)
    }
}

impl KernelFromParams for CubicKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        CubicKernel {
            cancel_distance: p.cancel_distance,
        }
    }
}

/// Gaussian distance kernel with `w(d) = exp(-d^2 / (2 sigma^2))`.
///
/// Sigma is derived from the cancel distance via
/// [`GAUSSIAN_SIGMA_DIVISOR`], so the weight does not reach zero at the
/// cancel distance but has decayed to a negligible fraction of its peak.
#[derive(Clone, Debug, Copy)]
pub struct GaussianKernel {
    pub cancel_distance: f64,

    // derived (computed once)
    two_sigma_sq: f64,
}

impl GaussianKernel {
    #[inline(always)]
    pub fn new(cancel_distance: f64) -> Self {
        let sigma = cancel_distance / GAUSSIAN_SIGMA_DIVISOR;
        Self {
            cancel_distance,
            two_sigma_sq: 2.0 * sigma * sigma,
        }
    }

    #[inline(always)]
    pub fn weight(&self, d: f64) -> f64 {
        match self.two_sigma_sq < f64::MIN_POSITIVE {
            true => {
                if d.abs() < f64::EPSILON {
                    1.0
                } else {
                    0.0
                }
            }
            false => (-(d * d) / self.two_sigma_sq).exp(),
        }
    }
}

impl KernelFromParams for GaussianKernel {
    #[inline(always)]
    fn from_params(p: &KernelParams) -> Self {
        GaussianKernel::new(p.cancel_distance)
    }
}
