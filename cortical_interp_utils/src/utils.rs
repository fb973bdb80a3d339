/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies the kernel enumeration, weight dispatch, and distance helpers.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{KernelFromParams, KernelParams, kernels};
use faer::RowRef;
use serde::{Deserialize, Serialize};

/// Enumerates the implemented distance-weighting kernels.
///
/// Every kernel is a pure function of geodesic distance and the cancel
/// distance; it never depends on absolute vertex positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelType {
    Linear,
    Square,
    Cubic,
    Gaussian,
}

/// Evaluates the selected kernel's weight at geodesic distance `d`.
#[inline(always)]
pub fn kernel_weight(d: f64, params: &KernelParams) -> f64 {
    match params.kernel_type {
        KernelType::Linear => {
            let k = <kernels::LinearKernel as KernelFromParams>::from_params(params);
            k.weight(d)
        }
        KernelType::Square => {
            let k = <kernels::SquareKernel as KernelFromParams>::from_params(params);
            k.weight(d)
        }
        KernelType::Cubic => {
            let k = <kernels::CubicKernel as KernelFromParams>::from_params(params);
            k.weight(d)
        }
        KernelType::Gaussian => {
            let k = <kernels::GaussianKernel as KernelFromParams>::from_params(params);
            k.weight(d)
        }
    }
}

/// Returns the Euclidean distance between two position rows.
#[inline(always)]
pub fn get_distance(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    let mut dist = 0.0;
    for (t, s) in target.iter().zip(source.iter()) {
        let diff = t - s;
        dist += diff * diff;
    }
    dist.sqrt()
}
