/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports kernel utilities, constants, and helper functions used across the cortical_interp crates.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`cortical_interp`] crate
mod constants;
mod distance_kernels;
mod traits;
mod utils;
mod kernel_helpers;

/// Implemented kernels for use in the [`cortical_interp`] crate.
pub mod kernels {
    pub use super::distance_kernels::*;
}

pub use {
    constants::{GAUSSIAN_SIGMA_DIVISOR, ROW_SUM_EPSILON},
    kernel_helpers::{KernelParams, KernelParamsBuilder},
    traits::KernelFromParams,
    utils::{KernelType, get_distance, kernel_weight},
};
