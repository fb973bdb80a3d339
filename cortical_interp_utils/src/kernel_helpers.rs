/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides parameter and builder types for configuring distance-weighting kernels.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};
use crate::utils::KernelType;

/// Defines the [`KernelType`] to use, along with the cancel distance the
/// kernel is scaled by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KernelParams {
    /// KernelType enum variant to use.
    pub kernel_type: KernelType,

    /// Geodesic distance at which a source vertex stops influencing a
    /// mesh vertex. The polynomial kernels fall to zero exactly here;
    /// the gaussian kernel has decayed to a negligible tail.
    pub cancel_distance: f64,
}

impl KernelParams {
    /// Begins building a [`KernelParams`] instance for the given kernel type.
    pub fn builder(kernel_type: KernelType) -> KernelParamsBuilder {
        KernelParamsBuilder {
            kernel_type,
            cancel_distance: 1.0,
        }
    }
}

/// Builder for [`KernelParams`] that provides sensible defaults.
#[derive(Debug, Clone, Copy)]
pub struct KernelParamsBuilder {
    kernel_type: KernelType,
    cancel_distance: f64,
}

impl KernelParamsBuilder {
    /// Sets the `cancel_distance` parameter on the builder.
    pub fn cancel_distance(mut self, v: f64) -> Self {
        self.cancel_distance = v;
        self
    }

    /// Finalises the builder into a [`KernelParams`] value.
    pub fn build(self) -> KernelParams {
        assert!(self.cancel_distance.is_finite());
        assert!(self.cancel_distance >= 0.0);
        KernelParams {
            kernel_type: self.kernel_type,
            cancel_distance: self.cancel_distance,
        }
    }
}
