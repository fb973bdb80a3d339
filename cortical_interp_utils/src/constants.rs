/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines tuned constants for the distance-weighting kernels.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

/// Ratio between the cancel distance and the gaussian kernel's sigma,
/// `sigma = cancel_distance / GAUSSIAN_SIGMA_DIVISOR`.
///
/// With a divisor of 3 the gaussian weight has decayed to roughly 1.1 %
/// of its peak at the cancel distance. The same value must be used for
/// every rebuild so repeated builds stay reproducible.
pub const GAUSSIAN_SIGMA_DIVISOR: f64 = 3.0;

/// Row sums at or below this threshold are treated as degenerate and the
/// row is left empty instead of being normalized.
pub const ROW_SUM_EPSILON: f64 = 1E-12;
