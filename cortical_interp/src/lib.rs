/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for real-time surface interpolation.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Real-time interpolation of sparse estimates over a cortical surface mesh.
//!
//! Source-activity estimation is expensive and is only performed at a
//! sparse subset of the vertices of a cortical surface mesh, while a
//! rendering pipeline needs a value at **every** vertex, refreshed at
//! interactive frame rates. This crate builds and maintains the sparse
//! **interpolation operator** that bridges the two: a row-normalized
//! `N x M` matrix mapping `M` subset values onto `N` mesh vertices,
//! computed once per parameter configuration and applied cheaply per
//! frame.
//!
//! Two pieces do the heavy lifting:
//!
//! - **Surface-constrained distance computation ([`scdc`])** - a
//!   cutoff-bounded shortest-path expansion over the mesh adjacency
//!   graph, yielding geodesic distances from each subset vertex without
//!   ever materializing an all-pairs table.
//! - **Operator construction ([`build_interpolation_mat`])** - turns
//!   those distances into kernel weights (linear, square, cubic, or
//!   gaussian falloff) and normalizes each vertex row into a convex
//!   combination of the subset values.
//!
//! The [`InterpolationMatWorker`] wraps both in a background thread:
//! geometry, kernel, and cancel-distance updates return immediately,
//! rebuilds never block the interactive thread, stale results are
//! discarded, and finished operators are published to subscribers as
//! immutable snapshots.
//!
//! # Examples
//!
//! ```
//! use cortical_interp::{
//!     SurfaceMesh, scdc, build_interpolation_mat,
//!     InterpolationFunction, generate_line_mesh,
//! };
//! use faer::Mat;
//!
//! // Five vertices in a line with unit spacing; estimates arrive only
//! // at the two chain ends.
//! let (vertices, neighbors) = generate_line_mesh(5, 1.0);
//! let mesh = SurfaceMesh::new(vertices, neighbors)?;
//! let subset = vec![0, 4];
//!
//! // Geodesic distances, bounded by the cancel distance.
//! let distances = scdc(&mesh, &subset, 2.5);
//!
//! // Row-normalized sparse operator.
//! let operator =
//!     build_interpolation_mat(&distances, &subset, InterpolationFunction::Linear, 2.5);
//! assert_eq!(operator.num_rows(), 5);
//! assert_eq!(operator.num_cols(), 2);
//!
//! // Spread one frame of sparse estimates across the whole mesh.
//! let mut estimates = Mat::<f64>::zeros(2, 1);
//! estimates[(0, 0)] = 1.0;
//! estimates[(1, 0)] = 3.0;
//! let dense = operator.apply(&estimates);
//! assert_eq!(dense.nrows(), 5);
//! # Ok::<(), cortical_interp::ConfigError>(())
//! ```
pub mod config;

mod common;

mod mesh;

mod operator;

mod scdc;

mod worker;

pub mod progress;

pub use {
    common::{
        distances_to_csv, farthest_point_subset, generate_grid_mesh, generate_line_mesh,
        jitter_vertices, operator_to_csv,
    },
    config::{
        ConfigError, InterpolationFunction, InterpolationSettings, InterpolationSettingsBuilder,
    },
    mesh::SurfaceMesh,
    operator::{
        InterpolationOperator, OperatorIOError, build_interpolation_mat, load_operator,
        save_operator,
    },
    scdc::{DistanceMatrix, scdc},
    worker::{InterpolationMatWorker, InterpolationMatWorkerBuilder, OperatorSink},
};
