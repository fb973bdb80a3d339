/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the validated, immutable adjacency view over the surface mesh.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::config::ConfigError;
use cortical_interp_utils::get_distance;
use faer::{Mat, RowRef};
use std::collections::HashSet;

/// Immutable adjacency view over the triangulated cortical surface.
///
/// Holds one 3D position per vertex and, for each vertex, the indices of
/// its directly connected neighbors. Construction validates the input
/// once; afterwards every accessor can assume dense indices in
/// `[0, num_vertices)` and symmetric adjacency.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    /// Vertex positions, one row per vertex.
    vertices: Mat<f64>,

    /// Directly adjacent vertex indices, one list per vertex.
    neighbors: Vec<Vec<usize>>,
}

impl SurfaceMesh {
    /// Builds a mesh view from vertex positions and an adjacency table.
    ///
    /// Rejects an empty mesh, a neighbor table whose length does not
    /// match the vertex count, out-of-range neighbor indices, and
    /// one-directional edges. A rejected mesh is a recoverable
    /// configuration error, never a panic.
    pub fn new(vertices: Mat<f64>, neighbors: Vec<Vec<usize>>) -> Result<SurfaceMesh, ConfigError> {
        let num_vertices = vertices.nrows();

        if num_vertices == 0 {
            return Err(ConfigError::EmptyMesh);
        }

        assert!(
            vertices.ncols() == 3,
            "Expected 3D vertex positions, got {} columns",
            vertices.ncols()
        );

        if neighbors.len() != num_vertices {
            return Err(ConfigError::NeighborCountMismatch {
                expected: num_vertices,
                found: neighbors.len(),
            });
        }

        for (vertex, list) in neighbors.iter().enumerate() {
            for &neighbor in list {
                if neighbor >= num_vertices {
                    return Err(ConfigError::NeighborOutOfRange {
                        vertex,
                        neighbor,
                        num_vertices,
                    });
                }
                if !neighbors[neighbor].contains(&vertex) {
                    return Err(ConfigError::AsymmetricAdjacency { vertex, neighbor });
                }
            }
        }

        Ok(SurfaceMesh {
            vertices,
            neighbors,
        })
    }

    /// Number of mesh vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.nrows()
    }

    /// All vertex positions, one row per vertex.
    #[inline]
    pub fn vertices(&self) -> &Mat<f64> {
        &self.vertices
    }

    /// Position of a single vertex.
    #[inline]
    pub fn position(&self, vertex: usize) -> RowRef<f64> {
        self.vertices.row(vertex)
    }

    /// Directly adjacent vertex indices of `vertex`.
    #[inline]
    pub fn neighbors(&self, vertex: usize) -> &[usize] {
        &self.neighbors[vertex]
    }

    /// Euclidean length of the edge between two adjacent vertices.
    #[inline]
    pub fn edge_length(&self, a: usize, b: usize) -> f64 {
        get_distance(self.vertices.row(a), self.vertices.row(b))
    }

    /// Validates a source subset against this mesh: indices must be in
    /// range and distinct. Subset order is caller-defined and preserved.
    pub fn validate_subset(&self, subset: &[usize]) -> Result<(), ConfigError> {
        let num_vertices = self.num_vertices();
        let mut seen = HashSet::with_capacity(subset.len());

        for &index in subset {
            if index >= num_vertices {
                return Err(ConfigError::SubsetIndexOutOfRange {
                    index,
                    num_vertices,
                });
            }
            if !seen.insert(index) {
                return Err(ConfigError::DuplicateSubsetIndex { index });
            }
        }

        Ok(())
    }
}
