/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements surface-constrained distance computation over the mesh adjacency graph.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Surface-constrained distance computation (SCDC).
//!
//! Computes, for each source-subset vertex, the geodesic distance to
//! every mesh vertex within a cancel radius, by shortest-path expansion
//! over the vertex adjacency graph. Distances follow mesh edges, so two
//! vertices that are close in space but far along the surface are
//! correctly treated as far apart.

use crate::mesh::SurfaceMesh;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Geodesic distance table from each source-subset vertex to every mesh
/// vertex within the cancel distance.
///
/// Conceptually `num_sources x num_vertices`; stored as one sorted
/// `(vertex, distance)` run per source vertex, finite entries only.
/// A missing entry means the pair is farther apart than the cancel
/// distance (or in different mesh components) and must not contribute
/// to interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    num_vertices: usize,
    rows: Vec<Vec<(usize, f64)>>,
}

impl DistanceMatrix {
    pub(crate) fn new(num_vertices: usize, rows: Vec<Vec<(usize, f64)>>) -> Self {
        DistanceMatrix { num_vertices, rows }
    }

    /// Number of source-subset vertices (rows).
    #[inline]
    pub fn num_sources(&self) -> usize {
        self.rows.len()
    }

    /// Number of mesh vertices (columns).
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Finite entries for one source vertex, sorted by mesh-vertex index.
    #[inline]
    pub fn row(&self, source: usize) -> &[(usize, f64)] {
        &self.rows[source]
    }

    /// Geodesic distance from source row `source` to `vertex`, or `None`
    /// if the pair is beyond the cancel distance.
    pub fn distance(&self, source: usize, vertex: usize) -> Option<f64> {
        let row = &self.rows[source];
        row.binary_search_by_key(&vertex, |&(v, _)| v)
            .ok()
            .map(|i| row[i].1)
    }

    /// Total number of finite (reachable) source/vertex pairs.
    pub fn num_finite_pairs(&self) -> usize {
        self.rows.iter().map(|row| row.len()).sum()
    }
}

/// Frontier entry ordered for use in a [`BinaryHeap`] min-heap.
#[derive(Debug, PartialEq)]
struct FrontierEntry {
    distance: f64,
    vertex: usize,
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        // Reverse order for min-heap; equal distances resolve by vertex
        // index so expansion order is deterministic.
        match other.distance.partial_cmp(&self.distance) {
            Some(Ordering::Equal) | None => Some(other.vertex.cmp(&self.vertex)),
            ord => ord,
        }
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// Computes the geodesic distance table for the given source subset,
/// bounded by `cancel_distance`.
///
/// One shortest-path expansion runs per source vertex, in parallel; the
/// per-pair results are identical to the serial form. An empty subset
/// yields an empty table. Unreachable vertices (pruned by the cancel
/// radius or in a disconnected component) are simply absent.
pub fn scdc(mesh: &SurfaceMesh, subset: &[usize], cancel_distance: f64) -> DistanceMatrix {
    let rows = subset
        .par_iter()
        .map(|&source| bounded_expansion(mesh, source, cancel_distance))
        .collect();

    DistanceMatrix::new(mesh.num_vertices(), rows)
}

/// Single-source shortest-path expansion, terminated once the closest
/// unresolved frontier vertex lies beyond the cancel distance.
fn bounded_expansion(mesh: &SurfaceMesh, source: usize, cancel_distance: f64) -> Vec<(usize, f64)> {
    let num_vertices = mesh.num_vertices();
    let mut best = vec![f64::INFINITY; num_vertices];
    let mut settled = vec![false; num_vertices];
    let mut frontier = BinaryHeap::new();

    best[source] = 0.0;
    frontier.push(FrontierEntry {
        distance: 0.0,
        vertex: source,
    });

    while let Some(FrontierEntry { distance, vertex }) = frontier.pop() {
        if distance > cancel_distance {
            // The frontier is priority-ordered, so every remaining entry
            // is at least this far away.
            break;
        }
        if settled[vertex] {
            continue;
        }
        settled[vertex] = true;

        for &neighbor in mesh.neighbors(vertex) {
            if settled[neighbor] {
                continue;
            }
            let candidate = distance + mesh.edge_length(vertex, neighbor);
            if candidate < best[neighbor] {
                best[neighbor] = candidate;
                frontier.push(FrontierEntry {
                    distance: candidate,
                    vertex: neighbor,
                });
            }
        }
    }

    (0..num_vertices)
        .filter(|&v| settled[v])
        .map(|v| (v, best[v]))
        .collect()
}
