/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines shared helpers for mesh generation, subset sampling, and CSV inspection dumps.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::operator::InterpolationOperator;
use crate::scdc::DistanceMatrix;
use cortical_interp_utils::get_distance;
use csv::Writer;
use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;

/// Generates a chain mesh of `n` vertices along the x axis with the
/// given spacing.
///
/// # Returns
/// `(vertices, neighbors)` suitable for [`SurfaceMesh::new`], with each
/// interior vertex connected to its two chain neighbors.
///
/// [`SurfaceMesh::new`]: crate::SurfaceMesh::new
pub fn generate_line_mesh(n: usize, spacing: f64) -> (Mat<f64>, Vec<Vec<usize>>) {
    let vertices = Mat::from_fn(n, 3, |i, j| match j {
        0 => i as f64 * spacing,
        _ => 0.0,
    });

    let neighbors = (0..n)
        .map(|i| {
            let mut list = Vec::with_capacity(2);
            if i > 0 {
                list.push(i - 1);
            }
            if i + 1 < n {
                list.push(i + 1);
            }
            list
        })
        .collect();

    (vertices, neighbors)
}

/// Generates a triangulated planar grid mesh of `rows x cols` vertices.
///
/// Vertex `(r, c)` sits at `(c * spacing, r * spacing, 0)` with index
/// `r * cols + c`. Each grid quad is split along its down-right
/// diagonal, so every interior vertex has six neighbors.
///
/// # Returns
/// `(vertices, neighbors)` suitable for [`SurfaceMesh::new`].
///
/// [`SurfaceMesh::new`]: crate::SurfaceMesh::new
pub fn generate_grid_mesh(rows: usize, cols: usize, spacing: f64) -> (Mat<f64>, Vec<Vec<usize>>) {
    let n = rows * cols;
    let vertices = Mat::from_fn(n, 3, |i, j| match j {
        0 => (i % cols) as f64 * spacing,
        1 => (i / cols) as f64 * spacing,
        _ => 0.0,
    });

    let mut neighbors = vec![Vec::new(); n];
    for r in 0..rows {
        for c in 0..cols {
            let index = r * cols + c;
            // Axis-aligned edges plus the down-right/up-left split
            // diagonal; the offsets are mirror pairs, so adjacency comes
            // out symmetric by construction.
            let candidates: [(isize, isize); 6] =
                [(0, -1), (0, 1), (-1, 0), (1, 0), (-1, -1), (1, 1)];
            for (dr, dc) in candidates {
                let nr = r as isize + dr;
                let nc = c as isize + dc;
                if nr >= 0 && nr < rows as isize && nc >= 0 && nc < cols as isize {
                    neighbors[index].push(nr as usize * cols + nc as usize);
                }
            }
        }
    }

    (vertices, neighbors)
}

/// Displaces every vertex coordinate by a uniform random offset in
/// `[-amplitude, amplitude)`.
///
/// # Parameters
/// - `seed`: Optional random seed.
///   - If `Some(seed)` is provided, the same displacement will be
///     generated deterministically across runs and platforms (useful
///     for reproducible tests).
///   - If `None`, the generator is seeded from the operating system's
///     randomness source.
pub fn jitter_vertices(vertices: &mut Mat<f64>, amplitude: f64, seed: Option<u64>) {
    let mut rng = match seed.is_some() {
        true => StdRng::seed_from_u64(seed.unwrap()),
        false => StdRng::from_os_rng(),
    };

    vertices.row_iter_mut().for_each(|row| {
        row.iter_mut().for_each(|coordinate| {
            *coordinate += rng.random_range(-amplitude..amplitude);
        });
    });
}

/// Selects a well-spread source subset by farthest point sampling over
/// the vertex positions.
///
/// Starting from `seed_index`, iteratively selects the vertex that
/// maximizes the minimum distance to the already selected subset. A
/// handy default when no forward-model source space is available yet.
///
/// # Returns
/// A vector of `num_wanted` distinct vertex indices, starting with
/// `seed_index`.
pub fn farthest_point_subset(
    vertices: &Mat<f64>,
    num_wanted: usize,
    seed_index: usize,
) -> Vec<usize> {
    let num_vertices = vertices.nrows();
    assert!(seed_index < num_vertices);
    assert!(num_wanted >= 1 && num_wanted <= num_vertices);

    let mut selected = Vec::with_capacity(num_wanted);
    let mut is_selected = vec![false; num_vertices];
    let mut min_dists = vec![f64::INFINITY; num_vertices];

    selected.push(seed_index);
    is_selected[seed_index] = true;

    for _ in 1..num_wanted {
        let last_selected = *selected.last().unwrap();

        for i in 0..num_vertices {
            if is_selected[i] {
                continue;
            }
            let dist = get_distance(vertices.row(last_selected), vertices.row(i));
            if dist < min_dists[i] {
                min_dists[i] = dist;
            }
        }

        // Select the farthest (max-min-distance) point
        let mut farthest_idx = 0;
        let mut max_dist = -1.0;
        for (i, &dist) in min_dists.iter().enumerate() {
            if !is_selected[i] && dist > max_dist {
                max_dist = dist;
                farthest_idx = i;
            }
        }

        selected.push(farthest_idx);
        is_selected[farthest_idx] = true;
    }

    selected
}

/// Writes the finite entries of a distance table to a CSV file.
///
/// Each record is `SourceVertex, MeshVertex, GeodesicDistance`, with the
/// source column reporting the original mesh index of the subset vertex.
///
/// # Errors
/// Returns an error if writing to disk fails.
pub fn distances_to_csv(
    distances: &DistanceMatrix,
    subset: &[usize],
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    assert_eq!(subset.len(), distances.num_sources());

    let mut wtr = Writer::from_path(filename)?;
    wtr.write_record(["SourceVertex", "MeshVertex", "GeodesicDistance"])?;

    for (row, &source) in subset.iter().enumerate() {
        for &(vertex, distance) in distances.row(row) {
            wtr.write_record(&[
                source.to_string(),
                vertex.to_string(),
                distance.to_string(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Writes the nonzero entries of an interpolation operator to a CSV file.
///
/// Each record is `MeshVertex, SourceColumn, Weight`.
///
/// # Errors
/// Returns an error if writing to disk fails.
pub fn operator_to_csv(
    operator: &InterpolationOperator,
    filename: &str,
) -> Result<(), Box<dyn Error>> {
    let mut wtr = Writer::from_path(filename)?;
    wtr.write_record(["MeshVertex", "SourceColumn", "Weight"])?;

    for row in 0..operator.num_rows() {
        let (cols, weights) = operator.row(row);
        for (&col, &weight) in cols.iter().zip(weights.iter()) {
            wtr.write_record(&[row.to_string(), col.to_string(), weight.to_string()])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpolationFunction;
    use crate::mesh::SurfaceMesh;
    use crate::operator::build_interpolation_mat;
    use crate::scdc::scdc;
    use std::collections::HashSet;

    #[test]
    fn line_mesh_is_a_valid_chain() {
        let (vertices, neighbors) = generate_line_mesh(4, 0.5);
        assert_eq!(vertices.nrows(), 4);
        assert!((vertices[(3, 0)] - 1.5).abs() < 1E-15);
        let mesh = SurfaceMesh::new(vertices, neighbors).unwrap();
        assert_eq!(mesh.neighbors(0), &[1]);
        assert_eq!(mesh.neighbors(3), &[2]);
    }

    #[test]
    fn grid_mesh_passes_validation_and_is_triangulated() {
        let (vertices, neighbors) = generate_grid_mesh(4, 5, 1.0);
        let mesh = SurfaceMesh::new(vertices, neighbors).unwrap();
        assert_eq!(mesh.num_vertices(), 20);

        // An interior vertex (row 1, col 2) touches its quad neighbors
        // and both split diagonals.
        let interior = 5 + 2;
        assert_eq!(mesh.neighbors(interior).len(), 6);

        // Corner vertices keep only their in-bounds edges.
        assert_eq!(mesh.neighbors(0).len(), 3);
    }

    #[test]
    fn jitter_is_deterministic_for_a_fixed_seed() {
        let (mut a, _) = generate_grid_mesh(3, 3, 1.0);
        let (mut b, _) = generate_grid_mesh(3, 3, 1.0);
        jitter_vertices(&mut a, 0.2, Some(99));
        jitter_vertices(&mut b, 0.2, Some(99));
        assert_eq!(a, b);

        let (mut c, _) = generate_grid_mesh(3, 3, 1.0);
        jitter_vertices(&mut c, 0.2, Some(100));
        assert_ne!(a, c);
    }

    #[test]
    fn farthest_point_subset_spreads_over_the_chain() {
        let (vertices, _) = generate_line_mesh(10, 1.0);
        let subset = farthest_point_subset(&vertices, 3, 0);

        assert_eq!(subset.len(), 3);
        assert_eq!(subset[0], 0);
        // The farthest point from vertex 0 is the opposite chain end.
        assert_eq!(subset[1], 9);

        let distinct: HashSet<usize> = subset.iter().copied().collect();
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn csv_dumps_write_one_record_per_entry() {
        let (vertices, neighbors) = generate_line_mesh(5, 1.0);
        let mesh = SurfaceMesh::new(vertices, neighbors).unwrap();
        let subset = [0usize, 4];
        let distances = scdc(&mesh, &subset, 1.5);
        let operator =
            build_interpolation_mat(&distances, &subset, InterpolationFunction::Linear, 1.5);

        let dist_path = std::env::temp_dir().join("cortical_interp_distances.csv");
        let op_path = std::env::temp_dir().join("cortical_interp_operator.csv");

        distances_to_csv(&distances, &subset, dist_path.to_str().unwrap()).unwrap();
        operator_to_csv(&operator, op_path.to_str().unwrap()).unwrap();

        let dist_lines = std::fs::read_to_string(&dist_path).unwrap().lines().count();
        let op_lines = std::fs::read_to_string(&op_path).unwrap().lines().count();
        std::fs::remove_file(&dist_path).ok();
        std::fs::remove_file(&op_path).ok();

        assert_eq!(dist_lines, 1 + distances.num_finite_pairs());
        assert_eq!(op_lines, 1 + operator.num_nonzero());
    }
}
