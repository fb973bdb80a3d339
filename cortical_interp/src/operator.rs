/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the sparse interpolation operator, its row-normalized construction, and snapshot I/O.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::config::InterpolationFunction;
use crate::scdc::DistanceMatrix;
use cortical_interp_utils::{KernelParams, ROW_SUM_EPSILON, kernel_weight};
use faer::Mat;
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    error::Error,
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Sparse linear map from source-subset values to per-vertex values.
///
/// Shape is `num_rows x num_cols` where rows are mesh vertices and
/// columns follow the source-subset order. Each row is either a convex
/// combination of the subset values (weights sum to 1) or entirely
/// empty, meaning no source vertex lies within the cancel distance and
/// the consumer should fall back to its "no data" rendering.
///
/// Stored compressed-sparse-row; memory and multiply cost scale with the
/// stored nonzeros rather than `num_rows x num_cols`. Published
/// operators are immutable snapshots and are only ever replaced, never
/// mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationOperator {
    num_cols: usize,
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    weights: Vec<f64>,
}

impl InterpolationOperator {
    /// An operator with the given shape and no nonzero entries.
    pub fn empty(num_rows: usize, num_cols: usize) -> Self {
        InterpolationOperator {
            num_cols,
            row_offsets: vec![0; num_rows + 1],
            col_indices: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Number of mesh vertices (rows).
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.row_offsets.len() - 1
    }

    /// Number of source-subset vertices (columns).
    #[inline]
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Number of stored nonzero weights.
    #[inline]
    pub fn num_nonzero(&self) -> usize {
        self.weights.len()
    }

    /// Column indices and weights of one row.
    #[inline]
    pub fn row(&self, row: usize) -> (&[usize], &[f64]) {
        let start = self.row_offsets[row];
        let end = self.row_offsets[row + 1];
        (&self.col_indices[start..end], &self.weights[start..end])
    }

    /// Number of mesh vertices without any source vertex in range.
    pub fn num_empty_rows(&self) -> usize {
        self.row_offsets
            .windows(2)
            .filter(|pair| pair[0] == pair[1])
            .count()
    }

    /// Applies the operator to a matrix of per-source estimates
    /// (`num_cols` rows, one column per frame/sample), producing dense
    /// per-vertex values. Rows without any in-range source come out as
    /// zero.
    pub fn apply(&self, source_estimates: &Mat<f64>) -> Mat<f64> {
        assert_eq!(
            source_estimates.nrows(),
            self.num_cols,
            "Estimate vector length must match the source-subset size"
        );

        let mut result = Mat::zeros(self.num_rows(), source_estimates.ncols());
        for row in 0..self.num_rows() {
            let (cols, weights) = self.row(row);
            for (&col, &weight) in cols.iter().zip(weights.iter()) {
                for sample in 0..source_estimates.ncols() {
                    result[(row, sample)] += weight * source_estimates[(col, sample)];
                }
            }
        }

        result
    }
}

/// Builds the sparse interpolation operator from a solved distance table.
///
/// For each mesh vertex the finite-distance source candidates are
/// weighted by the selected kernel and the row is normalized to sum to
/// one. A vertex with no candidates, or whose raw weights all vanish at
/// the cancel distance, keeps an all-zero row; normalization never
/// divides by a degenerate sum.
///
/// The result is deterministic for identical inputs.
pub fn build_interpolation_mat(
    distances: &DistanceMatrix,
    subset: &[usize],
    interpolation_function: InterpolationFunction,
    cancel_distance: f64,
) -> InterpolationOperator {
    assert_eq!(
        subset.len(),
        distances.num_sources(),
        "Source subset and distance table disagree on the number of sources"
    );

    let params = KernelParams {
        kernel_type: interpolation_function.into(),
        cancel_distance,
    };

    // Transpose the per-source runs into (vertex, source column, distance)
    // triples ordered by row.
    let mut triples: Vec<(usize, usize, f64)> = Vec::with_capacity(distances.num_finite_pairs());
    for col in 0..distances.num_sources() {
        for &(vertex, distance) in distances.row(col) {
            triples.push((vertex, col, distance));
        }
    }
    triples.par_sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    let num_rows = distances.num_vertices();
    let mut row_offsets = Vec::with_capacity(num_rows + 1);
    row_offsets.push(0);
    let mut col_indices = Vec::new();
    let mut weights = Vec::new();
    let mut current_vertex = 0usize;

    for (vertex, group) in &triples.iter().chunk_by(|t| t.0) {
        while current_vertex < vertex {
            row_offsets.push(col_indices.len());
            current_vertex += 1;
        }

        let entries: Vec<(usize, f64)> = group
            .map(|&(_, col, distance)| (col, kernel_weight(distance, &params)))
            .collect();
        let row_sum: f64 = entries.iter().map(|&(_, weight)| weight).sum();

        if row_sum > ROW_SUM_EPSILON {
            for (col, weight) in entries {
                if weight > 0.0 {
                    col_indices.push(col);
                    weights.push(weight / row_sum);
                }
            }
        }

        row_offsets.push(col_indices.len());
        current_vertex = vertex + 1;
    }

    while current_vertex < num_rows {
        row_offsets.push(col_indices.len());
        current_vertex += 1;
    }

    InterpolationOperator {
        num_cols: subset.len(),
        row_offsets,
        col_indices,
        weights,
    }
}

const JSON_FORMAT_NAME: &str = "cortical_interp.operator.json";
const JSON_VERSION: u32 = 1;

/// Borrowing envelope for SAVE (no clone of the operator).
#[derive(Serialize)]
struct JsonEnvelopeRef<'a, T: ?Sized> {
    format: &'static str,
    version: u32,
    #[serde(flatten)]
    operator: &'a T,
}

/// Owning envelope for LOAD.
#[derive(Serialize, Deserialize)]
struct JsonEnvelopeOwned<T> {
    format: String,
    version: u32,
    #[serde(flatten)]
    operator: T,
}

type OperatorIOResult<T> = std::result::Result<T, OperatorIOError>;

/// Saves an operator snapshot to a versioned JSON file.
///
/// # Errors
/// - Returns `OperatorIOError::{Create, Serialize, Flush}` on I/O or
///   serialization failures.
pub fn save_operator<P: AsRef<Path>>(
    operator: &InterpolationOperator,
    path: P,
) -> OperatorIOResult<()> {
    let path_ref = path.as_ref();

    let file = File::create(path_ref).map_err(|e| OperatorIOError::Create {
        path: path_ref.to_path_buf(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    let env = JsonEnvelopeRef {
        format: JSON_FORMAT_NAME,
        version: JSON_VERSION,
        operator,
    };

    serde_json::to_writer_pretty(&mut writer, &env).map_err(|e| OperatorIOError::Serialize {
        path: path_ref.to_path_buf(),
        source: e,
    })?;

    writer.flush().map_err(|e| OperatorIOError::Flush {
        path: path_ref.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Loads an operator snapshot saved by [`save_operator`].
///
/// # Errors
/// - Returns `OperatorIOError::{Open, Parse, FormatMismatch,
///   VersionMismatch}` as appropriate.
pub fn load_operator<P: AsRef<Path>>(path: P) -> OperatorIOResult<InterpolationOperator> {
    let path_ref = path.as_ref();

    let file = File::open(path_ref).map_err(|e| OperatorIOError::Open {
        path: path_ref.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::new(file);

    let env: JsonEnvelopeOwned<InterpolationOperator> =
        serde_json::from_reader(reader).map_err(|e| OperatorIOError::Parse {
            path: path_ref.to_path_buf(),
            source: e,
        })?;

    if env.format != JSON_FORMAT_NAME {
        return Err(OperatorIOError::FormatMismatch {
            path: path_ref.to_path_buf(),
            found: env.format,
            expected: JSON_FORMAT_NAME,
        });
    }

    if env.version != JSON_VERSION {
        return Err(OperatorIOError::VersionMismatch {
            path: path_ref.to_path_buf(),
            found: env.version,
            expected: JSON_VERSION,
        });
    }

    Ok(env.operator)
}

/// Errors that can occur when saving or loading an [`InterpolationOperator`]
/// snapshot.
#[derive(Debug)]
pub enum OperatorIOError {
    /// Failed to create the target file before writing a snapshot.
    Create { path: PathBuf, source: io::Error },
    /// Failed to open an existing snapshot file for reading.
    Open { path: PathBuf, source: io::Error },
    /// Failed to flush buffered output when finishing a write.
    Flush { path: PathBuf, source: io::Error },
    /// Error serializing the in-memory operator to JSON.
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Error parsing JSON when reading a snapshot from disk.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The JSON `format` field does not match the expected snapshot format.
    FormatMismatch {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },
    /// The JSON `version` field does not match the supported version.
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
}

impl fmt::Display for OperatorIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorIOError::Create { path, source } => {
                write!(f, "creating {}: {}", path.display(), source)
            }
            OperatorIOError::Open { path, source } => {
                write!(f, "opening {}: {}", path.display(), source)
            }
            OperatorIOError::Flush { path, source } => {
                write!(f, "flushing {}: {}", path.display(), source)
            }
            OperatorIOError::Serialize { path, source } => {
                write!(f, "serializing JSON to {}: {}", path.display(), source)
            }
            OperatorIOError::Parse { path, source } => {
                write!(f, "parsing JSON in {}: {}", path.display(), source)
            }
            OperatorIOError::FormatMismatch {
                path,
                found,
                expected,
            } => write!(
                f,
                "unsupported format {:?} (expected {:?}) in {}",
                found,
                expected,
                path.display()
            ),
            OperatorIOError::VersionMismatch {
                path,
                found,
                expected,
            } => write!(
                f,
                "unsupported version {} (expected {}) in {}",
                found,
                expected,
                path.display()
            ),
        }
    }
}

impl Error for OperatorIOError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OperatorIOError::Create { source, .. }
            | OperatorIOError::Open { source, .. }
            | OperatorIOError::Flush { source, .. } => Some(source),
            OperatorIOError::Serialize { source, .. } | OperatorIOError::Parse { source, .. } => {
                Some(source)
            }
            OperatorIOError::FormatMismatch { .. } | OperatorIOError::VersionMismatch { .. } => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{generate_grid_mesh, generate_line_mesh, jitter_vertices};
    use crate::mesh::SurfaceMesh;
    use crate::scdc::scdc;
    use faer::Mat;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn line_setup(n: usize, subset: &[usize], cutoff: f64) -> (SurfaceMesh, DistanceMatrix) {
        let (vertices, neighbors) = generate_line_mesh(n, 1.0);
        let mesh = SurfaceMesh::new(vertices, neighbors).unwrap();
        let distances = scdc(&mesh, subset, cutoff);
        (mesh, distances)
    }

    #[test]
    fn five_vertex_chain_with_linear_kernel() {
        let subset = [0usize, 4];
        let (_, distances) = line_setup(5, &subset, 1.5);
        let operator =
            build_interpolation_mat(&distances, &subset, InterpolationFunction::Linear, 1.5);

        assert_eq!(operator.num_rows(), 5);
        assert_eq!(operator.num_cols(), 2);

        // Vertex 0 is a source vertex itself.
        assert_eq!(operator.row(0), (&[0usize][..], &[1.0][..]));

        // Vertex 1 only reaches source 0; the single weight normalizes to 1.
        assert_eq!(operator.row(1), (&[0usize][..], &[1.0][..]));

        // Vertex 2 is beyond the cancel distance of both sources.
        assert_eq!(operator.row(2), (&[][..], &[][..]));

        assert_eq!(operator.row(3), (&[1usize][..], &[1.0][..]));
        assert_eq!(operator.row(4), (&[1usize][..], &[1.0][..]));
        assert_eq!(operator.num_empty_rows(), 1);
    }

    #[test]
    fn rows_sum_to_one_or_are_empty() {
        let (mut vertices, neighbors) = generate_grid_mesh(8, 8, 1.0);
        jitter_vertices(&mut vertices, 0.2, Some(11));
        let mesh = SurfaceMesh::new(vertices, neighbors).unwrap();

        let mut rng = StdRng::seed_from_u64(17);
        let subset: Vec<usize> = (0..6)
            .map(|_| rng.random_range(0..mesh.num_vertices()))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let cutoff = 2.3;
        let distances = scdc(&mesh, &subset, cutoff);

        for function in [
            InterpolationFunction::Linear,
            InterpolationFunction::Square,
            InterpolationFunction::Cubic,
            InterpolationFunction::Gaussian,
        ] {
            let operator = build_interpolation_mat(&distances, &subset, function, cutoff);
            for row in 0..operator.num_rows() {
                let (_, weights) = operator.row(row);
                if weights.is_empty() {
                    continue;
                }
                let sum: f64 = weights.iter().sum();
                assert!(
                    (sum - 1.0).abs() < 1E-12,
                    "{:?} row {} sums to {}",
                    function,
                    row,
                    sum
                );
                assert!(weights.iter().all(|&w| w > 0.0));
            }
        }
    }

    #[test]
    fn pairs_beyond_the_cutoff_never_appear() {
        let subset = [0usize, 4];
        let cutoff = 1.5;
        let (_, distances) = line_setup(5, &subset, cutoff);

        for function in [
            InterpolationFunction::Linear,
            InterpolationFunction::Square,
            InterpolationFunction::Cubic,
            InterpolationFunction::Gaussian,
        ] {
            let operator = build_interpolation_mat(&distances, &subset, function, cutoff);
            for row in 0..operator.num_rows() {
                let (cols, _) = operator.row(row);
                for &col in cols {
                    let d = distances.distance(col, row).unwrap();
                    assert!(d <= cutoff);
                }
            }
        }
    }

    #[test]
    fn vanishing_kernel_at_the_cutoff_leaves_the_row_empty() {
        // Vertex 1 sits exactly at the cancel distance of its only
        // reachable source, so the linear raw weight is zero.
        let subset = [0usize];
        let (_, distances) = line_setup(3, &subset, 1.0);
        assert_eq!(distances.distance(0, 1), Some(1.0));

        let linear = build_interpolation_mat(&distances, &subset, InterpolationFunction::Linear, 1.0);
        assert_eq!(linear.row(1), (&[][..], &[][..]));

        // The gaussian tail is still positive there, so the same pair
        // keeps a (normalized) weight.
        let gaussian =
            build_interpolation_mat(&distances, &subset, InterpolationFunction::Gaussian, 1.0);
        assert_eq!(gaussian.row(1), (&[0usize][..], &[1.0][..]));
    }

    #[test]
    fn empty_subset_yields_all_zero_operator() {
        let (_, distances) = line_setup(4, &[], 1.5);
        let operator = build_interpolation_mat(&distances, &[], InterpolationFunction::Cubic, 1.5);

        assert_eq!(operator.num_rows(), 4);
        assert_eq!(operator.num_cols(), 0);
        assert_eq!(operator.num_nonzero(), 0);
        assert_eq!(operator.num_empty_rows(), 4);

        let applied = operator.apply(&Mat::zeros(0, 1));
        assert_eq!(applied.nrows(), 4);
        assert!(applied.col(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn repeated_builds_are_bit_identical() {
        let subset = [2usize, 7, 31];
        let (mut vertices, neighbors) = generate_grid_mesh(6, 6, 1.0);
        jitter_vertices(&mut vertices, 0.1, Some(3));
        let mesh = SurfaceMesh::new(vertices, neighbors).unwrap();
        let distances = scdc(&mesh, &subset, 2.0);

        let first =
            build_interpolation_mat(&distances, &subset, InterpolationFunction::Gaussian, 2.0);
        let second =
            build_interpolation_mat(&distances, &subset, InterpolationFunction::Gaussian, 2.0);
        assert_eq!(first, second);
    }

    #[test]
    fn apply_blends_source_estimates() {
        let subset = [0usize, 4];
        let (_, distances) = line_setup(5, &subset, 10.0);
        let operator =
            build_interpolation_mat(&distances, &subset, InterpolationFunction::Linear, 10.0);

        let mut estimates = Mat::<f64>::zeros(2, 1);
        estimates[(0, 0)] = 1.0;
        estimates[(1, 0)] = 3.0;

        let dense = operator.apply(&estimates);
        assert_eq!(dense.nrows(), 5);

        // The midpoint blends both sources evenly. Vertex 0 weights its
        // own source 1.0 and the far source 1 - 4/10 = 0.6, so its value
        // is (1.0 * 1.0 + 0.6 * 3.0) / 1.6; vertex 4 mirrors it.
        assert!((dense[(2, 0)] - 2.0).abs() < 1E-12);
        assert!((dense[(0, 0)] - 1.75).abs() < 1E-12);
        assert!((dense[(4, 0)] - 2.25).abs() < 1E-12);

        // Interior vertices stay inside the convex hull of the inputs.
        for row in 0..5 {
            assert!(dense[(row, 0)] >= 1.0 - 1E-12);
            assert!(dense[(row, 0)] <= 3.0 + 1E-12);
        }
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let subset = [0usize, 4];
        let (_, distances) = line_setup(5, &subset, 1.5);
        let operator =
            build_interpolation_mat(&distances, &subset, InterpolationFunction::Square, 1.5);

        let path = std::env::temp_dir().join("cortical_interp_operator_roundtrip.json");
        save_operator(&operator, &path).unwrap();
        let loaded = load_operator(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(operator, loaded);
    }

    #[test]
    fn snapshot_load_rejects_wrong_format_and_version() {
        let path = std::env::temp_dir().join("cortical_interp_operator_badformat.json");
        std::fs::write(
            &path,
            r#"{"format":"something_else.json","version":1,"num_cols":0,"row_offsets":[0],"col_indices":[],"weights":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            load_operator(&path),
            Err(OperatorIOError::FormatMismatch { .. })
        ));
        std::fs::remove_file(&path).ok();

        let path = std::env::temp_dir().join("cortical_interp_operator_badversion.json");
        std::fs::write(
            &path,
            r#"{"format":"cortical_interp.operator.json","version":99,"num_cols":0,"row_offsets":[0],"col_indices":[],"weights":[]}"#,
        )
        .unwrap();
        assert!(matches!(
            load_operator(&path),
            Err(OperatorIOError::VersionMismatch { .. })
        ));
        std::fs::remove_file(&path).ok();
    }
}
