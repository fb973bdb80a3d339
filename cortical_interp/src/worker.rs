/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the background worker that owns the configuration and publishes rebuilt operators.
//
// Created on: 20 Jul 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    config::{ConfigError, InterpolationFunction, InterpolationSettings, validate_cancel_distance},
    mesh::SurfaceMesh,
    operator::{InterpolationOperator, build_interpolation_mat},
    progress::{ProgressMsg, ProgressSink},
    scdc::{DistanceMatrix, scdc},
};
use faer::Mat;
use std::{
    fmt::Debug,
    mem,
    sync::{
        Arc, Condvar, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
};

/// Sink that receives each newly published interpolation operator.
///
/// Publication happens on the worker thread, one snapshot at a time, so
/// a sink observes operators in non-decreasing configuration order.
pub trait OperatorSink: Send + Sync + Debug {
    fn publish(&self, operator: &Arc<InterpolationOperator>);
}

/// What the next rebuild pass has to redo.
///
/// `Full` re-solves geodesic distances before building the operator;
/// `BuildOnly` reuses the cached distance table (kernel-only change).
/// A `Full` request is never downgraded by a later kernel change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingRebuild {
    None,
    BuildOnly,
    Full,
}

/// Established mesh and source subset, shared with rebuild passes by
/// cheap `Arc` clones.
#[derive(Debug, Clone)]
struct Geometry {
    mesh: Arc<SurfaceMesh>,
    subset: Arc<Vec<usize>>,
}

#[derive(Debug)]
struct WorkerState {
    geometry: Option<Geometry>,
    settings: InterpolationSettings,

    /// Distance table from the last solve, reusable while geometry and
    /// cancel distance stay unchanged.
    distances: Option<Arc<DistanceMatrix>>,

    /// Most recently published operator snapshot.
    latest: Option<Arc<InterpolationOperator>>,

    sinks: Vec<Arc<dyn OperatorSink>>,
    pending: PendingRebuild,

    /// Bumped by every accepted configuration change; a finished rebuild
    /// is only published if this still matches its snapshot.
    generation: u64,

    /// Bumped by changes that invalidate distances (geometry, cancel
    /// distance); gates the distance cache separately since distances
    /// are kernel-independent.
    geometry_generation: u64,

    shutdown: bool,
}

#[derive(Debug)]
struct WorkerShared {
    state: Mutex<WorkerState>,
    work_ready: Condvar,
    solve_count: AtomicUsize,
    build_count: AtomicUsize,
    progress_callback: Option<Arc<dyn ProgressSink>>,
}

fn emit(shared: &WorkerShared, msg: ProgressMsg) {
    if let Some(sink) = &shared.progress_callback {
        sink.emit(msg);
    }
}

/// Convenience builder for constructing an [`InterpolationMatWorker`].
///
/// The builder should be called via the [`InterpolationMatWorker::builder`]
/// method.
pub struct InterpolationMatWorkerBuilder {
    settings: InterpolationSettings,
    progress_callback: Option<Arc<dyn ProgressSink>>,
    sinks: Vec<Arc<dyn OperatorSink>>,
}

impl InterpolationMatWorkerBuilder {
    fn new() -> Self {
        Self {
            settings: InterpolationSettings::default(),
            progress_callback: None,
            sinks: Vec::new(),
        }
    }

    /// Sets the initial kernel and cancel distance.
    pub fn settings(mut self, settings: InterpolationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Optional callback for reporting rebuild progress.
    pub fn progress_callback(mut self, progress_callback: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(progress_callback);
        self
    }

    /// Registers an operator sink before the worker starts.
    pub fn subscribe(mut self, sink: Arc<dyn OperatorSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Builds the worker and starts its rebuild thread.
    pub fn build(self) -> InterpolationMatWorker {
        let shared = Arc::new(WorkerShared {
            state: Mutex::new(WorkerState {
                geometry: None,
                settings: self.settings,
                distances: None,
                latest: None,
                sinks: self.sinks,
                pending: PendingRebuild::None,
                generation: 0,
                geometry_generation: 0,
                shutdown: false,
            }),
            work_ready: Condvar::new(),
            solve_count: AtomicUsize::new(0),
            build_count: AtomicUsize::new(0),
            progress_callback: self.progress_callback,
        });

        let worker_shared = shared.clone();
        let handle = thread::spawn(move || worker_loop(worker_shared));

        InterpolationMatWorker {
            shared,
            handle: Some(handle),
        }
    }
}

#[doc = include_str!("../docs/mat_worker.md")]
#[derive(Debug)]
pub struct InterpolationMatWorker {
    shared: Arc<WorkerShared>,
    handle: Option<JoinHandle<()>>,
}

impl InterpolationMatWorker {
    /// Returns a new [`InterpolationMatWorkerBuilder`].
    pub fn builder() -> InterpolationMatWorkerBuilder {
        InterpolationMatWorkerBuilder::new()
    }

    /// Replaces the mesh and source subset wholesale and schedules a
    /// full rebuild.
    ///
    /// An empty mesh, an invalid adjacency table, or an invalid subset
    /// is rejected: the previous geometry, configuration, and published
    /// operator all stay in place and the error is returned (and
    /// reported through the progress callback).
    pub fn set_interpolation_info(
        &self,
        vertices: Mat<f64>,
        neighbors: Vec<Vec<usize>>,
        subset: Vec<usize>,
    ) -> Result<(), ConfigError> {
        let mesh = match SurfaceMesh::new(vertices, neighbors) {
            Ok(mesh) => mesh,
            Err(error) => {
                emit(
                    &self.shared,
                    ProgressMsg::ConfigRejected {
                        reason: error.to_string(),
                    },
                );
                return Err(error);
            }
        };

        if let Err(error) = mesh.validate_subset(&subset) {
            emit(
                &self.shared,
                ProgressMsg::ConfigRejected {
                    reason: error.to_string(),
                },
            );
            return Err(error);
        }

        let mut state = self.shared.state.lock().unwrap();
        state.geometry = Some(Geometry {
            mesh: Arc::new(mesh),
            subset: Arc::new(subset),
        });
        state.distances = None;
        state.generation += 1;
        state.geometry_generation += 1;
        state.pending = PendingRebuild::Full;
        drop(state);
        self.shared.work_ready.notify_one();

        Ok(())
    }

    /// Updates the weighting kernel.
    ///
    /// If geometry is already established this schedules an operator
    /// rebuild that reuses the last solved distance table; geodesic
    /// distances do not depend on the kernel.
    pub fn set_interpolation_function(&self, interpolation_function: InterpolationFunction) {
        let mut state = self.shared.state.lock().unwrap();
        state.settings.interpolation_function = interpolation_function;

        if state.geometry.is_some() {
            state.generation += 1;
            if state.pending != PendingRebuild::Full {
                state.pending = PendingRebuild::BuildOnly;
            }
            drop(state);
            self.shared.work_ready.notify_one();
        }
    }

    /// Updates the cancel distance and schedules a full rebuild, since
    /// the cancel distance bounds the distance solver's search horizon.
    ///
    /// Negative or non-finite values are rejected and the previous
    /// configuration kept.
    pub fn set_cancel_distance(&self, cancel_distance: f64) -> Result<(), ConfigError> {
        if let Err(error) = validate_cancel_distance(cancel_distance) {
            emit(
                &self.shared,
                ProgressMsg::ConfigRejected {
                    reason: error.to_string(),
                },
            );
            return Err(error);
        }

        let mut state = self.shared.state.lock().unwrap();
        state.settings.cancel_distance = cancel_distance;

        if state.geometry.is_some() {
            state.distances = None;
            state.generation += 1;
            state.geometry_generation += 1;
            state.pending = PendingRebuild::Full;
            drop(state);
            self.shared.work_ready.notify_one();
        }

        Ok(())
    }

    /// Registers a sink for future operator publications.
    ///
    /// The sink receives the next completed rebuild onwards; use
    /// [`latest_operator`](Self::latest_operator) to catch up on the
    /// current snapshot.
    pub fn subscribe(&self, sink: Arc<dyn OperatorSink>) {
        let mut state = self.shared.state.lock().unwrap();
        state.sinks.push(sink);
    }

    /// The most recently published operator snapshot, if any rebuild has
    /// completed yet.
    pub fn latest_operator(&self) -> Option<Arc<InterpolationOperator>> {
        self.shared.state.lock().unwrap().latest.clone()
    }

    /// The currently recorded kernel and cancel distance.
    pub fn settings(&self) -> InterpolationSettings {
        self.shared.state.lock().unwrap().settings
    }

    /// Number of geodesic distance solves performed so far.
    pub fn distance_solve_count(&self) -> usize {
        self.shared.solve_count.load(Ordering::Relaxed)
    }

    /// Number of operator builds performed so far (published or not).
    pub fn operator_build_count(&self) -> usize {
        self.shared.build_count.load(Ordering::Relaxed)
    }
}

impl Drop for InterpolationMatWorker {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state.lock().unwrap();
            state.shutdown = true;
        }
        self.shared.work_ready.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Configuration snapshot taken at the start of a rebuild pass.
struct RebuildJob {
    geometry: Geometry,
    settings: InterpolationSettings,
    cached_distances: Option<Arc<DistanceMatrix>>,
    kind: PendingRebuild,
    generation: u64,
    geometry_generation: u64,
}

fn worker_loop(shared: Arc<WorkerShared>) {
    loop {
        let job = {
            let mut state = shared.state.lock().unwrap();
            loop {
                if state.shutdown {
                    return;
                }
                if state.pending != PendingRebuild::None && state.geometry.is_some() {
                    break;
                }
                state = shared.work_ready.wait(state).unwrap();
            }

            let kind = mem::replace(&mut state.pending, PendingRebuild::None);
            RebuildJob {
                geometry: state.geometry.clone().unwrap(),
                settings: state.settings,
                cached_distances: state.distances.clone(),
                kind,
                generation: state.generation,
                geometry_generation: state.geometry_generation,
            }
        };

        // Solve distances unless this is a kernel-only rebuild with a
        // usable cache.
        let distances = match (job.kind, job.cached_distances) {
            (PendingRebuild::BuildOnly, Some(distances)) => distances,
            _ => {
                let solved = scdc(
                    &job.geometry.mesh,
                    &job.geometry.subset,
                    job.settings.cancel_distance,
                );
                shared.solve_count.fetch_add(1, Ordering::Relaxed);
                emit(
                    &shared,
                    ProgressMsg::DistanceSolveFinished {
                        num_sources: solved.num_sources(),
                        num_finite_pairs: solved.num_finite_pairs(),
                    },
                );
                Arc::new(solved)
            }
        };

        let operator = Arc::new(build_interpolation_mat(
            &distances,
            &job.geometry.subset,
            job.settings.interpolation_function,
            job.settings.cancel_distance,
        ));
        shared.build_count.fetch_add(1, Ordering::Relaxed);

        let publish_to = {
            let mut state = shared.state.lock().unwrap();

            // Distances stay valid as long as geometry and cancel
            // distance are unchanged, even if a newer kernel choice makes
            // the operator itself stale.
            if state.geometry_generation == job.geometry_generation {
                state.distances = Some(distances.clone());
            }

            if state.generation == job.generation {
                state.latest = Some(operator.clone());
                Some(state.sinks.clone())
            } else {
                None
            }
        };

        match publish_to {
            Some(sinks) => {
                emit(
                    &shared,
                    ProgressMsg::OperatorPublished {
                        num_rows: operator.num_rows(),
                        num_nonzero: operator.num_nonzero(),
                        num_empty_rows: operator.num_empty_rows(),
                    },
                );
                for sink in sinks {
                    sink.publish(&operator);
                }
            }
            None => emit(
                &shared,
                ProgressMsg::StaleResultDiscarded {
                    generation: job.generation,
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::generate_line_mesh;
    use std::sync::mpsc;
    use std::time::Duration;

    /// Forwards every published operator over a channel so tests can
    /// wait for rebuilds deterministically.
    #[derive(Debug)]
    struct ChannelSink {
        tx: Mutex<mpsc::Sender<Arc<InterpolationOperator>>>,
    }

    impl ChannelSink {
        fn create() -> (Arc<ChannelSink>, mpsc::Receiver<Arc<InterpolationOperator>>) {
            let (tx, rx) = mpsc::channel();
            (Arc::new(ChannelSink { tx: Mutex::new(tx) }), rx)
        }
    }

    impl OperatorSink for ChannelSink {
        fn publish(&self, operator: &Arc<InterpolationOperator>) {
            let _ = self.tx.lock().unwrap().send(operator.clone());
        }
    }

    const WAIT: Duration = Duration::from_secs(10);

    fn settings(function: InterpolationFunction, cancel_distance: f64) -> InterpolationSettings {
        InterpolationSettings::builder(function)
            .cancel_distance(cancel_distance)
            .build()
    }

    fn expected_operator(
        subset: &[usize],
        function: InterpolationFunction,
        cancel_distance: f64,
    ) -> InterpolationOperator {
        let (vertices, neighbors) = generate_line_mesh(5, 1.0);
        let mesh = SurfaceMesh::new(vertices, neighbors).unwrap();
        let distances = scdc(&mesh, subset, cancel_distance);
        build_interpolation_mat(&distances, subset, function, cancel_distance)
    }

    #[test]
    fn publishes_after_geometry_is_set() {
        let (sink, rx) = ChannelSink::create();
        let worker = InterpolationMatWorker::builder()
            .settings(settings(InterpolationFunction::Linear, 1.5))
            .subscribe(sink)
            .build();

        let (vertices, neighbors) = generate_line_mesh(5, 1.0);
        worker
            .set_interpolation_info(vertices, neighbors, vec![0, 4])
            .unwrap();

        let published = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(
            *published,
            expected_operator(&[0, 4], InterpolationFunction::Linear, 1.5)
        );
        assert_eq!(worker.latest_operator().as_deref(), Some(&*published));
        assert_eq!(worker.distance_solve_count(), 1);
        assert_eq!(worker.operator_build_count(), 1);
    }

    #[test]
    fn kernel_change_reuses_the_distance_table() {
        let (sink, rx) = ChannelSink::create();
        let worker = InterpolationMatWorker::builder()
            .settings(settings(InterpolationFunction::Linear, 10.0))
            .subscribe(sink)
            .build();

        let (vertices, neighbors) = generate_line_mesh(5, 1.0);
        worker
            .set_interpolation_info(vertices, neighbors, vec![0, 4])
            .unwrap();
        let first = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(worker.distance_solve_count(), 1);

        worker.set_interpolation_function(InterpolationFunction::Gaussian);
        let second = rx.recv_timeout(WAIT).unwrap();

        // No re-solve happened, but the operator still changed.
        assert_eq!(worker.distance_solve_count(), 1);
        assert_eq!(worker.operator_build_count(), 2);
        assert_ne!(*first, *second);
        assert_eq!(
            *second,
            expected_operator(&[0, 4], InterpolationFunction::Gaussian, 10.0)
        );
    }

    #[test]
    fn cancel_distance_change_triggers_a_fresh_solve() {
        let (sink, rx) = ChannelSink::create();
        let worker = InterpolationMatWorker::builder()
            .settings(settings(InterpolationFunction::Linear, 10.0))
            .subscribe(sink)
            .build();

        let (vertices, neighbors) = generate_line_mesh(5, 1.0);
        worker
            .set_interpolation_info(vertices, neighbors, vec![0, 4])
            .unwrap();
        rx.recv_timeout(WAIT).unwrap();

        worker.set_cancel_distance(1.5).unwrap();
        let rebuilt = rx.recv_timeout(WAIT).unwrap();

        assert_eq!(worker.distance_solve_count(), 2);
        assert_eq!(
            *rebuilt,
            expected_operator(&[0, 4], InterpolationFunction::Linear, 1.5)
        );
    }

    #[test]
    fn invalid_geometry_is_rejected_and_previous_operator_kept() {
        let (sink, rx) = ChannelSink::create();
        let worker = InterpolationMatWorker::builder()
            .settings(settings(InterpolationFunction::Linear, 1.5))
            .subscribe(sink)
            .build();

        let (vertices, neighbors) = generate_line_mesh(5, 1.0);
        worker
            .set_interpolation_info(vertices, neighbors, vec![0, 4])
            .unwrap();
        let published = rx.recv_timeout(WAIT).unwrap();

        // Empty mesh.
        let result =
            worker.set_interpolation_info(Mat::<f64>::zeros(0, 3), Vec::new(), Vec::new());
        assert_eq!(result, Err(ConfigError::EmptyMesh));

        // Duplicate subset entry.
        let (vertices, neighbors) = generate_line_mesh(5, 1.0);
        let result = worker.set_interpolation_info(vertices, neighbors, vec![0, 0]);
        assert_eq!(result, Err(ConfigError::DuplicateSubsetIndex { index: 0 }));

        // Nothing was rebuilt or replaced.
        assert_eq!(worker.latest_operator().as_deref(), Some(&*published));
        assert_eq!(worker.distance_solve_count(), 1);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn invalid_cancel_distance_is_rejected() {
        let worker = InterpolationMatWorker::builder()
            .settings(settings(InterpolationFunction::Cubic, 0.05))
            .build();

        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                worker.set_cancel_distance(bad),
                Err(ConfigError::InvalidCancelDistance { .. })
            ));
        }
        assert_eq!(worker.settings().cancel_distance, 0.05);
    }

    #[test]
    fn kernel_updates_before_geometry_only_record_the_choice() {
        let (sink, rx) = ChannelSink::create();
        let worker = InterpolationMatWorker::builder()
            .settings(settings(InterpolationFunction::Cubic, 1.5))
            .subscribe(sink)
            .build();

        worker.set_interpolation_function(InterpolationFunction::Square);
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(worker.operator_build_count(), 0);
        assert_eq!(
            worker.settings().interpolation_function,
            InterpolationFunction::Square
        );

        // The recorded kernel is used once geometry arrives.
        let (vertices, neighbors) = generate_line_mesh(5, 1.0);
        worker
            .set_interpolation_info(vertices, neighbors, vec![0, 4])
            .unwrap();
        let published = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(
            *published,
            expected_operator(&[0, 4], InterpolationFunction::Square, 1.5)
        );
    }

    #[test]
    fn rapid_changes_converge_on_the_latest_configuration() {
        let (sink, rx) = ChannelSink::create();
        let worker = InterpolationMatWorker::builder()
            .settings(settings(InterpolationFunction::Linear, 10.0))
            .subscribe(sink)
            .build();

        let (vertices, neighbors) = generate_line_mesh(5, 1.0);
        worker
            .set_interpolation_info(vertices, neighbors, vec![0, 4])
            .unwrap();
        worker.set_interpolation_function(InterpolationFunction::Square);
        worker.set_interpolation_function(InterpolationFunction::Gaussian);
        worker.set_interpolation_function(InterpolationFunction::Cubic);

        // Stale intermediate results may or may not be published, but
        // the stream must end on the final configuration.
        let mut last = rx.recv_timeout(WAIT).unwrap();
        while let Ok(op) = rx.recv_timeout(Duration::from_millis(300)) {
            last = op;
        }
        assert_eq!(
            *last,
            expected_operator(&[0, 4], InterpolationFunction::Cubic, 10.0)
        );

        // Kernel-only churn never re-solves distances.
        assert_eq!(worker.distance_solve_count(), 1);
    }

    #[test]
    fn subset_order_defines_operator_columns() {
        let (sink, rx) = ChannelSink::create();
        let worker = InterpolationMatWorker::builder()
            .settings(settings(InterpolationFunction::Linear, 1.5))
            .subscribe(sink)
            .build();

        let (vertices, neighbors) = generate_line_mesh(5, 1.0);
        worker
            .set_interpolation_info(vertices, neighbors, vec![4, 0])
            .unwrap();
        let published = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(
            *published,
            expected_operator(&[4, 0], InterpolationFunction::Linear, 1.5)
        );
        // Vertex 4 now maps to column 0.
        assert_eq!(published.row(4), (&[0usize][..], &[1.0][..]));
    }
}
