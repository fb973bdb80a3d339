use cortical_interp::progress::closure_sink;
use cortical_interp::{
    InterpolationFunction, InterpolationMatWorker, InterpolationOperator, InterpolationSettings,
    OperatorSink, farthest_point_subset, generate_grid_mesh, jitter_vertices,
};
use faer::Mat;
use std::sync::{Arc, Mutex, mpsc};

#[derive(Debug)]
struct ChannelSink {
    tx: Mutex<mpsc::Sender<Arc<InterpolationOperator>>>,
}

impl OperatorSink for ChannelSink {
    fn publish(&self, operator: &Arc<InterpolationOperator>) {
        let _ = self.tx.lock().unwrap().send(operator.clone());
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A jittered triangulated grid stands in for a cortical patch
    let (mut vertices, neighbors) = generate_grid_mesh(40, 40, 1.0);
    jitter_vertices(&mut vertices, 0.2, Some(42));

    // Estimates will only arrive at a spread subset of 25 vertices
    let subset = farthest_point_subset(&vertices, 25, 0);

    let (progress, progress_handle) = closure_sink(64, |msg| println!("progress: {:?}", msg));
    let (tx, rx) = mpsc::channel();
    let sink = Arc::new(ChannelSink { tx: Mutex::new(tx) });

    let worker = InterpolationMatWorker::builder()
        .settings(
            InterpolationSettings::builder(InterpolationFunction::Cubic)
                .cancel_distance(4.0)
                .build(),
        )
        .progress_callback(progress)
        .subscribe(sink)
        .build();

    // Register the geometry; the first operator arrives asynchronously
    worker.set_interpolation_info(vertices, neighbors, subset.clone())?;
    let operator = rx.recv()?;

    // Stream a few frames of synthetic estimates through the operator
    let mut estimates = Mat::<f64>::zeros(subset.len(), 1);
    for frame in 0..5 {
        estimates
            .col_mut(0)
            .iter_mut()
            .enumerate()
            .for_each(|(i, value)| *value = ((frame + i) as f64 * 0.37).sin());

        let dense = operator.apply(&estimates);
        println!(
            "frame {}: {} interpolated vertices, {} without coverage",
            frame,
            dense.nrows(),
            operator.num_empty_rows()
        );
    }

    // A kernel change rebuilds the operator without re-solving distances
    worker.set_interpolation_function(InterpolationFunction::Gaussian);
    let _updated = rx.recv()?;
    println!(
        "distance solves: {}, operator builds: {}",
        worker.distance_solve_count(),
        worker.operator_build_count()
    );

    drop(worker);
    let _ = progress_handle.join();
    Ok(())
}
