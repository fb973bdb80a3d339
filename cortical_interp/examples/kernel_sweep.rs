use cortical_interp::{
    InterpolationFunction, SurfaceMesh, build_interpolation_mat, farthest_point_subset,
    generate_grid_mesh, jitter_vertices, operator_to_csv, scdc,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (mut vertices, neighbors) = generate_grid_mesh(30, 30, 1.0);
    jitter_vertices(&mut vertices, 0.15, Some(7));

    let subset = farthest_point_subset(&vertices, 16, 0);
    let mesh = SurfaceMesh::new(vertices, neighbors)?;

    // Distances are kernel-independent, so a single solve feeds every build
    let cancel_distance = 5.0;
    let distances = scdc(&mesh, &subset, cancel_distance);
    println!(
        "{} finite pairs within cancel distance {}",
        distances.num_finite_pairs(),
        cancel_distance
    );

    for function in [
        InterpolationFunction::Linear,
        InterpolationFunction::Square,
        InterpolationFunction::Cubic,
        InterpolationFunction::Gaussian,
    ] {
        let operator = build_interpolation_mat(&distances, &subset, function, cancel_distance);
        println!(
            "{:<8} nonzeros {:>6}  uncovered vertices {:>4}",
            function.name(),
            operator.num_nonzero(),
            operator.num_empty_rows()
        );

        let filename = format!("operator_{}.csv", function.name().to_lowercase());
        operator_to_csv(&operator, &filename)?;
    }

    Ok(())
}
