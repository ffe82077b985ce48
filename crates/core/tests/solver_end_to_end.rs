//! End-to-end checks of one solver sub-step
use fluid_sim_core::solver::{divergence, GridField};
use fluid_sim_core::{DensityEdit, FluidSolver, GridGeometry, SolverParams, Vec2};

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn divergence_energy(solver: &FluidSolver) -> f32 {
    divergence(solver.velocity_x(), solver.velocity_y())
        .interior()
        .map(|(_, _, d)| d * d)
        .sum()
}

#[test]
fn test_still_density_impulse_is_unchanged() {
    // One sweep at zero rate reproduces the source exactly
    let params = SolverParams {
        diffusion_rate: 0.0,
        gauss_seidel_iterations: 1,
        ..Default::default()
    };
    let mut solver = FluidSolver::new(GridGeometry::new(16, 16.0).unwrap(), params).unwrap();
    solver.set_density(8, 8, DensityEdit::Fill).unwrap();
    let before: GridField = solver.density().clone();

    solver.sub_step(0.05).unwrap();

    for (x, y, value) in solver.density().interior() {
        assert_eq!(value, before.get(x, y), "density changed at ({x}, {y})");
    }
    assert_eq!(solver.max_speed(), 0.0);
}

#[test]
fn test_velocity_injection_divergence_is_projected_away() {
    let mut solver =
        FluidSolver::new(GridGeometry::new(16, 16.0).unwrap(), SolverParams::default()).unwrap();
    solver.add_velocity(8, 8, Vec2::new(5.0, 0.0)).unwrap();

    // Central differences put the divergence on the horizontal neighbours
    let div = divergence(solver.velocity_x(), solver.velocity_y());
    assert_eq!(div.get(9, 8), 2.5);
    assert_eq!(div.get(7, 8), -2.5);
    assert_eq!(div.get(8, 8), 0.0);
    let energy_before = divergence_energy(&solver);
    let max_before = solver.max_divergence();

    solver.sub_step(0.05).unwrap();

    let energy_after = divergence_energy(&solver);
    let max_after = solver.max_divergence();
    assert!(
        energy_after < 0.5 * energy_before,
        "divergence energy {energy_before} -> {energy_after}"
    );
    assert!(
        max_after < 0.5 * max_before,
        "max divergence {max_before} -> {max_after}"
    );
    assert!(solver.max_speed() > 0.0, "projection should not erase the flow");
}

#[test]
fn test_zero_iterations_zero_the_fields() {
    let params = SolverParams {
        gauss_seidel_iterations: 0,
        ..Default::default()
    };
    let mut solver = FluidSolver::new(GridGeometry::new(8, 8.0).unwrap(), params).unwrap();
    solver.set_density(4, 4, DensityEdit::Fill).unwrap();
    solver.add_velocity(4, 4, Vec2::new(1.0, 1.0)).unwrap();

    solver.sub_step(0.01).unwrap();

    assert_eq!(solver.total_density(), 0.0);
    assert_eq!(solver.max_speed(), 0.0);
}

#[test]
fn test_time_step_stays_within_bounds() {
    let mut solver =
        FluidSolver::new(GridGeometry::new(32, 8.35).unwrap(), SolverParams::default()).unwrap();
    let max_step = SolverParams::default().max_time_step();

    for frame in 0..20 {
        if frame < 4 {
            solver.add_velocity(16, 16, Vec2::new(0.0, 10.0)).unwrap();
        }
        let report = solver.step_frame(1.0 / 60.0).unwrap();
        assert!(report.time_step > 0.0);
        assert!(report.time_step <= max_step);
        assert!(solver.velocity_x().as_slice().iter().all(|v| v.is_finite()));
    }
}
