//! Fluid solver orchestrator
//!
//! Owns the live density and velocity fields and sequences one sub-step as:
//!
//! 1. Diffuse `vx` (horizontal kind) and `vy` (vertical kind)
//! 2. Project
//! 3. Self-advect `vx` and `vy`, both sampled from the projected velocity
//! 4. Project
//! 5. Diffuse density, then advect it with the updated velocity
//!
//! [`FluidSolver::step_frame`] turns a frame's wall-clock time into as many of
//! these sub-steps as the [`StabilityController`] allows.

use super::advection::advect;
use super::boundary::{enforce_boundary, BoundaryKind};
use super::diffusion::diffuse;
use super::fields::GridField;
use super::params::{GridGeometry, SolverParams};
use super::profiler::ProfilerScope;
use super::projection::{divergence, project};
use super::stability::{self, StabilityController};
use crate::core_types::Vec2;
use crate::error::{FluidSimError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Density written by a paint gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DensityEdit {
    /// Set density to 1
    Fill,
    /// Set density to 0
    Erase,
}

impl DensityEdit {
    /// Density value written to the cell
    #[must_use]
    pub const fn value(self) -> f32 {
        match self {
            Self::Fill => 1.0,
            Self::Erase => 0.0,
        }
    }
}

/// Outcome of one [`FluidSolver::step_frame`] call
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// Sub-steps run this frame
    pub sub_steps: u32,
    /// Length of the last planned sub-step in seconds
    pub time_step: f32,
}

/// Stable Fluids solver over a square grid with a ghost border
#[derive(Debug, Clone)]
pub struct FluidSolver {
    geometry: GridGeometry,
    params: SolverParams,
    density: GridField,
    velocity_x: GridField,
    velocity_y: GridField,
    stability: StabilityController,
}

impl FluidSolver {
    /// Create a solver with all fields at zero
    ///
    /// # Errors
    ///
    /// Returns an error if `geometry` or `params` fail validation
    pub fn new(geometry: GridGeometry, params: SolverParams) -> Result<Self> {
        geometry.validate()?;
        params.validate()?;

        info!(
            "Creating fluid solver: {}x{} cells, cell size {:.4}, {} Gauss-Seidel iterations",
            geometry.resolution,
            geometry.resolution,
            geometry.cell_size(),
            params.gauss_seidel_iterations
        );

        let n = geometry.resolution;
        Ok(Self {
            geometry,
            params,
            density: GridField::new(n),
            velocity_x: GridField::new(n),
            velocity_y: GridField::new(n),
            stability: StabilityController::new(params.max_time_step()),
        })
    }

    /// Advance by one frame of wall-clock time
    ///
    /// Runs sub-steps until the accumulated time is spent. The step-rate
    /// ceiling is checked before any time is banked and again before each
    /// sub-step.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a negative or non-finite `elapsed`, and
    /// `StepRateExceeded` if the adaptive step falls below the ceiling. On the
    /// latter no further sub-step starts and unspent time is discarded.
    pub fn step_frame(&mut self, elapsed: f32) -> Result<FrameReport> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(FluidSimError::invalid_parameter("elapsed", elapsed));
        }

        let _scope = ProfilerScope::new("fluid_frame");
        let cell_size = self.geometry.cell_size();

        self.stability.plan_step(self.params.cfl, cell_size)?;
        self.stability.accumulate(elapsed);

        let mut sub_steps = 0;
        while self.stability.has_pending() {
            let dt = match self.stability.plan_step(self.params.cfl, cell_size) {
                Ok(dt) => dt,
                Err(e) => {
                    self.stability.discard_pending();
                    return Err(e);
                }
            };

            self.run_pipeline(dt);
            self.stability.record_max_speed(
                &self.velocity_x,
                &self.velocity_y,
                cell_size,
                self.params.forcing,
            );
            self.stability.spend(dt);
            sub_steps += 1;
        }

        debug!(
            "Frame advanced {:.4}s in {} sub-steps (dt = {:.5}s, max speed {:.3})",
            elapsed,
            sub_steps,
            self.stability.time_step(),
            self.stability.current_max_speed()
        );

        Ok(FrameReport {
            sub_steps,
            time_step: self.stability.time_step(),
        })
    }

    /// Run exactly one sub-step of length `dt`, bypassing the accumulator
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `dt` is not finite and positive
    pub fn sub_step(&mut self, dt: f32) -> Result<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(FluidSimError::invalid_parameter("dt", dt));
        }
        self.run_pipeline(dt);
        self.stability.record_max_speed(
            &self.velocity_x,
            &self.velocity_y,
            self.geometry.cell_size(),
            self.params.forcing,
        );
        Ok(())
    }

    fn run_pipeline(&mut self, dt: f32) {
        let _scope = ProfilerScope::new("fluid_sub_step");
        let rate = self.params.diffusion_rate;
        let iterations = self.params.gauss_seidel_iterations;

        // Velocity
        let mut vx = diffuse(&self.velocity_x, rate, dt, iterations, BoundaryKind::Horizontal);
        let mut vy = diffuse(&self.velocity_y, rate, dt, iterations, BoundaryKind::Vertical);
        project(&mut vx, &mut vy, iterations);

        let mut advected_x = advect(&vx, &vx, &vy, dt, BoundaryKind::Horizontal);
        let mut advected_y = advect(&vy, &vx, &vy, dt, BoundaryKind::Vertical);
        project(&mut advected_x, &mut advected_y, iterations);

        // Density
        let density = diffuse(&self.density, rate, dt, iterations, BoundaryKind::None);
        self.density = advect(&density, &advected_x, &advected_y, dt, BoundaryKind::None);

        self.velocity_x = advected_x;
        self.velocity_y = advected_y;
    }

    fn check_cell(&self, x: usize, y: usize) -> Result<()> {
        if self.density.is_interior(x, y) {
            Ok(())
        } else {
            Err(FluidSimError::CellOutOfBounds {
                x,
                y,
                resolution: self.geometry.resolution,
            })
        }
    }

    /// Add `delta` to the velocity at interior cell `(x, y)`
    ///
    /// # Errors
    ///
    /// Returns `CellOutOfBounds` unless `1 <= x, y <= N`
    pub fn add_velocity(&mut self, x: usize, y: usize, delta: Vec2) -> Result<()> {
        self.check_cell(x, y)?;
        self.velocity_x.add(x, y, delta.x);
        self.velocity_y.add(x, y, delta.y);
        enforce_boundary(&mut self.velocity_x, BoundaryKind::Horizontal);
        enforce_boundary(&mut self.velocity_y, BoundaryKind::Vertical);
        Ok(())
    }

    /// Write the density of interior cell `(x, y)`
    ///
    /// # Errors
    ///
    /// Returns `CellOutOfBounds` unless `1 <= x, y <= N`
    pub fn set_density(&mut self, x: usize, y: usize, edit: DensityEdit) -> Result<()> {
        self.check_cell(x, y)?;
        self.density.set(x, y, edit.value());
        enforce_boundary(&mut self.density, BoundaryKind::None);
        Ok(())
    }

    /// Zero the density field
    pub fn clear_density(&mut self) {
        self.density.fill_interior(0.0);
        enforce_boundary(&mut self.density, BoundaryKind::None);
    }

    /// Zero both velocity components
    ///
    /// The speed estimate and any unspent time were measured against the old
    /// velocities, so the stability controller starts over as well.
    pub fn clear_velocity(&mut self) {
        self.velocity_x.fill_interior(0.0);
        self.velocity_y.fill_interior(0.0);
        enforce_boundary(&mut self.velocity_x, BoundaryKind::Horizontal);
        enforce_boundary(&mut self.velocity_y, BoundaryKind::Vertical);
        self.stability.reset();
    }

    /// Overwrite the live density with `snapshot`
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the snapshot resolution differs
    pub fn replace_density(&mut self, snapshot: &GridField) -> Result<()> {
        if snapshot.resolution() != self.geometry.resolution {
            return Err(FluidSimError::DimensionMismatch {
                expected: self.geometry.resolution,
                actual: snapshot.resolution(),
            });
        }
        self.density.copy_from(snapshot);
        enforce_boundary(&mut self.density, BoundaryKind::None);
        Ok(())
    }

    /// Reallocate every field at a new geometry, discarding all values
    ///
    /// # Errors
    ///
    /// Returns an error if `geometry` fails validation
    pub fn resize(&mut self, geometry: GridGeometry) -> Result<()> {
        geometry.validate()?;
        info!(
            "Resizing fluid grid {} -> {} cells per axis",
            self.geometry.resolution, geometry.resolution
        );

        let n = geometry.resolution;
        self.geometry = geometry;
        self.density = GridField::new(n);
        self.velocity_x = GridField::new(n);
        self.velocity_y = GridField::new(n);
        self.stability.reset();
        Ok(())
    }

    /// Replace every parameter at once; effective from the next sub-step
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` and leaves the current parameters untouched
    /// if `params` fails validation
    pub fn set_params(&mut self, params: SolverParams) -> Result<()> {
        params.validate()?;
        if params.gauss_seidel_iterations == 0 {
            warn!("Gauss-Seidel iterations set to 0, diffusion will zero every field");
        }
        self.stability.set_max_time_step(params.max_time_step());
        self.params = params;
        Ok(())
    }

    /// # Errors
    ///
    /// See [`FluidSolver::set_params`]
    pub fn set_diffusion_rate(&mut self, diffusion_rate: f32) -> Result<()> {
        self.set_params(SolverParams {
            diffusion_rate,
            ..self.params
        })
    }

    /// # Errors
    ///
    /// See [`FluidSolver::set_params`]
    pub fn set_minimum_steps_per_second(&mut self, minimum_steps_per_second: u32) -> Result<()> {
        self.set_params(SolverParams {
            minimum_steps_per_second,
            ..self.params
        })
    }

    /// # Errors
    ///
    /// See [`FluidSolver::set_params`]
    pub fn set_gauss_seidel_iterations(&mut self, gauss_seidel_iterations: usize) -> Result<()> {
        self.set_params(SolverParams {
            gauss_seidel_iterations,
            ..self.params
        })
    }

    /// # Errors
    ///
    /// See [`FluidSolver::set_params`]
    pub fn set_cfl(&mut self, cfl: f32) -> Result<()> {
        self.set_params(SolverParams { cfl, ..self.params })
    }

    /// Set the external forcing magnitude biasing the next speed estimate
    ///
    /// # Errors
    ///
    /// See [`FluidSolver::set_params`]
    pub fn set_forcing(&mut self, forcing: f32) -> Result<()> {
        self.set_params(SolverParams {
            forcing,
            ..self.params
        })
    }

    /// Live density field
    #[must_use]
    pub fn density(&self) -> &GridField {
        &self.density
    }

    /// Live horizontal velocity field
    #[must_use]
    pub fn velocity_x(&self) -> &GridField {
        &self.velocity_x
    }

    /// Live vertical velocity field
    #[must_use]
    pub fn velocity_y(&self) -> &GridField {
        &self.velocity_y
    }

    /// Most recently planned sub-step in seconds
    #[must_use]
    pub fn time_step(&self) -> f32 {
        self.stability.time_step()
    }

    /// Speed estimate that will drive the next step
    #[must_use]
    pub fn current_max_speed(&self) -> f32 {
        self.stability.current_max_speed()
    }

    /// Largest interior velocity magnitude
    #[must_use]
    pub fn max_speed(&self) -> f32 {
        stability::max_speed(&self.velocity_x, &self.velocity_y)
    }

    /// Largest absolute interior divergence of the velocity field
    #[must_use]
    pub fn max_divergence(&self) -> f32 {
        divergence(&self.velocity_x, &self.velocity_y).interior_max_abs()
    }

    /// Sum of interior density
    #[must_use]
    pub fn total_density(&self) -> f32 {
        self.density.interior_sum()
    }

    #[must_use]
    pub fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    #[must_use]
    pub fn params(&self) -> SolverParams {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solver(resolution: usize) -> FluidSolver {
        let geometry = GridGeometry::new(resolution, resolution as f32).unwrap();
        FluidSolver::new(geometry, SolverParams::default()).unwrap()
    }

    #[test]
    fn test_new_starts_at_rest() {
        let solver = solver(8);
        assert_eq!(solver.total_density(), 0.0);
        assert_eq!(solver.max_speed(), 0.0);
        assert_relative_eq!(solver.time_step(), 1.0 / 30.0);
        assert_eq!(solver.current_max_speed(), stability::INITIAL_MAX_SPEED);
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let geometry = GridGeometry::default();
        let params = SolverParams {
            cfl: -1.0,
            ..Default::default()
        };
        assert!(FluidSolver::new(geometry, params).is_err());
    }

    #[test]
    fn test_injection_bounds() {
        let mut solver = solver(8);
        assert!(solver.set_density(1, 1, DensityEdit::Fill).is_ok());
        assert!(solver.set_density(8, 8, DensityEdit::Fill).is_ok());
        assert_eq!(
            solver.set_density(0, 4, DensityEdit::Fill),
            Err(FluidSimError::CellOutOfBounds {
                x: 0,
                y: 4,
                resolution: 8
            })
        );
        assert!(solver.add_velocity(9, 1, Vec2::new(1.0, 0.0)).is_err());
        assert_eq!(solver.total_density(), 2.0);
    }

    #[test]
    fn test_add_velocity_accumulates() {
        let mut solver = solver(8);
        solver.add_velocity(3, 4, Vec2::new(1.0, -2.0)).unwrap();
        solver.add_velocity(3, 4, Vec2::new(0.5, 0.0)).unwrap();
        assert_eq!(solver.velocity_x().get(3, 4), 1.5);
        assert_eq!(solver.velocity_y().get(3, 4), -2.0);
    }

    #[test]
    fn test_erase_density() {
        let mut solver = solver(8);
        solver.set_density(2, 2, DensityEdit::Fill).unwrap();
        solver.set_density(2, 2, DensityEdit::Erase).unwrap();
        assert_eq!(solver.density().get(2, 2), 0.0);
    }

    #[test]
    fn test_step_frame_spends_elapsed_time() {
        let mut solver = solver(8);
        // Cell size 1, cfl 5, initial speed 100 -> dt = 0.05, clamped to 1/30
        let report = solver.step_frame(0.09).unwrap();
        assert_eq!(report.sub_steps, 3);
        assert_relative_eq!(report.time_step, 1.0 / 30.0);
    }

    #[test]
    fn test_step_frame_zero_elapsed_runs_nothing() {
        let mut solver = solver(8);
        let report = solver.step_frame(0.0).unwrap();
        assert_eq!(report.sub_steps, 0);
    }

    #[test]
    fn test_step_frame_rejects_negative_elapsed() {
        let mut solver = solver(8);
        assert!(matches!(
            solver.step_frame(-0.1),
            Err(FluidSimError::InvalidParameter { name: "elapsed", .. })
        ));
        assert!(solver.step_frame(f32::NAN).is_err());
    }

    #[test]
    fn test_step_rate_exceeded_stops_before_stepping() {
        let geometry = GridGeometry::new(8, 0.08).unwrap();
        let params = SolverParams {
            cfl: 1.0,
            ..Default::default()
        };
        let mut solver = FluidSolver::new(geometry, params).unwrap();
        solver.set_density(4, 4, DensityEdit::Fill).unwrap();

        // cell 0.01 / speed 100 -> 1e-4 s, 10000 steps/s
        let err = solver.step_frame(0.1).unwrap_err();
        assert!(err.is_step_rate_exceeded());
        assert_eq!(solver.density().get(4, 4), 1.0);
    }

    #[test]
    fn test_injection_rewrites_ghosts() {
        let mut solver = solver(4);
        solver.add_velocity(1, 2, Vec2::new(2.0, 3.0)).unwrap();
        assert_eq!(solver.velocity_x().get(0, 2), -2.0);
        assert_eq!(solver.velocity_y().get(0, 2), 3.0);

        solver.set_density(4, 1, DensityEdit::Fill).unwrap();
        assert_eq!(solver.density().get(5, 1), 1.0);
        assert_eq!(solver.density().get(4, 0), 1.0);
    }

    #[test]
    fn test_clear_rederives_ghosts() {
        let mut solver = solver(4);
        solver.add_velocity(1, 2, Vec2::new(2.0, 0.0)).unwrap();
        solver.sub_step(0.01).unwrap();
        assert!(solver.velocity_x().get(0, 2) != 0.0);

        solver.clear_velocity();
        assert_eq!(solver.max_speed(), 0.0);
        assert_eq!(solver.max_divergence(), 0.0);
        assert!(solver.velocity_x().as_slice().iter().all(|&v| v == 0.0));
        assert!(solver.velocity_y().as_slice().iter().all(|&v| v == 0.0));

        solver.set_density(1, 1, DensityEdit::Fill).unwrap();
        solver.clear_density();
        assert!(solver.density().as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_clear_velocity_resets_speed_estimate() {
        let mut solver = solver(8);
        solver.set_forcing(1.0e6).unwrap();
        solver.sub_step(0.01).unwrap();
        assert!(solver.current_max_speed() >= 999.0);

        solver.clear_velocity();
        assert_eq!(solver.current_max_speed(), stability::INITIAL_MAX_SPEED);
        assert_eq!(solver.stability.accumulated(), 0.0);
    }

    #[test]
    fn test_step_rate_exceeded_mid_frame_discards_pending() {
        let mut solver = solver(8);
        // Cell size 1, cfl 5: the ceiling trips once the estimate passes 2500
        solver.add_velocity(4, 4, Vec2::new(1.0e6, 0.0)).unwrap();
        solver.set_forcing(1.0e7).unwrap();

        let err = solver.step_frame(0.1).unwrap_err();
        assert!(err.is_step_rate_exceeded());
        // One sub-step ran before the re-measured estimate tripped the ceiling
        assert_relative_eq!(solver.time_step(), 1.0 / 30.0);
        assert!(solver.current_max_speed() >= (1.0e7_f32).sqrt());
        assert_eq!(solver.stability.accumulated(), 0.0);
        assert!(!solver.stability.has_pending());
    }

    #[test]
    fn test_replace_density() {
        let mut solver = solver(4);
        let mut snapshot = GridField::new(4);
        snapshot.set(1, 3, 1.0);
        solver.replace_density(&snapshot).unwrap();
        assert_eq!(solver.density().get(1, 3), 1.0);
        assert_eq!(solver.density().get(0, 3), 1.0);

        let wrong = GridField::new(5);
        assert_eq!(
            solver.replace_density(&wrong),
            Err(FluidSimError::DimensionMismatch {
                expected: 4,
                actual: 5
            })
        );
    }

    #[test]
    fn test_resize_discards_fields() {
        let mut solver = solver(4);
        solver.set_density(2, 2, DensityEdit::Fill).unwrap();
        let geometry = solver.geometry().with_resolution(16).unwrap();
        solver.resize(geometry).unwrap();

        assert_eq!(solver.density().resolution(), 16);
        assert_eq!(solver.velocity_x().resolution(), 16);
        assert_eq!(solver.velocity_y().resolution(), 16);
        assert_eq!(solver.total_density(), 0.0);
        assert_relative_eq!(solver.geometry().cell_size(), 0.25);
    }

    #[test]
    fn test_invalid_setter_keeps_params() {
        let mut solver = solver(4);
        assert!(solver.set_cfl(f32::INFINITY).is_err());
        assert_eq!(solver.params().cfl, SolverParams::default().cfl);

        solver.set_minimum_steps_per_second(60).unwrap();
        assert_eq!(solver.params().minimum_steps_per_second, 60);
    }

    #[test]
    fn test_sub_step_rejects_bad_dt() {
        let mut solver = solver(4);
        assert!(solver.sub_step(0.0).is_err());
        assert!(solver.sub_step(f32::NAN).is_err());
    }
}
