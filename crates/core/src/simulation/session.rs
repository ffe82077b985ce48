//! Interactive fluid session
//!
//! `FluidSession` wraps a [`FluidSolver`] with the start/pause/stop/reset
//! lifecycle of an interactive viewer. While stopped, painted density is also
//! recorded into a starting snapshot that is restored on every stop.

use crate::core_types::Vec2;
use crate::error::{FluidSimError, Result};
use crate::solver::{
    DensityEdit, FluidSolver, FrameReport, GridField, GridGeometry, PerformanceStats,
    SolverParams,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RunState {
    /// Not started; edits go to the starting snapshot as well
    #[default]
    Stopped,
    /// Advancing every frame
    Running,
    /// Started but frozen
    Paused,
}

/// Fluid solver plus run state, starting snapshot and HUD counters
pub struct FluidSession {
    solver: FluidSolver,

    /// Density restored on stop
    starting_density: GridField,

    state: RunState,
    stats: PerformanceStats,
}

impl FluidSession {
    /// Create a stopped session with empty fields
    ///
    /// # Errors
    ///
    /// Returns an error if `geometry` or `params` fail validation
    pub fn new(geometry: GridGeometry, params: SolverParams) -> Result<Self> {
        let solver = FluidSolver::new(geometry, params)?;
        info!("Fluid session created in stopped state");

        Ok(Self {
            starting_density: GridField::new(geometry.resolution),
            solver,
            state: RunState::Stopped,
            stats: PerformanceStats::default(),
        })
    }

    /// Start if stopped, otherwise flip between running and paused
    pub fn toggle_start_pause(&mut self) {
        match self.state {
            RunState::Stopped => self.start(),
            RunState::Running => {
                info!("Session paused");
                self.state = RunState::Paused;
            }
            RunState::Paused => {
                info!("Session resumed");
                self.state = RunState::Running;
            }
        }
    }

    /// Load the starting snapshot into the solver and begin running
    pub fn start(&mut self) {
        self.restore_snapshot();
        self.state = RunState::Running;
        info!(
            "Session started with total density {:.3}",
            self.solver.total_density()
        );
    }

    /// Stop, restoring the starting density and clearing all velocity
    ///
    /// Any drag in progress ends and the solver's speed estimate starts over,
    /// so a session paused by the step-rate ceiling can be run again.
    pub fn stop(&mut self) {
        self.state = RunState::Stopped;
        self.restore_snapshot();
        self.end_drag();
        self.solver.clear_velocity();
        info!("Session stopped");
    }

    /// Zero the starting snapshot and the live density; velocity is kept
    pub fn reset_grid(&mut self) {
        self.starting_density.fill(0.0);
        self.restore_snapshot();
        info!("Density grid reset");
    }

    /// Reallocate every field at `resolution` cells per axis, keeping the world size
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolution` for an unsupported resolution
    pub fn resize(&mut self, resolution: usize) -> Result<()> {
        let geometry = self.solver.geometry().with_resolution(resolution)?;
        self.solver.resize(geometry)?;
        self.starting_density = GridField::new(resolution);
        Ok(())
    }

    fn restore_snapshot(&mut self) {
        // Snapshot and solver are always reallocated together
        if let Err(e) = self.solver.replace_density(&self.starting_density) {
            error!("Starting density out of sync with solver: {e}");
        }
    }

    /// Per-frame entry point
    ///
    /// Updates the performance counters and, while running, advances the
    /// solver by `frame_dt`. If the step-rate ceiling is hit the session
    /// pauses itself before returning the error.
    ///
    /// # Errors
    ///
    /// Propagates solver errors from [`FluidSolver::step_frame`]
    pub fn update(&mut self, frame_dt: f32) -> Result<FrameReport> {
        let running = self.is_running();
        self.stats
            .record_frame(frame_dt, self.solver.time_step(), running);

        if !running {
            return Ok(FrameReport::default());
        }

        match self.solver.step_frame(frame_dt) {
            Ok(report) => Ok(report),
            Err(e) => {
                if e.is_step_rate_exceeded() {
                    error!("Simulation paused: {e}");
                    self.state = RunState::Paused;
                }
                Err(e)
            }
        }
    }

    /// Paint density onto interior cells
    ///
    /// While stopped the starting snapshot is written too. Cells are checked
    /// before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `CellOutOfBounds` for the first cell outside the interior
    pub fn paint_density(&mut self, cells: &[(usize, usize)], edit: DensityEdit) -> Result<()> {
        self.check_cells(cells)?;
        let record = self.state == RunState::Stopped;
        for &(x, y) in cells {
            self.solver.set_density(x, y, edit)?;
            if record {
                self.starting_density.set(x, y, edit.value());
            }
        }
        Ok(())
    }

    /// Push the fluid under `cells` by `delta`
    ///
    /// Ignored unless running. The forcing magnitude used by the stability
    /// estimate becomes `|delta|`.
    ///
    /// # Errors
    ///
    /// Returns `CellOutOfBounds` for the first cell outside the interior
    pub fn drag(&mut self, cells: &[(usize, usize)], delta: Vec2) -> Result<()> {
        if !self.is_running() {
            debug!("Drag ignored while {:?}", self.state);
            return Ok(());
        }
        self.check_cells(cells)?;
        self.solver.set_forcing(delta.norm())?;
        for &(x, y) in cells {
            self.solver.add_velocity(x, y, delta)?;
        }
        Ok(())
    }

    /// Clear the forcing magnitude once a drag gesture ends
    pub fn end_drag(&mut self) {
        if let Err(e) = self.solver.set_forcing(0.0) {
            error!("Failed to clear forcing: {e}");
        }
    }

    fn check_cells(&self, cells: &[(usize, usize)]) -> Result<()> {
        let n = self.solver.geometry().resolution;
        match cells
            .iter()
            .find(|&&(x, y)| !self.starting_density.is_interior(x, y))
        {
            Some(&(x, y)) => Err(FluidSimError::CellOutOfBounds {
                x,
                y,
                resolution: n,
            }),
            None => Ok(()),
        }
    }

    /// # Errors
    ///
    /// See [`FluidSolver::set_params`]
    pub fn set_params(&mut self, params: SolverParams) -> Result<()> {
        self.solver.set_params(params)
    }

    /// # Errors
    ///
    /// See [`FluidSolver::set_params`]
    pub fn set_diffusion_rate(&mut self, diffusion_rate: f32) -> Result<()> {
        self.solver.set_diffusion_rate(diffusion_rate)
    }

    /// # Errors
    ///
    /// See [`FluidSolver::set_params`]
    pub fn set_minimum_steps_per_second(&mut self, steps: u32) -> Result<()> {
        self.solver.set_minimum_steps_per_second(steps)
    }

    /// # Errors
    ///
    /// See [`FluidSolver::set_params`]
    pub fn set_gauss_seidel_iterations(&mut self, iterations: usize) -> Result<()> {
        self.solver.set_gauss_seidel_iterations(iterations)
    }

    /// # Errors
    ///
    /// See [`FluidSolver::set_params`]
    pub fn set_cfl(&mut self, cfl: f32) -> Result<()> {
        self.solver.set_cfl(cfl)
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Whether the session has left the stopped state
    #[must_use]
    pub fn has_started(&self) -> bool {
        self.state != RunState::Stopped
    }

    /// Read-only access to the solver and its fields
    #[must_use]
    pub fn solver(&self) -> &FluidSolver {
        &self.solver
    }

    #[must_use]
    pub fn starting_density(&self) -> &GridField {
        &self.starting_density
    }

    #[must_use]
    pub fn stats(&self) -> &PerformanceStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> FluidSession {
        let geometry = GridGeometry::new(16, 16.0).unwrap();
        FluidSession::new(geometry, SolverParams::default()).unwrap()
    }

    #[test]
    fn test_toggle_cycle() {
        let mut session = session();
        assert_eq!(session.state(), RunState::Stopped);
        assert!(!session.has_started());

        session.toggle_start_pause();
        assert_eq!(session.state(), RunState::Running);
        session.toggle_start_pause();
        assert_eq!(session.state(), RunState::Paused);
        assert!(session.has_started());
        session.toggle_start_pause();
        assert_eq!(session.state(), RunState::Running);
    }

    #[test]
    fn test_paint_while_stopped_records_snapshot() {
        let mut session = session();
        session.paint_density(&[(4, 4), (5, 4)], DensityEdit::Fill).unwrap();
        assert_eq!(session.starting_density().get(4, 4), 1.0);
        assert_eq!(session.solver().density().get(5, 4), 1.0);

        session.start();
        session.paint_density(&[(8, 8)], DensityEdit::Fill).unwrap();
        assert_eq!(session.solver().density().get(8, 8), 1.0);
        assert_eq!(session.starting_density().get(8, 8), 0.0);
    }

    #[test]
    fn test_paint_rejects_before_writing() {
        let mut session = session();
        let result = session.paint_density(&[(2, 2), (17, 2)], DensityEdit::Fill);
        assert!(matches!(
            result,
            Err(FluidSimError::CellOutOfBounds { x: 17, .. })
        ));
        assert_eq!(session.solver().density().get(2, 2), 0.0);
    }

    #[test]
    fn test_drag_only_while_running() {
        let mut session = session();
        session.drag(&[(3, 3)], Vec2::new(2.0, 0.0)).unwrap();
        assert_eq!(session.solver().velocity_x().get(3, 3), 0.0);

        session.start();
        session.drag(&[(3, 3)], Vec2::new(3.0, 4.0)).unwrap();
        assert_eq!(session.solver().velocity_x().get(3, 3), 3.0);
        assert_eq!(session.solver().velocity_y().get(3, 3), 4.0);
        assert_eq!(session.solver().params().forcing, 5.0);

        session.end_drag();
        assert_eq!(session.solver().params().forcing, 0.0);
    }

    #[test]
    fn test_stop_restores_snapshot() {
        let mut session = session();
        session.paint_density(&[(6, 6)], DensityEdit::Fill).unwrap();
        session.start();
        session.paint_density(&[(6, 6)], DensityEdit::Erase).unwrap();
        session.drag(&[(6, 6)], Vec2::new(1.0, 0.0)).unwrap();

        session.stop();
        assert_eq!(session.state(), RunState::Stopped);
        assert_eq!(session.solver().density().get(6, 6), 1.0);
        assert_eq!(session.solver().max_speed(), 0.0);
    }

    #[test]
    fn test_reset_grid_keeps_velocity() {
        let mut session = session();
        session.paint_density(&[(6, 6)], DensityEdit::Fill).unwrap();
        session.start();
        session.drag(&[(2, 2)], Vec2::new(1.0, 0.0)).unwrap();

        session.reset_grid();
        assert_eq!(session.solver().total_density(), 0.0);
        assert_eq!(session.starting_density().interior_sum(), 0.0);
        assert_eq!(session.solver().velocity_x().get(2, 2), 1.0);
    }

    #[test]
    fn test_update_does_nothing_unless_running() {
        let mut session = session();
        session.paint_density(&[(8, 8)], DensityEdit::Fill).unwrap();
        let report = session.update(0.1).unwrap();
        assert_eq!(report.sub_steps, 0);
        assert_eq!(session.stats().steps_per_second(), 0);
    }

    #[test]
    fn test_step_rate_exceeded_pauses() {
        let geometry = GridGeometry::new(8, 0.08).unwrap();
        let mut session = FluidSession::new(geometry, SolverParams::default()).unwrap();
        session.set_cfl(1.0).unwrap();
        session.start();

        let err = session.update(0.02).unwrap_err();
        assert!(err.is_step_rate_exceeded());
        assert_eq!(session.state(), RunState::Paused);
    }

    #[test]
    fn test_restart_after_step_rate_exceeded() {
        let geometry = GridGeometry::new(64, 8.35).unwrap();
        let mut session = FluidSession::new(geometry, SolverParams::default()).unwrap();
        session.paint_density(&[(20, 32)], DensityEdit::Fill).unwrap();
        session.start();

        // Forcing alone lifts the estimate past cfl * cell * 500 after one sub-step
        session.drag(&[(32, 32)], Vec2::new(1.0e6, 0.0)).unwrap();
        let err = session.update(1.0 / 60.0).unwrap_err();
        assert!(err.is_step_rate_exceeded());
        assert_eq!(session.state(), RunState::Paused);

        session.stop();
        assert_eq!(session.solver().params().forcing, 0.0);
        assert_eq!(session.solver().max_speed(), 0.0);
        assert_eq!(session.solver().max_divergence(), 0.0);
        assert_eq!(
            session.solver().current_max_speed(),
            crate::solver::INITIAL_MAX_SPEED
        );

        session.start();
        let report = session.update(1.0 / 60.0).unwrap();
        assert!(report.sub_steps >= 1);
        assert_eq!(session.state(), RunState::Running);
        assert_eq!(session.solver().density().get(20, 32), 1.0);
    }

    #[test]
    fn test_resize_reallocates_snapshot() {
        let mut session = session();
        session.paint_density(&[(1, 1)], DensityEdit::Fill).unwrap();
        session.resize(32).unwrap();
        assert_eq!(session.starting_density().resolution(), 32);
        assert_eq!(session.solver().density().resolution(), 32);
        assert_eq!(session.solver().total_density(), 0.0);
        assert!(session.resize(0).is_err());
    }
}
