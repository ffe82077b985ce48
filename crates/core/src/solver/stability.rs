//! Adaptive sub-stepping
//!
//! Wall-clock time handed to the solver each frame is accumulated and spent in
//! sub-steps whose length follows a CFL-style bound:
//!
//! ```text
//! dt = min(cfl · cell_size / max_speed, 1 / minimum_steps_per_second)
//! ```
//!
//! After every sub-step the maximum speed is re-measured and inflated by
//! `sqrt(cell_size · forcing)` so a force injected by the user is accounted for
//! before it shows up in the velocity field.

use super::fields::GridField;
use super::params::STEPS_PER_SECOND_LIMIT;
use crate::error::{FluidSimError, Result};
use tracing::debug;

/// Maximum speed assumed before the first sub-step has been measured
pub const INITIAL_MAX_SPEED: f32 = 100.0;

/// Smallest speed used as the CFL denominator
pub const MIN_SPEED_FLOOR: f32 = 1e-6;

/// Largest interior speed `sqrt(vx² + vy²)` of a velocity field
#[must_use]
pub fn max_speed(velocity_x: &GridField, velocity_y: &GridField) -> f32 {
    let max_squared = velocity_x
        .interior()
        .zip(velocity_y.interior())
        .fold(0.0_f32, |acc, ((_, _, vx), (_, _, vy))| {
            acc.max(vx * vx + vy * vy)
        });
    max_squared.sqrt()
}

/// Time accumulator and adaptive step size
#[derive(Debug, Clone)]
pub struct StabilityController {
    /// Upper bound on the step (`1 / minimum_steps_per_second`)
    max_time_step: f32,
    /// Speed estimate driving the CFL bound
    current_max_speed: f32,
    /// Wall-clock time not yet simulated; may go slightly negative after overshoot
    accumulated: f32,
    /// Most recently planned step
    time_step: f32,
}

impl StabilityController {
    /// Create a controller with an empty accumulator
    #[must_use]
    pub fn new(max_time_step: f32) -> Self {
        Self {
            max_time_step,
            current_max_speed: INITIAL_MAX_SPEED,
            accumulated: 0.0,
            time_step: max_time_step,
        }
    }

    /// Change the step upper bound, effective from the next planned step
    pub fn set_max_time_step(&mut self, max_time_step: f32) {
        self.max_time_step = max_time_step;
    }

    /// Forget accumulated time and the speed estimate
    pub fn reset(&mut self) {
        self.current_max_speed = INITIAL_MAX_SPEED;
        self.accumulated = 0.0;
        self.time_step = self.max_time_step;
    }

    /// CFL step before clamping to the configured maximum
    #[must_use]
    pub fn unclamped_time_step(&self, cfl: f32, cell_size: f32) -> f32 {
        let speed = self.current_max_speed.max(MIN_SPEED_FLOOR);
        cfl * (cell_size / speed)
    }

    /// CFL step clamped from above to the configured maximum
    ///
    /// Only the upper bound is enforced; the speed floor keeps the result finite.
    #[must_use]
    pub fn clamped_time_step(&self, cfl: f32, cell_size: f32) -> f32 {
        self.unclamped_time_step(cfl, cell_size)
            .min(self.max_time_step)
    }

    /// Choose the next sub-step length
    ///
    /// # Errors
    ///
    /// Returns `FluidSimError::StepRateExceeded` if the step implies more than
    /// `STEPS_PER_SECOND_LIMIT` sub-steps per second. Nothing is advanced in
    /// that case.
    pub fn plan_step(&mut self, cfl: f32, cell_size: f32) -> Result<f32> {
        if self.current_max_speed < MIN_SPEED_FLOOR {
            debug!(
                "Max speed {:.3e} below floor, step clamps to {:.4}s",
                self.current_max_speed, self.max_time_step
            );
        }

        let dt = self.clamped_time_step(cfl, cell_size);
        let required = 1.0 / dt;
        if !required.is_finite() || required > STEPS_PER_SECOND_LIMIT as f32 {
            return Err(FluidSimError::StepRateExceeded {
                required,
                limit: STEPS_PER_SECOND_LIMIT,
            });
        }

        self.time_step = dt;
        Ok(dt)
    }

    /// Add a frame's elapsed wall-clock time to the accumulator
    pub fn accumulate(&mut self, elapsed: f32) {
        self.accumulated += elapsed;
    }

    /// Whether unspent time remains
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.accumulated > 0.0
    }

    /// Remove one completed sub-step from the accumulator
    pub fn spend(&mut self, dt: f32) {
        self.accumulated -= dt;
    }

    /// Drop unspent time without simulating it
    pub fn discard_pending(&mut self) {
        self.accumulated = 0.0;
    }

    /// Re-measure the speed estimate after a sub-step
    pub fn record_max_speed(
        &mut self,
        velocity_x: &GridField,
        velocity_y: &GridField,
        cell_size: f32,
        forcing: f32,
    ) {
        self.current_max_speed =
            max_speed(velocity_x, velocity_y) + (cell_size * forcing).sqrt();
    }

    /// Most recently planned step in seconds
    #[must_use]
    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    /// Current speed estimate
    #[must_use]
    pub fn current_max_speed(&self) -> f32 {
        self.current_max_speed
    }

    /// Unspent wall-clock time
    #[must_use]
    pub fn accumulated(&self) -> f32 {
        self.accumulated
    }
}
