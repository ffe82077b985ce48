/// Performance profiling helpers for tracking simulation timing.
///
/// Provides an RAII profiling scope and the frame/step rate counters shown on a HUD.
use std::time::Instant;
use tracing::trace;

/// Wall-clock seconds between refreshes of [`PerformanceStats`]
pub const PERFORMANCE_UPDATE_INTERVAL: f32 = 0.2;

/// A profiling scope that measures elapsed time using RAII.
///
/// The elapsed time is reported through `trace!` when dropped.
pub struct ProfilerScope {
    start: Instant,
    name: &'static str,
}

impl ProfilerScope {
    /// Creates a new profiling scope.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Gets elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        trace!(scope = self.name, elapsed_ms = self.elapsed_ms(), "Profiler scope");
    }
}

/// Frames per second and simulation steps per second, refreshed periodically
#[derive(Debug, Clone)]
pub struct PerformanceStats {
    update_interval: f32,
    time_waited: f32,
    fps: u32,
    steps_per_second: u32,
}

impl PerformanceStats {
    /// Creates counters refreshed every `update_interval` seconds.
    #[must_use]
    pub fn new(update_interval: f32) -> Self {
        Self {
            update_interval,
            time_waited: 0.0,
            fps: 0,
            steps_per_second: 0,
        }
    }

    /// Records one rendered frame.
    ///
    /// # Arguments
    ///
    /// * `frame_dt` - Wall-clock duration of the frame in seconds
    /// * `time_step` - Current solver sub-step length in seconds
    /// * `running` - Whether the simulation advanced this frame
    pub fn record_frame(&mut self, frame_dt: f32, time_step: f32, running: bool) {
        self.time_waited += frame_dt;

        if self.time_waited >= self.update_interval {
            self.fps = rate_of(frame_dt);
            self.steps_per_second = rate_of(time_step);
            self.time_waited = 0.0;
        }

        if !running {
            self.steps_per_second = 0;
        }
    }

    /// Frames per second at the last refresh
    #[must_use]
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Simulation sub-steps per second at the last refresh, 0 while not running
    #[must_use]
    pub fn steps_per_second(&self) -> u32 {
        self.steps_per_second
    }
}

impl Default for PerformanceStats {
    fn default() -> Self {
        Self::new(PERFORMANCE_UPDATE_INTERVAL)
    }
}

fn rate_of(period: f32) -> u32 {
    if period > 0.0 && period.is_finite() {
        (1.0 / period).round() as u32
    } else {
        0
    }
}
