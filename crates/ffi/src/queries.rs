use fluid_sim_core::{FluidSession, RunState};
use std::ptr;

use crate::error::{DefaultFluidSimError, FluidSimErrorCode};
use crate::helpers::{handle_ffi_result, instance_from_ptr, track_error, with_session};
use crate::instance::FluidSimInstance;

/// Field selector for `fluid_sim_copy_field`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluidField {
    Density = 0,
    VelocityX = 1,
    VelocityY = 2,
}

/// C-compatible run state.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluidRunState {
    Stopped = 0,
    Running = 1,
    Paused = 2,
}

impl From<RunState> for FluidRunState {
    fn from(state: RunState) -> Self {
        match state {
            RunState::Stopped => Self::Stopped,
            RunState::Running => Self::Running,
            RunState::Paused => Self::Paused,
        }
    }
}

/// C-compatible snapshot of session statistics for a HUD.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidSimStats {
    /// Interior cells per axis (`N`); fields hold `(N + 2)²` values.
    pub resolution: u32,
    /// World-space side length of one cell.
    pub cell_size: f32,
    pub state: FluidRunState,
    /// Frames per second at the last refresh.
    pub fps: u32,
    /// Sub-steps per second at the last refresh, 0 unless running.
    pub steps_per_second: u32,
    /// Most recent sub-step length in seconds.
    pub time_step: f32,
    /// Sum of interior density.
    pub total_density: f32,
    /// Largest interior speed.
    pub max_speed: f32,
    /// Largest absolute interior divergence.
    pub max_divergence: f32,
}

impl FluidSimStats {
    fn capture(session: &FluidSession) -> Self {
        let solver = session.solver();
        let geometry = solver.geometry();
        Self {
            resolution: geometry.resolution as u32,
            cell_size: geometry.cell_size(),
            state: session.state().into(),
            fps: session.stats().fps(),
            steps_per_second: session.stats().steps_per_second(),
            time_step: solver.time_step(),
            total_density: solver.total_density(),
            max_speed: solver.max_speed(),
            max_divergence: solver.max_divergence(),
        }
    }
}

/// Copy a full field, ghost border included, into a caller-owned buffer.
///
/// Values are row-major: index `y * (N + 2) + x`. `out_len` always receives
/// the required length, so a host may call once with `capacity == 0` to size
/// its buffer.
///
/// Returns `FluidSimErrorCode::InvalidParameter` if `capacity` is too small;
/// nothing is copied in that case.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
/// - `out_values` must point to `capacity` writable `f32` values (may be null
///   when `capacity` is 0).
/// - `out_len` must be a valid, non-null pointer.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_copy_field(
    ptr: *const FluidSimInstance,
    field: FluidField,
    out_values: *mut f32,
    capacity: usize,
    out_len: *mut usize,
) -> FluidSimErrorCode {
    if out_len.is_null() {
        return track_error(&DefaultFluidSimError::null_pointer("out_len"));
    }

    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session(instance, |session| {
            let solver = session.solver();
            let source = match field {
                FluidField::Density => solver.density(),
                FluidField::VelocityX => solver.velocity_x(),
                FluidField::VelocityY => solver.velocity_y(),
            }
            .as_slice();

            unsafe {
                *out_len = source.len();
            }
            if capacity < source.len() {
                return Err(DefaultFluidSimError::invalid_parameter(format!(
                    "Buffer holds {capacity} values, field needs {}",
                    source.len()
                )));
            }
            if out_values.is_null() {
                return Err(DefaultFluidSimError::null_pointer("out_values"));
            }
            // SAFETY: caller guarantees `capacity` writable values; `source.len() <= capacity`.
            unsafe {
                ptr::copy_nonoverlapping(source.as_ptr(), out_values, source.len());
            }
            Ok(())
        })?
    })
}

/// Fill `out_stats` with the current session statistics.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
/// - `out_stats` must be a valid, non-null pointer to writable memory.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_get_stats(
    ptr: *const FluidSimInstance,
    out_stats: *mut FluidSimStats,
) -> FluidSimErrorCode {
    if out_stats.is_null() {
        return track_error(&DefaultFluidSimError::null_pointer("out_stats"));
    }

    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let stats = with_session(instance, FluidSimStats::capture)?;
        unsafe {
            *out_stats = stats;
        }
        Ok(())
    })
}
