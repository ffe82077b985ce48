use crate::error::{DefaultFluidSimError, FluidSimErrorCode};
use crate::helpers::{
    handle_ffi_result, instance_from_ptr, track_error, with_session, with_session_mut,
};
use crate::instance::{FluidSimInstance, FluidSimParams};
use fluid_sim_core::FluidSession;

/// Per-frame entry point: advance a running session by `frame_dt` seconds.
///
/// Thread-safe: acquires the `RwLock` write lock for the update.
///
/// Returns `FluidSimErrorCode::StepRateExceeded` when the adaptive step
/// collapsed below the allowed rate; the session is paused in that case.
///
/// # Safety
/// `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_update(
    ptr: *const FluidSimInstance,
    frame_dt: f32,
) -> FluidSimErrorCode {
    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session_mut(instance, |session| session.update(frame_dt))??;
        Ok(())
    })
}

/// Start a stopped session, otherwise toggle between running and paused.
///
/// # Safety
/// `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_toggle_start_pause(
    ptr: *const FluidSimInstance,
) -> FluidSimErrorCode {
    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session_mut(instance, FluidSession::toggle_start_pause)
    })
}

/// Stop the session, restoring the starting density and clearing velocity.
///
/// # Safety
/// `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_stop(ptr: *const FluidSimInstance) -> FluidSimErrorCode {
    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session_mut(instance, FluidSession::stop)
    })
}

/// Zero the starting and live density. Velocity is kept.
///
/// # Safety
/// `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_reset_grid(ptr: *const FluidSimInstance) -> FluidSimErrorCode {
    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session_mut(instance, FluidSession::reset_grid)
    })
}

/// Reallocate every field at `resolution` cells per axis. All values are discarded.
///
/// # Safety
/// `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_resize(
    ptr: *const FluidSimInstance,
    resolution: u32,
) -> FluidSimErrorCode {
    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session_mut(instance, |session| session.resize(resolution as usize))??;
        Ok(())
    })
}

/// Replace the solver parameters; effective from the next sub-step.
///
/// Invalid values leave the current parameters untouched.
///
/// # Safety
/// `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_set_params(
    ptr: *const FluidSimInstance,
    params: FluidSimParams,
) -> FluidSimErrorCode {
    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session_mut(instance, |session| {
            let merged = params.to_solver(session.solver().params());
            session.set_params(merged)
        })??;
        Ok(())
    })
}

/// Read the current solver parameters into `out_params`.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
/// - `out_params` must be null or point to writable memory for one `FluidSimParams`.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_get_params(
    ptr: *const FluidSimInstance,
    out_params: *mut FluidSimParams,
) -> FluidSimErrorCode {
    if out_params.is_null() {
        return track_error(&DefaultFluidSimError::null_pointer("out_params"));
    }

    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let params = with_session(instance, |session| session.solver().params())?;
        unsafe {
            *out_params = params.into();
        }
        Ok(())
    })
}
