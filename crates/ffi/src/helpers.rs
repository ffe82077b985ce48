use crate::error::{with_last_error_mut, DefaultFluidSimError, FfiError, FluidSimErrorCode};
use crate::instance::FluidSimInstance;
use crate::input::FluidCell;
use fluid_sim_core::FluidSession;
use std::ffi::CString;
use std::slice;
use tracing::warn;

/// Set the thread-local error message and code.
/// Accepts any type implementing `FfiError`.
pub(crate) fn set_last_error(error: &impl FfiError) {
    warn!("FFI call failed: {}", error.msg());
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl FfiError) -> FluidSimErrorCode {
    set_last_error(error);
    error.code()
}

/// Map a result onto an error code, recording failures and clearing the
/// last error on success.
pub(crate) fn track_result<T>(
    result: Result<T, DefaultFluidSimError>,
) -> Result<T, FluidSimErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(e) => Err(track_error(&e)),
    }
}

/// Run an FFI body and collapse its result into the code returned across the boundary.
pub(crate) fn handle_ffi_result<F>(body: F) -> FluidSimErrorCode
where
    F: FnOnce() -> Result<(), DefaultFluidSimError>,
{
    match track_result(body()) {
        Ok(()) => FluidSimErrorCode::Ok,
        Err(code) => code,
    }
}

/// Clear the thread-local error message and code.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = FluidSimErrorCode::Ok;
    });
}

/// Borrow the instance behind a raw pointer.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `fluid_sim_new`.
pub(crate) unsafe fn instance_from_ptr<'a>(
    ptr: *const FluidSimInstance,
) -> Result<&'a FluidSimInstance, DefaultFluidSimError> {
    if ptr.is_null() {
        return Err(DefaultFluidSimError::null_pointer("ptr"));
    }
    Ok(unsafe { &*ptr })
}

/// Run `func` with a shared read lock on the session.
pub(crate) fn with_session<F, T>(
    instance: &FluidSimInstance,
    func: F,
) -> Result<T, DefaultFluidSimError>
where
    F: FnOnce(&FluidSession) -> T,
{
    let session = instance
        .session
        .read()
        .map_err(|_| DefaultFluidSimError::lock_poisoned("RwLock"))?;
    Ok(func(&session))
}

/// Run `func` with the exclusive write lock on the session.
pub(crate) fn with_session_mut<F, T>(
    instance: &FluidSimInstance,
    func: F,
) -> Result<T, DefaultFluidSimError>
where
    F: FnOnce(&mut FluidSession) -> T,
{
    let mut session = instance
        .session
        .write()
        .map_err(|_| DefaultFluidSimError::lock_poisoned("RwLock"))?;
    Ok(func(&mut session))
}

/// Copy a caller-owned cell array into grid coordinates.
///
/// # Safety
/// `cells` must point to `count` readable `FluidCell` values, or be null with `count == 0`.
pub(crate) unsafe fn cells_from_raw(
    cells: *const FluidCell,
    count: usize,
) -> Result<Vec<(usize, usize)>, DefaultFluidSimError> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if cells.is_null() {
        return Err(DefaultFluidSimError::null_pointer("cells"));
    }
    let raw = unsafe { slice::from_raw_parts(cells, count) };
    Ok(raw
        .iter()
        .map(|cell| (cell.x as usize, cell.y as usize))
        .collect())
}
