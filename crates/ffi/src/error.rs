use fluid_sim_core::FluidSimError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
pub(crate) trait FfiError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> FluidSimErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `FfiError` for FFI-side failures and solver errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultFluidSimError {
    code: FluidSimErrorCode,
    msg: String,
}

impl DefaultFluidSimError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`, `"ptr"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: FluidSimErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for poisoned lock.
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: FluidSimErrorCode::LockPoisoned,
            msg: format!("Lock '{lock_name}' was poisoned by a panic in another thread"),
        }
    }

    /// Create error for invalid parameter.
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: FluidSimErrorCode::InvalidParameter,
            msg: message,
        }
    }
}

impl FfiError for DefaultFluidSimError {
    fn code(&self) -> FluidSimErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

impl From<FluidSimError> for DefaultFluidSimError {
    fn from(error: FluidSimError) -> Self {
        Self {
            code: FluidSimErrorCode::from(&error),
            msg: error.to_string(),
        }
    }
}

/// FFI error codes returned by fluid simulation functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluidSimErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Lock poisoned: internal synchronization primitive was poisoned by a panic.
    LockPoisoned = 2,

    /// Invalid parameter passed to function (non-finite, non-positive, or too small a buffer).
    InvalidParameter = 3,

    /// Grid resolution is zero or above the supported maximum.
    InvalidResolution = 4,

    /// A cell coordinate lies outside the interior `1..=N`.
    CellOutOfBounds = 5,

    /// The adaptive sub-step needs more steps per second than allowed; the session paused.
    StepRateExceeded = 6,

    /// A field of the wrong resolution was supplied.
    DimensionMismatch = 7,
}

impl From<&FluidSimError> for FluidSimErrorCode {
    fn from(error: &FluidSimError) -> Self {
        match error {
            FluidSimError::StepRateExceeded { .. } => Self::StepRateExceeded,
            FluidSimError::InvalidParameter { .. } => Self::InvalidParameter,
            FluidSimError::InvalidResolution { .. } => Self::InvalidResolution,
            FluidSimError::CellOutOfBounds { .. } => Self::CellOutOfBounds,
            FluidSimError::DimensionMismatch { .. } => Self::DimensionMismatch,
        }
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The `CString` is owned here so the pointer handed out stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, FluidSimErrorCode)> = const { RefCell::new((None, FluidSimErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, FluidSimErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, FluidSimErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if the last call on this thread failed.
/// - `null` if the last call succeeded.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```c
/// FluidSimErrorCode err = fluid_sim_update(sim, dt);
/// if (err == StepRateExceeded) {
///     const char* error = fluid_sim_get_last_error();
///     if (error) {
///         printf("Simulation paused: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn fluid_sim_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code for this thread.
///
/// Returns `FluidSimErrorCode::Ok` (0) if the last call succeeded.
#[no_mangle]
pub extern "C" fn fluid_sim_get_last_error_code() -> FluidSimErrorCode {
    with_last_error(|(_cstring, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_codes() {
        let err = FluidSimError::CellOutOfBounds {
            x: 0,
            y: 3,
            resolution: 8,
        };
        assert_eq!(FluidSimErrorCode::from(&err), FluidSimErrorCode::CellOutOfBounds);

        let wrapped = DefaultFluidSimError::from(FluidSimError::StepRateExceeded {
            required: 800.0,
            limit: 500,
        });
        assert_eq!(wrapped.code(), FluidSimErrorCode::StepRateExceeded);
        assert!(wrapped.msg().contains("500"));
    }

    #[test]
    fn test_null_pointer_message() {
        let err = DefaultFluidSimError::null_pointer("out_instance");
        assert_eq!(err.code(), FluidSimErrorCode::NullPointer);
        assert_eq!(err.msg(), "Parameter 'out_instance' cannot be null");
    }
}
