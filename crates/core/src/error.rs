//! Error taxonomy for the fluid solver
//!
//! Everything the solver can reject at runtime is a configuration problem: a
//! parameter outside its domain, a cell outside the interior, or a time step so
//! small that real-time stepping is impossible. Boundary kinds are a closed enum,
//! so an invalid kind cannot reach the solver at all.

use thiserror::Error;

/// Errors reported by the solver and the session controller
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FluidSimError {
    /// The adaptive step requires more sub-steps per second than the solver allows.
    ///
    /// The solver stops advancing before the offending sub-step starts.
    #[error(
        "required sub-step rate of {required:.1} steps/s exceeds the limit of {limit} steps/s"
    )]
    StepRateExceeded {
        /// Steps per second implied by the current time step
        required: f32,
        /// Hard implementation ceiling
        limit: u32,
    },

    /// A parameter is non-finite or outside its allowed range
    #[error("parameter '{name}' must be finite and positive, got {value}")]
    InvalidParameter {
        /// Parameter name as exposed in `SolverParams`
        name: &'static str,
        /// Offending value
        value: f32,
    },

    /// Grid resolution is zero or above the supported maximum
    #[error("grid resolution {resolution} is outside 1..={max}")]
    InvalidResolution {
        /// Requested cells per axis
        resolution: usize,
        /// Largest supported resolution
        max: usize,
    },

    /// Injection targeted a cell outside the interior `1..=N`
    #[error("cell ({x}, {y}) is outside the interior 1..={resolution}")]
    CellOutOfBounds {
        /// Column index
        x: usize,
        /// Row index
        y: usize,
        /// Interior cells per axis
        resolution: usize,
    },

    /// A field of a different resolution was handed to the solver
    #[error("field resolution {actual} does not match solver resolution {expected}")]
    DimensionMismatch {
        /// Resolution of the solver's live fields
        expected: usize,
        /// Resolution of the field that was passed in
        actual: usize,
    },
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, FluidSimError>;

impl FluidSimError {
    /// Build an `InvalidParameter` error for a float parameter
    pub(crate) fn invalid_parameter(name: &'static str, value: f32) -> Self {
        Self::InvalidParameter { name, value }
    }

    /// Whether this error is the fatal step-rate condition
    #[must_use]
    pub fn is_step_rate_exceeded(&self) -> bool {
        matches!(self, Self::StepRateExceeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_rate_message() {
        let err = FluidSimError::StepRateExceeded {
            required: 812.5,
            limit: 500,
        };
        assert_eq!(
            err.to_string(),
            "required sub-step rate of 812.5 steps/s exceeds the limit of 500 steps/s"
        );
        assert!(err.is_step_rate_exceeded());
    }

    #[test]
    fn test_invalid_parameter_message() {
        let err = FluidSimError::invalid_parameter("cfl", -1.0);
        assert_eq!(
            err.to_string(),
            "parameter 'cfl' must be finite and positive, got -1"
        );
        assert!(!err.is_step_rate_exceeded());
    }
}
