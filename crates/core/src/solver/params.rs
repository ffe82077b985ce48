//! Solver parameters and grid geometry
//!
//! Both are plain data, configurable at any time from the surrounding session
//! or UI layer. Parameter changes take effect on the next sub-step; geometry
//! changes reallocate every field.

use crate::error::{FluidSimError, Result};
use serde::{Deserialize, Serialize};

/// Hard ceiling on sub-steps per second
///
/// Exceeding it means the current cell size, CFL factor and velocity magnitude
/// cannot be stepped in real time.
pub const STEPS_PER_SECOND_LIMIT: u32 = 500;

/// Largest supported grid resolution (cells per axis)
pub const MAX_RESOLUTION: usize = 1024;

/// World-space side length of the grid used when none is given
pub const DEFAULT_WORLD_SIZE: f32 = 8.35;

/// Tunable solver parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    /// Diffusion rate applied to velocity and density (per second)
    pub diffusion_rate: f32,
    /// Lower bound on sub-steps per second; its inverse is the largest allowed step
    pub minimum_steps_per_second: u32,
    /// Gauss-Seidel sweeps for both diffusion and the pressure solve
    pub gauss_seidel_iterations: usize,
    /// CFL safety factor scaling the adaptive step
    pub cfl: f32,
    /// Magnitude of the external force applied this frame, used only to bias
    /// the stability estimate
    pub forcing: f32,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            diffusion_rate: 0.0,
            minimum_steps_per_second: 30,
            gauss_seidel_iterations: 20,
            cfl: 5.0,
            forcing: 0.0,
        }
    }
}

impl SolverParams {
    /// Largest allowed sub-step in seconds (`1 / minimum_steps_per_second`)
    #[must_use]
    pub fn max_time_step(&self) -> f32 {
        1.0 / self.minimum_steps_per_second as f32
    }

    /// Check every parameter against its domain
    ///
    /// # Errors
    ///
    /// Returns `FluidSimError::InvalidParameter` naming the first offending field
    pub fn validate(&self) -> Result<()> {
        if !self.diffusion_rate.is_finite() || self.diffusion_rate < 0.0 {
            return Err(FluidSimError::invalid_parameter(
                "diffusion_rate",
                self.diffusion_rate,
            ));
        }
        if self.minimum_steps_per_second == 0 {
            return Err(FluidSimError::invalid_parameter(
                "minimum_steps_per_second",
                0.0,
            ));
        }
        if !self.cfl.is_finite() || self.cfl <= 0.0 {
            return Err(FluidSimError::invalid_parameter("cfl", self.cfl));
        }
        if !self.forcing.is_finite() || self.forcing < 0.0 {
            return Err(FluidSimError::invalid_parameter("forcing", self.forcing));
        }
        Ok(())
    }
}

/// Grid resolution and world-space extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Interior cells per axis (`N`)
    pub resolution: usize,
    /// World-space side length of the whole grid
    pub world_size: f32,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            resolution: 64,
            world_size: DEFAULT_WORLD_SIZE,
        }
    }
}

impl GridGeometry {
    /// Create a validated geometry
    ///
    /// # Errors
    ///
    /// Returns `InvalidResolution` for a resolution of zero or above
    /// `MAX_RESOLUTION`, and `InvalidParameter` for a non-positive world size
    pub fn new(resolution: usize, world_size: f32) -> Result<Self> {
        let geometry = Self {
            resolution,
            world_size,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// World-space side length of one cell
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.world_size / self.resolution as f32
    }

    /// Same world extent at a different resolution
    ///
    /// # Errors
    ///
    /// See [`GridGeometry::new`]
    pub fn with_resolution(&self, resolution: usize) -> Result<Self> {
        Self::new(resolution, self.world_size)
    }

    /// Check resolution and world size
    ///
    /// # Errors
    ///
    /// See [`GridGeometry::new`]
    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 || self.resolution > MAX_RESOLUTION {
            return Err(FluidSimError::InvalidResolution {
                resolution: self.resolution,
                max: MAX_RESOLUTION,
            });
        }
        if !self.world_size.is_finite() || self.world_size <= 0.0 {
            return Err(FluidSimError::invalid_parameter(
                "world_size",
                self.world_size,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_params_are_valid() {
        let params = SolverParams::default();
        assert!(params.validate().is_ok());
        assert_relative_eq!(params.max_time_step(), 1.0 / 30.0);
    }

    #[test]
    fn test_rejects_bad_params() {
        let bad_cfl = SolverParams {
            cfl: 0.0,
            ..Default::default()
        };
        assert_eq!(
            bad_cfl.validate(),
            Err(FluidSimError::invalid_parameter("cfl", 0.0))
        );

        let bad_rate = SolverParams {
            diffusion_rate: f32::NAN,
            ..Default::default()
        };
        assert!(bad_rate.validate().is_err());

        let bad_steps = SolverParams {
            minimum_steps_per_second: 0,
            ..Default::default()
        };
        assert!(bad_steps.validate().is_err());

        let bad_forcing = SolverParams {
            forcing: -1.0,
            ..Default::default()
        };
        assert!(bad_forcing.validate().is_err());
    }

    #[test]
    fn test_zero_iterations_allowed() {
        let params = SolverParams {
            gauss_seidel_iterations: 0,
            ..Default::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_geometry_cell_size() {
        let geometry = GridGeometry::new(10, 5.0).unwrap();
        assert_relative_eq!(geometry.cell_size(), 0.5);

        let finer = geometry.with_resolution(20).unwrap();
        assert_relative_eq!(finer.cell_size(), 0.25);
        assert_eq!(finer.world_size, 5.0);
    }

    #[test]
    fn test_geometry_validation() {
        assert!(matches!(
            GridGeometry::new(0, 1.0),
            Err(FluidSimError::InvalidResolution { resolution: 0, .. })
        ));
        assert!(GridGeometry::new(MAX_RESOLUTION + 1, 1.0).is_err());
        assert!(GridGeometry::new(8, -1.0).is_err());
        assert!(GridGeometry::new(MAX_RESOLUTION, 1.0).is_ok());
    }
}
