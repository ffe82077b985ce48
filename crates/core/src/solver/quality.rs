//! Quality presets for grid resolution
//!
//! Each preset pairs a grid resolution with a Gauss-Seidel iteration count.
//! Finer grids need more sweeps for the relaxation to reach across the same
//! physical distance, so the two scale together.

use super::params::{GridGeometry, SolverParams};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Quality preset determining grid resolution and relaxation effort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityPreset {
    /// 256×256 cells, 40 sweeps
    Ultra,
    /// 128×128 cells, 30 sweeps
    High,
    /// 64×64 cells, 20 sweeps
    Medium,
    /// 32×32 cells, 10 sweeps
    Low,
}

impl QualityPreset {
    /// Interior cells per axis for this preset
    #[must_use]
    pub const fn resolution(&self) -> usize {
        match self {
            Self::Ultra => 256,
            Self::High => 128,
            Self::Medium => 64,
            Self::Low => 32,
        }
    }

    /// Gauss-Seidel sweeps for this preset
    #[must_use]
    pub const fn gauss_seidel_iterations(&self) -> usize {
        match self {
            Self::Ultra => 40,
            Self::High => 30,
            Self::Medium => 20,
            Self::Low => 10,
        }
    }

    /// Geometry spanning `world_size` at this preset's resolution
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `world_size` is not finite and positive
    pub fn geometry(&self, world_size: f32) -> Result<GridGeometry> {
        GridGeometry::new(self.resolution(), world_size)
    }

    /// Apply this preset's iteration count to `params`
    #[must_use]
    pub fn apply(&self, params: SolverParams) -> SolverParams {
        SolverParams {
            gauss_seidel_iterations: self.gauss_seidel_iterations(),
            ..params
        }
    }

    /// Recommended preset for interactive use
    #[must_use]
    pub fn recommended() -> Self {
        Self::Medium
    }
}

impl std::str::FromStr for QualityPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ultra" => Ok(Self::Ultra),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!(
                "unknown quality preset '{other}' (expected low, medium, high or ultra)"
            )),
        }
    }
}
