//! Grid-based incompressible fluid solver
//!
//! Implements the Stable Fluids scheme on a square grid of `N × N` interior
//! cells surrounded by a one-cell ghost border. Every stage is a function from
//! input fields to a new field:
//!
//! - [`diffuse`]: implicit diffusion by fixed-iteration Gauss-Seidel
//! - [`project`]: pressure projection removing divergence
//! - [`advect`]: semi-Lagrangian transport with bilinear sampling
//! - [`enforce_boundary`]: free-slip walls on the ghost border
//!
//! [`FluidSolver`] owns the live fields and sequences the stages per sub-step,
//! with [`StabilityController`] choosing the sub-step length.
//!
//! # Example
//!
//! ```rust
//! use fluid_sim_core::solver::{DensityEdit, FluidSolver, GridGeometry, SolverParams};
//!
//! let mut solver = FluidSolver::new(GridGeometry::default(), SolverParams::default())?;
//! solver.set_density(32, 32, DensityEdit::Fill)?;
//! let report = solver.step_frame(1.0 / 60.0)?;
//! assert!(report.sub_steps >= 1);
//! # Ok::<(), fluid_sim_core::FluidSimError>(())
//! ```

mod advection;
mod boundary;
mod diffusion;
mod fields;
mod fluid;
mod params;
mod profiler;
mod projection;
mod quality;
mod stability;

// Re-exports
pub use advection::{advect, sample_bilinear, trace_origin};
pub use boundary::{enforce_boundary, BoundaryKind};
pub use diffusion::diffuse;
pub use fields::GridField;
pub use fluid::{DensityEdit, FluidSolver, FrameReport};
pub use params::{
    GridGeometry, SolverParams, DEFAULT_WORLD_SIZE, MAX_RESOLUTION, STEPS_PER_SECOND_LIMIT,
};
pub use profiler::{PerformanceStats, ProfilerScope, PERFORMANCE_UPDATE_INTERVAL};
pub use projection::{divergence, project, solve_pressure};
pub use quality::QualityPreset;
pub use stability::{max_speed, StabilityController, INITIAL_MAX_SPEED, MIN_SPEED_FLOOR};
