//! Fluid Simulation Core Library
//!
//! A real-time 2D incompressible fluid solver in the Stable Fluids family:
//! implicit diffusion and pressure projection by fixed-iteration Gauss-Seidel,
//! semi-Lagrangian advection with bilinear sampling, and free-slip walls on a
//! ghost border. Sub-steps are sized adaptively from a CFL bound on the current
//! maximum speed.
//!
//! ## Layout
//!
//! - [`solver`]: grid fields and the numerical stages, plus the orchestrator
//! - [`simulation`]: start/pause/stop session around a solver
//! - [`error`]: error taxonomy shared by both

// Core types and utilities
pub mod core_types;

pub mod error;
pub mod simulation;
pub mod solver;

// Re-export core types
pub use core_types::Vec2;
pub use error::{FluidSimError, Result};

// Re-export solver and session types
pub use simulation::{FluidSession, RunState};
pub use solver::{
    BoundaryKind, DensityEdit, FluidSolver, FrameReport, GridField, GridGeometry,
    PerformanceStats, QualityPreset, SolverParams,
};
