//! Interactive session layer around the fluid solver
//!
//! Adds the lifecycle a viewer needs on top of [`crate::solver::FluidSolver`]:
//! run state, a starting-density snapshot restored on stop, brush-style
//! injection over many cells, and frame/step rate counters.

mod session;

pub use session::{FluidSession, RunState};
