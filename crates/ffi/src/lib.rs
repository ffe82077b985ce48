//! C ABI for the fluid simulation
//!
//! Exposes a [`fluid_sim_core::FluidSession`] to game engines and other hosts
//! as an opaque `FluidSimInstance`. Every function returns a
//! [`FluidSimErrorCode`]; details of the last failure on the calling thread are
//! available from `fluid_sim_get_last_error`.
//!
//! A header is generated into the workspace root by `build.rs`.

mod error;
mod helpers;
mod input;
mod instance;
mod queries;
mod session;

pub use error::{fluid_sim_get_last_error, fluid_sim_get_last_error_code, FluidSimErrorCode};
pub use input::{
    fluid_sim_drag, fluid_sim_end_drag, fluid_sim_paint_density, FluidCell, FluidDensityEdit,
};
pub use instance::{
    fluid_sim_default_config, fluid_sim_destroy, fluid_sim_new, FluidSimConfig, FluidSimInstance,
    FluidSimParams,
};
pub use queries::{
    fluid_sim_copy_field, fluid_sim_get_stats, FluidField, FluidRunState, FluidSimStats,
};
pub use session::{
    fluid_sim_get_params, fluid_sim_reset_grid, fluid_sim_resize, fluid_sim_set_params,
    fluid_sim_stop, fluid_sim_toggle_start_pause, fluid_sim_update,
};
