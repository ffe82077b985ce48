use fluid_sim_core::{DensityEdit, Vec2};

use crate::error::FluidSimErrorCode;
use crate::helpers::{cells_from_raw, handle_ffi_result, instance_from_ptr, with_session_mut};
use crate::instance::FluidSimInstance;

/// Interior grid cell addressed by column `x` and row `y`, both in `1..=N`.
///
/// Hosts compute these from their own brush geometry.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FluidCell {
    pub x: u32,
    pub y: u32,
}

/// Density written by a paint gesture.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FluidDensityEdit {
    /// Set density to 1.
    Fill = 0,
    /// Set density to 0.
    Erase = 1,
}

impl From<FluidDensityEdit> for DensityEdit {
    fn from(edit: FluidDensityEdit) -> Self {
        match edit {
            FluidDensityEdit::Fill => Self::Fill,
            FluidDensityEdit::Erase => Self::Erase,
        }
    }
}

/// Paint density onto `count` cells.
///
/// While the session is stopped the starting density is written as well.
/// Nothing is written if any cell lies outside the interior.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
/// - `cells` must point to `count` readable `FluidCell` values (may be null when `count` is 0).
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_paint_density(
    ptr: *const FluidSimInstance,
    cells: *const FluidCell,
    count: usize,
    edit: FluidDensityEdit,
) -> FluidSimErrorCode {
    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let cells = unsafe { cells_from_raw(cells, count) }?;
        with_session_mut(instance, |session| session.paint_density(&cells, edit.into()))??;
        Ok(())
    })
}

/// Add the velocity `(dx, dy)` to `count` cells of a running session.
///
/// Sets the forcing magnitude to `|(dx, dy)|`. Ignored unless running.
///
/// # Safety
/// - `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
/// - `cells` must point to `count` readable `FluidCell` values (may be null when `count` is 0).
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_drag(
    ptr: *const FluidSimInstance,
    cells: *const FluidCell,
    count: usize,
    dx: f32,
    dy: f32,
) -> FluidSimErrorCode {
    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let cells = unsafe { cells_from_raw(cells, count) }?;
        with_session_mut(instance, |session| session.drag(&cells, Vec2::new(dx, dy)))??;
        Ok(())
    })
}

/// Reset the forcing magnitude once the host's drag gesture ends.
///
/// # Safety
/// `ptr` must be null or a valid pointer returned by `fluid_sim_new`.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_end_drag(ptr: *const FluidSimInstance) -> FluidSimErrorCode {
    handle_ffi_result(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session_mut(instance, fluid_sim_core::FluidSession::end_drag)
    })
}
