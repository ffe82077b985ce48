use fluid_sim_core::{FluidSession, GridGeometry, SolverParams};
use std::ptr;
use std::sync::RwLock;
use tracing::info;

use crate::error::{DefaultFluidSimError, FluidSimErrorCode};
use crate::helpers::track_result;

/// C-compatible solver parameters.
///
/// The forcing magnitude is not part of this struct; it follows drag gestures.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidSimParams {
    /// Diffusion rate applied to velocity and density (per second).
    pub diffusion_rate: f32,
    /// Lower bound on sub-steps per second; sets the largest allowed step.
    pub minimum_steps_per_second: u32,
    /// Gauss-Seidel sweeps for diffusion and the pressure solve.
    pub gauss_seidel_iterations: u32,
    /// CFL safety factor scaling the adaptive step.
    pub cfl: f32,
}

impl FluidSimParams {
    /// Apply these values on top of `base`, keeping its forcing magnitude.
    pub(crate) fn to_solver(self, base: SolverParams) -> SolverParams {
        SolverParams {
            diffusion_rate: self.diffusion_rate,
            minimum_steps_per_second: self.minimum_steps_per_second,
            gauss_seidel_iterations: self.gauss_seidel_iterations as usize,
            cfl: self.cfl,
            ..base
        }
    }
}

impl From<SolverParams> for FluidSimParams {
    fn from(params: SolverParams) -> Self {
        Self {
            diffusion_rate: params.diffusion_rate,
            minimum_steps_per_second: params.minimum_steps_per_second,
            gauss_seidel_iterations: params.gauss_seidel_iterations as u32,
            cfl: params.cfl,
        }
    }
}

/// C-compatible creation settings.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidSimConfig {
    /// Interior cells per axis.
    pub resolution: u32,
    /// World-space side length of the grid.
    pub world_size: f32,
    /// Initial solver parameters.
    pub params: FluidSimParams,
}

/// Default creation settings: 64×64 cells over 8.35 world units.
#[no_mangle]
pub extern "C" fn fluid_sim_default_config() -> FluidSimConfig {
    let geometry = GridGeometry::default();
    FluidSimConfig {
        resolution: geometry.resolution as u32,
        world_size: geometry.world_size,
        params: SolverParams::default().into(),
    }
}

/// The fluid simulation context handed to the host.
///
/// # Thread Safety
/// The session is protected by an `RwLock`: queries take a shared read lock,
/// updates and edits the exclusive write lock. The solver itself never runs
/// concurrently with an edit.
pub struct FluidSimInstance {
    pub(crate) session: RwLock<FluidSession>,
}

impl FluidSimInstance {
    /// Creates a new stopped session from `config`.
    ///
    /// # Errors
    ///
    /// Returns the mapped solver error if the geometry or parameters are invalid.
    pub(crate) fn new(config: &FluidSimConfig) -> Result<Box<Self>, DefaultFluidSimError> {
        let geometry = GridGeometry::new(config.resolution as usize, config.world_size)?;
        let params = config.params.to_solver(SolverParams::default());
        let session = FluidSession::new(geometry, params)?;

        info!(
            "FFI instance created: {}x{} cells",
            geometry.resolution, geometry.resolution
        );

        Ok(Box::new(Self {
            session: RwLock::new(session),
        }))
    }
}

/// Create a new instance and return it via out-parameter.
///
/// Returns
/// - `FluidSimErrorCode::Ok` (0): success, `out_instance` holds a valid pointer
/// - `FluidSimErrorCode::NullPointer`: `out_instance` is null
/// - `FluidSimErrorCode::InvalidResolution` / `InvalidParameter`: bad `config`
///
/// On failure `out_instance` is set to null; call `fluid_sim_get_last_error()`
/// for a description.
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - The caller owns the returned instance and MUST call `fluid_sim_destroy`
///   exactly once.
///
/// Example (C)
/// ```c
/// FluidSimInstance* sim = NULL;
/// FluidSimErrorCode err = fluid_sim_new(fluid_sim_default_config(), &sim);
/// if (err != Ok) {
///     fprintf(stderr, "Failed to create simulation: %s\n", fluid_sim_get_last_error());
///     return;
/// }
/// // ... use sim ...
/// fluid_sim_destroy(sim);
/// ```
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_new(
    config: FluidSimConfig,
    out_instance: *mut *mut FluidSimInstance,
) -> FluidSimErrorCode {
    if out_instance.is_null() {
        return crate::helpers::track_error(&DefaultFluidSimError::null_pointer("out_instance"));
    }

    match track_result(FluidSimInstance::new(&config)) {
        Ok(instance) => {
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            FluidSimErrorCode::Ok
        }
        Err(code) => {
            unsafe {
                *out_instance = ptr::null_mut();
            }
            code
        }
    }
}

/// Destroys an instance previously created by `fluid_sim_new`.
///
/// A null `ptr` is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `fluid_sim_new` and not freed already.
/// - The caller must not use the pointer again afterwards.
#[no_mangle]
pub unsafe extern "C" fn fluid_sim_destroy(ptr: *mut FluidSimInstance) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: created by `Box::into_raw` in `fluid_sim_new` and not yet freed.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}
