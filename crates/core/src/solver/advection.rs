//! Semi-Lagrangian advection
//!
//! Each interior cell traces backward along the velocity field to the point its
//! contents came from and bilinearly samples the source field there. The trace
//! origin is clamped to `[0.5, N + 0.5]` on both axes, so sampling never leaves
//! the interior plus half the ghost border and the scheme stays stable for any
//! time step.

use super::boundary::{enforce_boundary, BoundaryKind};
use super::fields::GridField;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Backward-traced origin of interior cell `(x, y)`, clamped to the sampling range
///
/// Coordinates are in grid units; `dt · v` is the distance travelled in cells.
#[inline]
#[must_use]
pub fn trace_origin(
    x: usize,
    y: usize,
    vx: f32,
    vy: f32,
    dt: f32,
    resolution: usize,
) -> (f32, f32) {
    let max = resolution as f32 + 0.5;
    let origin_x = (x as f32 - dt * vx).clamp(0.5, max);
    let origin_y = (y as f32 - dt * vy).clamp(0.5, max);
    (origin_x, origin_y)
}

/// Bilinearly interpolate `field` at fractional grid coordinates
///
/// Interpolates along `x` on rows `floor(y)` and `floor(y) + 1`, then along `y`.
/// Callers must keep `(x, y)` within `[0.5, N + 0.5]`.
#[inline]
#[must_use]
pub fn sample_bilinear(field: &GridField, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let bottom = lerp(field.get(x0, y0), field.get(x0 + 1, y0), fx);
    let top = lerp(field.get(x0, y0 + 1), field.get(x0 + 1, y0 + 1), fx);
    lerp(bottom, top, fy)
}

/// Transport `source` along `(velocity_x, velocity_y)` for `dt`, returning a new field
///
/// # Arguments
///
/// * `source` - Field to transport
/// * `velocity_x` - Horizontal velocity used for the backward trace
/// * `velocity_y` - Vertical velocity used for the backward trace
/// * `dt` - Sub-step length
/// * `kind` - Boundary kind enforced on the result
#[must_use]
pub fn advect(
    source: &GridField,
    velocity_x: &GridField,
    velocity_y: &GridField,
    dt: f32,
    kind: BoundaryKind,
) -> GridField {
    let n = source.resolution();
    let side = source.side();
    let vx = velocity_x.as_slice();
    let vy = velocity_y.as_slice();

    let mut result = GridField::new(n);
    {
        let out = result.as_mut_slice();
        for x in 1..=n {
            for y in 1..=n {
                let idx = y * side + x;
                let (origin_x, origin_y) = trace_origin(x, y, vx[idx], vy[idx], dt, n);
                out[idx] = sample_bilinear(source, origin_x, origin_y);
            }
        }
    }

    enforce_boundary(&mut result, kind);
    result
}
