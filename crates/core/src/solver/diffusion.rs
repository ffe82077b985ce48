//! Implicit diffusion by fixed-iteration Gauss-Seidel
//!
//! Solves `(1 + a) new - a · avg4(new) = old` with `a = rate · dt` by relaxing a
//! zero-initialized estimate for a fixed number of sweeps. Convergence is never
//! checked; the iteration count is the accuracy knob.
//!
//! ```text
//! new[x,y] = (old[x,y] + a · (new[x+1,y] + new[x-1,y] + new[x,y+1] + new[x,y-1]) / 4) / (1 + a)
//! ```
//!
//! With `iterations == 0` the result is the zero field: at least one sweep is
//! needed for anything to propagate.

use super::boundary::{enforce_boundary, BoundaryKind};
use super::fields::GridField;

/// Diffuse `source` over `dt` seconds at `rate`, returning a new field
///
/// # Arguments
///
/// * `source` - Field before diffusion
/// * `rate` - Diffusion rate (change factor per second)
/// * `dt` - Sub-step length in seconds
/// * `iterations` - Gauss-Seidel sweeps over the interior
/// * `kind` - Boundary kind re-enforced after every sweep
#[must_use]
pub fn diffuse(
    source: &GridField,
    rate: f32,
    dt: f32,
    iterations: usize,
    kind: BoundaryKind,
) -> GridField {
    let n = source.resolution();
    let side = source.side();
    let change = rate * dt;
    let inv_denom = 1.0 / (1.0 + change);

    let old = source.as_slice();
    let mut result = GridField::new(n);

    for _ in 0..iterations {
        let new = result.as_mut_slice();
        for x in 1..=n {
            for y in 1..=n {
                let idx = y * side + x;
                let neighbours =
                    (new[idx + 1] + new[idx - 1] + new[idx + side] + new[idx - side]) * 0.25;
                new[idx] = (old[idx] + change * neighbours) * inv_denom;
            }
        }
        enforce_boundary(&mut result, kind);
    }

    result
}
