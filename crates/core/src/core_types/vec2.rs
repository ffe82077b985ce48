//! Vector type alias for 2D velocities.

use nalgebra::Vector2;

/// 2D vector type for velocity deltas and drag gestures.
///
/// An alias for `nalgebra::Vector2<f32>`; `x` is the horizontal component
/// and `y` the vertical one, matching the grid's `(x, y)` addressing.
pub type Vec2 = Vector2<f32>;
