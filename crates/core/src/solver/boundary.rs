//! Free-slip wall boundary conditions
//!
//! Ghost cells mirror their adjacent interior cell. Velocity components normal
//! to a wall are negated so the wall reflects flow; tangential components and
//! scalars pass through unchanged. Corners take the average of their two
//! neighbouring edge ghosts.

use super::fields::GridField;
use serde::{Deserialize, Serialize};

/// Which sign flips a field needs at the walls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryKind {
    /// Scalars (density, pressure, divergence): no sign flip
    None,
    /// Horizontal velocity: negated at the left and right walls
    Horizontal,
    /// Vertical velocity: negated at the top and bottom walls
    Vertical,
}

impl BoundaryKind {
    /// `(horizontal_factor, vertical_factor)` applied at left/right and top/bottom walls
    #[must_use]
    pub const fn factors(self) -> (f32, f32) {
        match self {
            Self::None => (1.0, 1.0),
            Self::Horizontal => (-1.0, 1.0),
            Self::Vertical => (1.0, -1.0),
        }
    }
}

/// Rewrite the ghost border of `field` from its interior
///
/// Interior values are never touched. Must run after every stage that
/// produces a field, because relaxation sweeps and advection sampling read the
/// ghost cells.
pub fn enforce_boundary(field: &mut GridField, kind: BoundaryKind) {
    let n = field.resolution();
    let (horizontal, vertical) = kind.factors();

    for i in 1..=n {
        field.set(0, i, field.get(1, i) * horizontal);
        field.set(n + 1, i, field.get(n, i) * horizontal);
        field.set(i, 0, field.get(i, 1) * vertical);
        field.set(i, n + 1, field.get(i, n) * vertical);
    }

    field.set(0, 0, 0.5 * (field.get(1, 0) + field.get(0, 1)));
    field.set(0, n + 1, 0.5 * (field.get(0, n) + field.get(1, n + 1)));
    field.set(n + 1, 0, 0.5 * (field.get(n, 0) + field.get(n + 1, 1)));
    field.set(
        n + 1,
        n + 1,
        0.5 * (field.get(n, n + 1) + field.get(n + 1, n)),
    );
}
