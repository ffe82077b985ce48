//! Circular brush over the fluid grid
//!
//! World coordinates put the grid's lower-left corner at the origin, so cell
//! `i` (zero-based) spans `[i * cell, (i + 1) * cell]` on each axis and maps to
//! interior coordinate `i + 1`.

use fluid_sim_core::{GridGeometry, Vec2};

/// Scale applied to pointer movement on top of the user's move force
pub const CONSTANT_FORCE_FACTOR: f32 = 5.0;

/// Interior cells whose square overlaps a circle of `radius` at `center`.
///
/// The circle is shrunk by half a cell so a brush of radius `r` covers roughly
/// `r / cell` cells to each side. A circle that shrinks to nothing still
/// selects the cell under its center.
pub fn cells_in_circle(center: Vec2, radius: f32, geometry: &GridGeometry) -> Vec<(usize, usize)> {
    let cell = geometry.cell_size();
    let n = geometry.resolution as i64;
    let effective = (radius - 0.5 * cell).max(0.0);

    let span = |c: f32| {
        let lo = ((c - effective) / cell).floor() as i64;
        let hi = ((c + effective) / cell).floor() as i64;
        (lo.max(0), hi.min(n - 1))
    };
    let (x_lo, x_hi) = span(center.x);
    let (y_lo, y_hi) = span(center.y);

    let mut cells = Vec::new();
    for j in y_lo..=y_hi {
        for i in x_lo..=x_hi {
            let min = Vec2::new(i as f32 * cell, j as f32 * cell);
            let nearest = Vec2::new(
                center.x.clamp(min.x, min.x + cell),
                center.y.clamp(min.y, min.y + cell),
            );
            if (nearest - center).norm() <= effective {
                cells.push((i as usize + 1, j as usize + 1));
            }
        }
    }
    cells
}

/// One drag gesture: remembers where the brush was on the previous frame and
/// which cells it covered there.
#[derive(Debug, Default)]
pub struct DragStroke {
    last: Option<(Vec2, Vec<(usize, usize)>)>,
}

impl DragStroke {
    /// Advance the stroke to `position`.
    ///
    /// The first call only records the brush. Later calls return the scaled
    /// movement since the previous call together with the cells the brush
    /// covered there.
    pub fn advance(
        &mut self,
        position: Vec2,
        radius: f32,
        move_force: f32,
        geometry: &GridGeometry,
    ) -> Option<(Vec<(usize, usize)>, Vec2)> {
        let cells = cells_in_circle(position, radius, geometry);
        let previous = self.last.replace((position, cells));
        previous.map(|(last_position, last_cells)| {
            let movement = (position - last_position) * move_force * CONSTANT_FORCE_FACTOR;
            (last_cells, movement)
        })
    }

    /// Release the pointer.
    pub fn finish(&mut self) {
        self.last = None;
    }

    pub fn is_active(&self) -> bool {
        self.last.is_some()
    }
}
