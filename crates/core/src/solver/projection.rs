//! Pressure projection
//!
//! Removes the divergent part of the velocity field (Helmholtz decomposition):
//!
//! 1. `div = -0.5 · (∂vx/∂x + ∂vy/∂y)` by central differences
//! 2. Solve `∇²p = div` with fixed-iteration Gauss-Seidel from `p = 0`
//! 3. `v -= ∇p` by central differences
//!
//! Like diffusion, the relaxation runs a fixed number of sweeps and never checks
//! a residual, so the result is only approximately divergence-free.

use super::boundary::{enforce_boundary, BoundaryKind};
use super::fields::GridField;

/// Discrete divergence field used as the right-hand side of the pressure solve
///
/// Interior cells hold `-0.5 · ((vx[x+1,y] - vx[x-1,y]) + (vy[x,y+1] - vy[x,y-1]))`;
/// the ghost border is enforced as a scalar.
#[must_use]
pub fn divergence(velocity_x: &GridField, velocity_y: &GridField) -> GridField {
    let n = velocity_x.resolution();
    let side = velocity_x.side();
    let vx = velocity_x.as_slice();
    let vy = velocity_y.as_slice();

    let mut div = GridField::new(n);
    let out = div.as_mut_slice();
    for x in 1..=n {
        for y in 1..=n {
            let idx = y * side + x;
            let dvx = vx[idx + 1] - vx[idx - 1];
            let dvy = vy[idx + side] - vy[idx - side];
            out[idx] = -0.5 * (dvx + dvy);
        }
    }

    enforce_boundary(&mut div, BoundaryKind::None);
    div
}

/// Relax the pressure Poisson equation for `div`, starting from zero
#[must_use]
pub fn solve_pressure(div: &GridField, iterations: usize) -> GridField {
    let n = div.resolution();
    let side = div.side();
    let rhs = div.as_slice();

    let mut pressure = GridField::new(n);
    for _ in 0..iterations {
        let p = pressure.as_mut_slice();
        for x in 1..=n {
            for y in 1..=n {
                let idx = y * side + x;
                let neighbours = p[idx - 1] + p[idx + 1] + p[idx - side] + p[idx + side];
                p[idx] = (neighbours + rhs[idx]) * 0.25;
            }
        }
        enforce_boundary(&mut pressure, BoundaryKind::None);
    }

    pressure
}

/// Make `(velocity_x, velocity_y)` approximately divergence-free in place
///
/// Uses the same Gauss-Seidel iteration count as diffusion. Boundaries are
/// re-enforced on both components afterwards.
///
/// # Panics
///
/// Panics if the two components have different resolutions
pub fn project(velocity_x: &mut GridField, velocity_y: &mut GridField, iterations: usize) {
    assert_eq!(
        velocity_x.resolution(),
        velocity_y.resolution(),
        "Velocity components must share a resolution"
    );

    let n = velocity_x.resolution();
    let side = velocity_x.side();

    let div = divergence(velocity_x, velocity_y);
    let pressure = solve_pressure(&div, iterations);
    let p = pressure.as_slice();

    {
        let vx = velocity_x.as_mut_slice();
        let vy = velocity_y.as_mut_slice();
        for x in 1..=n {
            for y in 1..=n {
                let idx = y * side + x;
                vx[idx] -= 0.5 * (p[idx + 1] - p[idx - 1]);
                vy[idx] -= 0.5 * (p[idx + side] - p[idx - side]);
            }
        }
    }

    enforce_boundary(velocity_x, BoundaryKind::Horizontal);
    enforce_boundary(velocity_y, BoundaryKind::Vertical);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn divergence_energy(vx: &GridField, vy: &GridField) -> f32 {
        divergence(vx, vy).interior().map(|(_, _, d)| d * d).sum()
    }

    fn enforced(mut vx: GridField, mut vy: GridField) -> (GridField, GridField) {
        enforce_boundary(&mut vx, BoundaryKind::Horizontal);
        enforce_boundary(&mut vy, BoundaryKind::Vertical);
        (vx, vy)
    }

    #[test]
    fn test_divergence_of_point_source() {
        let n = 8;
        let mut vx = GridField::new(n);
        let vy = GridField::new(n);
        // Outflow to the right of (4, 4), inflow from the left
        vx.set(5, 4, 1.0);
        vx.set(3, 4, -1.0);
        let div = divergence(&vx, &vy);
        assert_eq!(div.get(4, 4), -1.0);
    }

    #[test]
    fn test_zero_field_unchanged() {
        let n = 6;
        let mut vx = GridField::new(n);
        let mut vy = GridField::new(n);
        project(&mut vx, &mut vy, 20);
        assert!(vx.as_slice().iter().all(|&v| v == 0.0));
        assert!(vy.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_zero_iterations_leaves_interior_unchanged() {
        let n = 6;
        let mut vx = GridField::new(n);
        let mut vy = GridField::new(n);
        vx.set(3, 3, 2.0);
        vy.set(2, 4, -1.0);
        let (before_x, before_y) = (vx.clone(), vy.clone());
        project(&mut vx, &mut vy, 0);
        for (x, y, value) in vx.interior() {
            assert_eq!(value, before_x.get(x, y));
        }
        for (x, y, value) in vy.interior() {
            assert_eq!(value, before_y.get(x, y));
        }
    }

    #[test]
    fn test_projection_reduces_divergence() {
        let n = 16;
        let mut vx = GridField::new(n);
        let mut vy = GridField::new(n);
        vx.set(8, 8, 5.0);
        vy.set(6, 10, -3.0);
        let (mut vx, mut vy) = enforced(vx, vy);

        let before = divergence_energy(&vx, &vy);
        project(&mut vx, &mut vy, 40);
        let after = divergence_energy(&vx, &vy);

        assert!(before > 0.0);
        assert!(
            after < 0.5 * before,
            "divergence should drop materially: before {before}, after {after}"
        );
    }

    #[test]
    fn test_projection_nearly_idempotent() {
        let n = 16;
        let mut vx = GridField::new(n);
        let mut vy = GridField::new(n);
        vx.set(8, 8, 5.0);
        vy.set(8, 9, 2.0);
        let (mut vx, mut vy) = enforced(vx, vy);

        // Run the solver hard so the field is close to divergence-free
        for _ in 0..20 {
            project(&mut vx, &mut vy, 60);
        }
        let (settled_x, settled_y) = (vx.clone(), vy.clone());
        project(&mut vx, &mut vy, 60);

        let scale = settled_x.interior_max_abs().max(settled_y.interior_max_abs());
        for (x, y, value) in vx.interior() {
            assert_abs_diff_eq!(value, settled_x.get(x, y), epsilon = 0.05 * scale);
        }
        for (x, y, value) in vy.interior() {
            assert_abs_diff_eq!(value, settled_y.get(x, y), epsilon = 0.05 * scale);
        }
    }

    #[test]
    fn test_pressure_solution_is_smooth_bump() {
        let n = 9;
        let mut div = GridField::new(n);
        div.set(5, 5, 1.0);
        let pressure = solve_pressure(&div, 30);
        assert!(pressure.get(5, 5) > pressure.get(6, 5));
        assert!(pressure.get(6, 5) > pressure.get(8, 5));
        assert!(pressure.get(5, 5) > 0.0);
    }
}
