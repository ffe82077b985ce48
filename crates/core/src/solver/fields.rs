//! Grid field storage
//!
//! A `GridField` is a square `(N+2) × (N+2)` array of `f32` stored row-major.
//! Indices `1..=N` on each axis are interior cells; indices `0` and `N+1` form
//! the ghost border, which only the boundary enforcer writes.

use serde::{Deserialize, Serialize};

/// Scalar field over a square grid with a one-cell ghost border
///
/// Density, pressure, divergence and each velocity component are separate
/// `GridField`s. Values are addressed as `(x, y)` with `x` the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridField {
    /// Values in row-major order (`y * (N + 2) + x`), ghost cells included
    data: Vec<f32>,
    /// Interior cells per axis (`N`)
    resolution: usize,
}

impl GridField {
    /// Create a zeroed field with `resolution` interior cells per axis
    #[must_use]
    pub fn new(resolution: usize) -> Self {
        let side = resolution + 2;
        Self {
            data: vec![0.0; side * side],
            resolution,
        }
    }

    /// Create a field with every cell, ghost cells included, set to `value`
    #[must_use]
    pub fn with_value(resolution: usize, value: f32) -> Self {
        let side = resolution + 2;
        Self {
            data: vec![value; side * side],
            resolution,
        }
    }

    /// Interior cells per axis (`N`)
    #[must_use]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Cells per axis including the ghost border (`N + 2`)
    #[must_use]
    pub fn side(&self) -> usize {
        self.resolution + 2
    }

    /// Flat index of `(x, y)`
    #[inline]
    #[must_use]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.side() + x
    }

    /// Whether `(x, y)` is an interior cell
    #[must_use]
    pub fn is_interior(&self, x: usize, y: usize) -> bool {
        (1..=self.resolution).contains(&x) && (1..=self.resolution).contains(&y)
    }

    /// Value at `(x, y)`
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid including its ghost border
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        assert!(
            x < self.side() && y < self.side(),
            "Coordinates out of bounds"
        );
        self.data[y * self.side() + x]
    }

    /// Write `value` at `(x, y)`
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the grid including its ghost border
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        assert!(
            x < self.side() && y < self.side(),
            "Coordinates out of bounds"
        );
        let side = self.side();
        self.data[y * side + x] = value;
    }

    /// Add `delta` to the value at `(x, y)`
    #[inline]
    pub fn add(&mut self, x: usize, y: usize, delta: f32) {
        let value = self.get(x, y);
        self.set(x, y, value + delta);
    }

    /// Raw values, ghost cells included
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable raw values, ghost cells included
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Set every cell, ghost cells included, to `value`
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Set every interior cell to `value`, leaving the ghost border untouched
    pub fn fill_interior(&mut self, value: f32) {
        let n = self.resolution;
        let side = self.side();
        for y in 1..=n {
            self.data[y * side + 1..=y * side + n].fill(value);
        }
    }

    /// Iterate over interior cells as `(x, y, value)`, `x` varying fastest
    pub fn interior(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let n = self.resolution;
        (1..=n).flat_map(move |y| (1..=n).map(move |x| (x, y, self.get(x, y))))
    }

    /// Sum of all interior values
    #[must_use]
    pub fn interior_sum(&self) -> f32 {
        self.interior().map(|(_, _, v)| v).sum()
    }

    /// Largest absolute interior value
    #[must_use]
    pub fn interior_max_abs(&self) -> f32 {
        self.interior().fold(0.0_f32, |acc, (_, _, v)| acc.max(v.abs()))
    }

    /// Copy all values from `other`, which must have the same resolution
    ///
    /// # Panics
    ///
    /// Panics if the resolutions differ
    pub fn copy_from(&mut self, other: &GridField) {
        assert_eq!(
            self.resolution, other.resolution,
            "Field resolutions differ"
        );
        self.data.copy_from_slice(&other.data);
    }
}
