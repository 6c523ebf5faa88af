//! Domain grid: a fixed 2D cell lattice with uniform spacing.

use carbonate_env::GridSpec;
use ndarray::Array2;

/// Fixed-size cell lattice. Cell `(x, y)` covers `x * spacing .. (x + 1) * spacing`.
///
/// A grid declared with `x_length`/`y_length` holds one extra row and column
/// (index 0), so 1-based sample files fit without shifting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub x_max: usize,
    pub y_max: usize,
    pub spacing: f64,
}

impl Grid {
    /// Creates a grid of `x_max` by `y_max` cells.
    pub fn new(x_max: usize, y_max: usize, spacing: f64) -> Self {
        Self {
            x_max,
            y_max,
            spacing,
        }
    }

    /// Builds the grid declared in the parameters.
    pub fn from_spec(spec: &GridSpec) -> Self {
        Self::new(spec.x_length + 1, spec.y_length + 1, spec.grid_spacing)
    }

    /// Shape as `(x_max, y_max)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.x_max, self.y_max)
    }

    pub fn cell_count(&self) -> usize {
        self.x_max * self.y_max
    }

    /// Area of one cell in map units squared.
    pub fn cell_area(&self) -> f64 {
        self.spacing * self.spacing
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.x_max && y < self.y_max
    }

    /// A zero-filled field with this grid's shape.
    pub fn zeros(&self) -> Array2<f64> {
        Array2::zeros(self.shape())
    }

    /// A constant field with this grid's shape.
    pub fn filled(&self, value: f64) -> Array2<f64> {
        Array2::from_elem(self.shape(), value)
    }
}
