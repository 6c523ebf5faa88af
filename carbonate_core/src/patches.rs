//! Mosaic patch placement.
//!
//! Each chron scatters a Poisson-distributed number of patch centres over the
//! grid and sizes each from the mosaic draw table. The result is rasterised
//! into a weight field: 0 outside every patch, `1 − 0.5·d/r` inside, where
//! `d` is the distance in cells to the centre. Overlapping patches keep the
//! largest weight.

use crate::grid::Grid;
use crate::mosaic::MosaicDraw;
use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// A circular patch in cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Patch {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

impl Patch {
    /// Weight of a cell centre, or `None` when outside the patch.
    pub fn weight_at(&self, x: usize, y: usize) -> Option<f64> {
        let dx = x as f64 - self.cx;
        let dy = y as f64 - self.cy;
        let d = (dx * dx + dy * dy).sqrt();
        if self.radius > 0.0 && d <= self.radius {
            Some(1.0 - 0.5 * d / self.radius)
        } else {
            None
        }
    }
}

/// Scatters patches for one chron. Consumes `rng` sequentially.
pub fn place_patches<R: Rng + ?Sized>(
    grid: &Grid,
    draws: &[MosaicDraw],
    mean_count: f64,
    rng: &mut R,
) -> Vec<Patch> {
    if draws.is_empty() || mean_count <= 0.0 {
        return Vec::new();
    }
    let count = match Poisson::new(mean_count) {
        Ok(poisson) => {
            let n: f64 = poisson.sample(rng);
            n as usize
        }
        Err(_) => return Vec::new(),
    };
    (0..count)
        .map(|_| {
            let draw = draws[rng.gen_range(0..draws.len())];
            Patch {
                cx: rng.gen_range(0.0..grid.x_max as f64),
                cy: rng.gen_range(0.0..grid.y_max as f64),
                radius: draw.radius,
            }
        })
        .collect()
}

/// Rasterises patches into a weight field over the grid.
pub fn patch_weights(grid: &Grid, patches: &[Patch]) -> Array2<f64> {
    let mut weights = grid.zeros();
    for patch in patches {
        // Only visit the patch's bounding box.
        let x0 = (patch.cx - patch.radius).floor().max(0.0) as usize;
        let y0 = (patch.cy - patch.radius).floor().max(0.0) as usize;
        let x1 = ((patch.cx + patch.radius).ceil() as usize).min(grid.x_max.saturating_sub(1));
        let y1 = ((patch.cy + patch.radius).ceil() as usize).min(grid.y_max.saturating_sub(1));
        for x in x0..=x1 {
            for y in y0..=y1 {
                if let Some(w) = patch.weight_at(x, y) {
                    let cell = &mut weights[[x, y]];
                    *cell = cell.max(w);
                }
            }
        }
    }
    weights
}
