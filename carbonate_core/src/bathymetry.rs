//! Bathymetry loader: dense elevation field from sparse point samples.
//!
//! Elevations are signed, negative below the reference sea level of zero.

use crate::grid::Grid;
use carbonate_env::{read_bathymetry, BathymetrySample, BathymetrySource, CarbonateError, Result};
use ndarray::Array2;
use tracing::debug;

/// Largest dense field built from samples.
pub const MAX_FIELD_CELLS: usize = 1 << 28;

/// Dense `(x, y) → elevation` field.
#[derive(Debug, Clone, PartialEq)]
pub struct BathymetryField {
    elevation: Array2<f64>,
}

impl BathymetryField {
    /// Builds a field sized `(max(x)+1, max(y)+1)` from sparse samples.
    ///
    /// Cells without a sample are 0. A repeated `(x, y)` keeps the last sample.
    pub fn from_samples(samples: &[BathymetrySample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(CarbonateError::format(
                "<bathymetry samples>",
                0,
                "",
                "no samples to size the field from",
            ));
        }
        let (x_max, y_max) = extent(samples)?;

        let mut elevation = Array2::zeros((x_max, y_max));
        for s in samples {
            elevation[[s.x, s.y]] = s.z;
        }
        Ok(Self { elevation })
    }

    /// Uniform elevation over the grid.
    pub fn flat(grid: &Grid, elevation: f64) -> Self {
        Self {
            elevation: grid.filled(elevation),
        }
    }

    /// Wraps an existing array.
    pub fn from_array(elevation: Array2<f64>) -> Self {
        Self { elevation }
    }

    /// Loads the field described by `source`, checked against `grid`.
    pub fn load(source: &BathymetrySource, grid: &Grid) -> Result<Self> {
        match source {
            BathymetrySource::File(path) => {
                let samples = read_bathymetry(path)?;
                debug!("Read {} bathymetry samples from {}", samples.len(), path.display());
                // Reject out-of-grid rows before the dense field is sized from them.
                if let Some((i, s)) = samples
                    .iter()
                    .enumerate()
                    .find(|(_, s)| !grid.contains(s.x, s.y))
                {
                    return Err(CarbonateError::DimensionMismatch {
                        what: format!(
                            "bathymetry sample {} ({}, {}) in {}",
                            i + 1,
                            s.x,
                            s.y,
                            path.display()
                        ),
                        expected: grid.shape(),
                        actual: (s.x.saturating_add(1), s.y.saturating_add(1)),
                    });
                }
                Self::from_samples(&samples)?.require_grid(grid)
            }
            BathymetrySource::Flat { elevation } => Ok(Self::flat(grid, *elevation)),
        }
    }

    /// Fails with `DimensionMismatch` unless the field has the grid's shape.
    pub fn require_grid(self, grid: &Grid) -> Result<Self> {
        if self.shape() != grid.shape() {
            return Err(CarbonateError::DimensionMismatch {
                what: "initial bathymetry".to_string(),
                expected: grid.shape(),
                actual: self.shape(),
            });
        }
        Ok(self)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.elevation.dim()
    }

    /// Elevation at a cell, if inside the field.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.elevation.get([x, y]).copied()
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.elevation
    }

    pub fn into_array(self) -> Array2<f64> {
        self.elevation
    }

    /// Lowest and highest elevation.
    pub fn range(&self) -> (f64, f64) {
        self.elevation
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
    }
}

/// Dense shape `(max(x)+1, max(y)+1)`, bounded by [`MAX_FIELD_CELLS`].
fn extent(samples: &[BathymetrySample]) -> Result<(usize, usize)> {
    let (mut x_max, mut y_max) = (0usize, 0usize);
    for (i, s) in samples.iter().enumerate() {
        let x = s.x.checked_add(1);
        let y = s.y.checked_add(1);
        let cells = x.zip(y).and_then(|(x, y)| x.checked_mul(y));
        match (x, y, cells) {
            (Some(x), Some(y), Some(cells)) if cells <= MAX_FIELD_CELLS => {
                x_max = x_max.max(x);
                y_max = y_max.max(y);
            }
            _ => {
                return Err(CarbonateError::invalid(
                    format!("bathymetry sample {}", i + 1),
                    format!("({}, {})", s.x, s.y),
                    format!("index sizes a field above {} cells", MAX_FIELD_CELLS),
                ))
            }
        }
    }
    match x_max.checked_mul(y_max) {
        Some(cells) if cells <= MAX_FIELD_CELLS => Ok((x_max, y_max)),
        _ => Err(CarbonateError::invalid(
            "bathymetry samples",
            format!("({}, {})", x_max, y_max),
            format!("dense field above {} cells", MAX_FIELD_CELLS),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_cells_default_to_zero() {
        let samples = vec![
            BathymetrySample::new(0, 0, -5.0),
            BathymetrySample::new(2, 1, -3.0),
        ];
        let field = BathymetryField::from_samples(&samples).unwrap();
        assert_eq!(field.shape(), (3, 2));
        assert_eq!(field.get(0, 0), Some(-5.0));
        assert_eq!(field.get(2, 1), Some(-3.0));
        assert_eq!(field.get(1, 1), Some(0.0));
        assert_eq!(field.get(3, 0), None);
        assert_eq!(field.range(), (-5.0, 0.0));
    }

    #[test]
    fn test_duplicate_key_keeps_last() {
        let samples = vec![
            BathymetrySample::new(1, 1, -5.0),
            BathymetrySample::new(1, 1, -2.0),
        ];
        let field = BathymetryField::from_samples(&samples).unwrap();
        assert_eq!(field.get(1, 1), Some(-2.0));
    }

    #[test]
    fn test_empty_samples_rejected() {
        let err = BathymetryField::from_samples(&[]).unwrap_err();
        assert!(matches!(err, CarbonateError::Format { .. }));
    }

    #[test]
    fn test_dimension_mismatch() {
        let field = BathymetryField::from_samples(&[BathymetrySample::new(3, 3, -1.0)]).unwrap();
        let grid = Grid::new(3, 4, 1.0);
        match field.require_grid(&grid).unwrap_err() {
            CarbonateError::DimensionMismatch { expected, actual, .. } => {
                assert_eq!(expected, (3, 4));
                assert_eq!(actual, (4, 4));
            }
            other => panic!("expected dimension mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_grid_row_rejected_before_allocation() {
        let path = std::env::temp_dir().join(format!("carbonate_bathy_far_{}.csv", std::process::id()));
        std::fs::write(&path, "0,0,-5\n4000000000,4000000000,-1\n").unwrap();
        let grid = Grid::new(2, 2, 1.0);

        let err = BathymetryField::load(&BathymetrySource::File(path.clone()), &grid).unwrap_err();
        match err {
            CarbonateError::DimensionMismatch { what, expected, actual } => {
                assert!(what.contains("sample 2"), "{}", what);
                assert_eq!(expected, (2, 2));
                assert_eq!(actual, (4_000_000_001, 4_000_000_001));
            }
            other => panic!("expected dimension mismatch, got {:?}", other),
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_oversized_samples_rejected() {
        let far = [BathymetrySample::new(usize::MAX, 0, 1.0)];
        assert!(matches!(
            BathymetryField::from_samples(&far).unwrap_err(),
            CarbonateError::InvalidParameter { .. }
        ));

        let wide = [
            BathymetrySample::new(1 << 20, 0, 1.0),
            BathymetrySample::new(0, 1 << 20, 1.0),
        ];
        match BathymetryField::from_samples(&wide).unwrap_err() {
            CarbonateError::InvalidParameter { name, .. } => assert_eq!(name, "bathymetry samples"),
            other => panic!("expected invalid parameter, got {:?}", other),
        }
    }

    #[test]
    fn test_flat_source() {
        let grid = Grid::new(2, 3, 10.0);
        let field =
            BathymetryField::load(&BathymetrySource::Flat { elevation: -12.5 }, &grid).unwrap();
        assert_eq!(field.shape(), (2, 3));
        assert_eq!(field.get(1, 2), Some(-12.5));
    }

    proptest! {
        #[test]
        fn prop_dense_field_matches_samples(
            raw in proptest::collection::hash_map((0usize..12, 0usize..12), -500.0f64..500.0, 1..40)
        ) {
            let samples: Vec<BathymetrySample> = raw
                .iter()
                .map(|(&(x, y), &z)| BathymetrySample::new(x, y, z))
                .collect();
            let field = BathymetryField::from_samples(&samples).unwrap();

            let x_max = raw.keys().map(|k| k.0).max().unwrap() + 1;
            let y_max = raw.keys().map(|k| k.1).max().unwrap() + 1;
            prop_assert_eq!(field.shape(), (x_max, y_max));

            let lookup: HashMap<(usize, usize), f64> = raw.clone();
            for x in 0..x_max {
                for y in 0..y_max {
                    let expected = lookup.get(&(x, y)).copied().unwrap_or(0.0);
                    prop_assert_eq!(field.get(x, y), Some(expected));
                }
            }
        }
    }
}
