//! Chronostratigraphic column: `(x, y, chron) → {thickness, facies}`.
//!
//! The column is append-only along the chron axis. Chron `n` is written
//! exactly once, at index `n`, after chron `n − 1`. Index 0 is the pre-run
//! basement and is never written.

use carbonate_env::{CarbonateError, Facies, Result};
use ndarray::{s, Array2, Array3, ArrayView2};

/// Layered deposit record.
#[derive(Debug, Clone)]
pub struct StratigraphicColumn {
    thickness: Array3<f64>,
    facies: Array3<Facies>,
    planned: usize,
    capacity: usize,
    written: usize,
    incomplete: bool,
}

impl StratigraphicColumn {
    /// Allocates room for `planned` chrons on an `x_max` × `y_max` grid.
    ///
    /// Fails with `CapacityExceeded` when `planned` is zero or above `capacity`.
    pub fn new(x_max: usize, y_max: usize, planned: usize, capacity: usize) -> Result<Self> {
        if planned == 0 || planned > capacity {
            return Err(CarbonateError::CapacityExceeded {
                requested: planned,
                capacity,
            });
        }
        Ok(Self {
            thickness: Array3::zeros((x_max, y_max, planned + 1)),
            facies: Array3::from_elem((x_max, y_max, planned + 1), Facies::Exposed),
            planned,
            capacity,
            written: 0,
            incomplete: false,
        })
    }

    /// Writes the slice for `chron`. Must be the next unwritten chron.
    pub fn write_chron(
        &mut self,
        chron: usize,
        thickness: &Array2<f64>,
        facies: &Array2<Facies>,
    ) -> Result<()> {
        if chron != self.written + 1 || chron > self.planned {
            return Err(CarbonateError::InvalidState {
                operation: "write_chron",
                expected: "the next unwritten chron",
                actual: format!(
                    "chron {} offered, {} of {} written",
                    chron, self.written, self.planned
                ),
            });
        }
        let shape = (self.thickness.dim().0, self.thickness.dim().1);
        for (what, dim) in [("thickness slice", thickness.dim()), ("facies slice", facies.dim())] {
            if dim != shape {
                return Err(CarbonateError::DimensionMismatch {
                    what: what.to_string(),
                    expected: shape,
                    actual: dim,
                });
            }
        }
        self.thickness.slice_mut(s![.., .., chron]).assign(thickness);
        self.facies.slice_mut(s![.., .., chron]).assign(facies);
        self.written = chron;
        Ok(())
    }

    /// Flags the column as the record of a failed run.
    pub fn mark_incomplete(&mut self) {
        self.incomplete = true;
    }

    /// True once every planned chron is written and the run did not fail.
    pub fn is_complete(&self) -> bool {
        !self.incomplete && self.written == self.planned
    }

    pub fn written_chrons(&self) -> usize {
        self.written
    }

    pub fn planned_chrons(&self) -> usize {
        self.planned
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Thickness deposited at a cell in a written chron.
    pub fn thickness_at(&self, x: usize, y: usize, chron: usize) -> Option<f64> {
        if chron == 0 || chron > self.written {
            return None;
        }
        self.thickness.get([x, y, chron]).copied()
    }

    /// Facies recorded at a cell in a written chron.
    pub fn facies_at(&self, x: usize, y: usize, chron: usize) -> Option<Facies> {
        if chron == 0 || chron > self.written {
            return None;
        }
        self.facies.get([x, y, chron]).copied()
    }

    /// Thickness slice of one written chron.
    pub fn chron_thickness(&self, chron: usize) -> Option<ArrayView2<'_, f64>> {
        (chron >= 1 && chron <= self.written).then(|| self.thickness.slice(s![.., .., chron]))
    }

    /// Accumulated thickness over all written chrons.
    pub fn total_thickness(&self) -> Array2<f64> {
        self.thickness
            .slice(s![.., .., 1..=self.written])
            .sum_axis(ndarray::Axis(2))
    }

    /// Full thickness array, `(x, y, planned + 1)`.
    pub fn thickness(&self) -> &Array3<f64> {
        &self.thickness
    }

    /// Facies codes as floats, same shape as [`Self::thickness`].
    pub fn facies_codes(&self) -> Array3<f64> {
        self.facies.mapv(|f| f.code() as f64)
    }
}
