//! Mosaic radius sampler: patch-reef sizes from an exponential decay law.
//!
//! Small patch reefs are far more common than large ones. The relative
//! frequency of radius `r` is `333 · e^(−0.666·r)`; each integer radius gets
//! `round(frequency)` consecutive slots in a lookup table, and a draw picks a
//! slot uniformly. Table size is the probability mass, so no inverse CDF is
//! needed.
//!
//! # Example
//!
//! ```ignore
//! let dist = MosaicRadiusDistribution::new(20)?;
//! let mut sampler = MosaicSampler::new(dist, 7);
//! let table = sampler.draw_table(9999);
//! ```

use carbonate_env::{CarbonateError, Result};
use ndarray::Array2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// Multiplier applied to the integer radius stored in each slot.
pub const RADIUS_SCALING_FACTOR: f64 = 2.0;

/// Prefactor of the decay law.
pub const DECAY_PREFACTOR: f64 = 333.0;

/// Exponent rate of the decay law.
pub const DECAY_RATE: f64 = 0.666;

/// Hard cap on table slots, checked before allocation.
pub const MAX_TABLE_SLOTS: usize = 1 << 20;

/// Relative frequency of integer radius `r`.
pub fn decay_frequency(r: u32) -> f64 {
    DECAY_PREFACTOR * (-DECAY_RATE * r as f64).exp()
}

/// Number of table slots allotted to radius `r`.
fn slot_count(r: u32) -> usize {
    decay_frequency(r).round() as usize
}

/// Immutable slot table encoding the radius distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicRadiusDistribution {
    max_radius: u32,
    slots: Vec<f64>,
}

impl MosaicRadiusDistribution {
    /// Builds the table for radii `1..=max_radius`.
    pub fn new(max_radius: u32) -> Result<Self> {
        if max_radius < 1 {
            return Err(CarbonateError::invalid(
                "mosaic_max_radius",
                max_radius,
                "upper bound radius must be >= 1",
            ));
        }

        let total: usize = (1..=max_radius).map(slot_count).sum();
        if total == 0 || total > MAX_TABLE_SLOTS {
            return Err(CarbonateError::invalid(
                "mosaic_max_radius",
                max_radius,
                format!("table would hold {} slots (allowed 1..={})", total, MAX_TABLE_SLOTS),
            ));
        }

        let mut slots = Vec::with_capacity(total);
        for r in 1..=max_radius {
            let radius = r as f64 * RADIUS_SCALING_FACTOR;
            slots.extend(std::iter::repeat(radius).take(slot_count(r)));
        }

        Ok(Self { max_radius, slots })
    }

    pub fn max_radius(&self) -> u32 {
        self.max_radius
    }

    /// Table length (total slot count).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Radius stored at a slot.
    pub fn radius_at(&self, index: usize) -> Option<f64> {
        self.slots.get(index).copied()
    }

    /// Probability that a draw returns integer radius `r` (before scaling).
    pub fn probability(&self, r: u32) -> f64 {
        if r < 1 || r > self.max_radius {
            return 0.0;
        }
        slot_count(r) as f64 / self.len() as f64
    }

    /// Draws one radius using the caller's random source.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sample_slot(rng).1
    }

    /// Draws one slot, returning its table index and radius.
    pub fn sample_slot<R: Rng + ?Sized>(&self, rng: &mut R) -> (usize, f64) {
        let slot = rng.gen_range(0..self.slots.len());
        (slot, self.slots[slot])
    }
}

/// One entry of the draw table handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MosaicDraw {
    /// Slot of the radius table that was drawn
    pub index: usize,
    /// Sampled (scaled) radius in cells
    pub radius: f64,
}

/// Single-owner sampler pairing a distribution with a seeded stream.
#[derive(Debug, Clone)]
pub struct MosaicSampler {
    distribution: MosaicRadiusDistribution,
    seed: u64,
    rng: ChaCha8Rng,
}

impl MosaicSampler {
    /// Creates a sampler whose draws are fully determined by `seed`.
    pub fn new(distribution: MosaicRadiusDistribution, seed: u64) -> Self {
        Self {
            distribution,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn distribution(&self) -> &MosaicRadiusDistribution {
        &self.distribution
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restarts the stream from a new seed.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Draws one radius.
    pub fn sample(&mut self) -> f64 {
        self.distribution.sample(&mut self.rng)
    }

    /// Draws `count` radii as `(slot, radius)` pairs.
    pub fn draw_table(&mut self, count: usize) -> Vec<MosaicDraw> {
        (0..count)
            .map(|_| {
                let (index, radius) = self.distribution.sample_slot(&mut self.rng);
                MosaicDraw { index, radius }
            })
            .collect()
    }
}

/// Draw table as a `(draws, 2)` array of `[slot, radius]` rows.
pub fn draw_table_array(draws: &[MosaicDraw]) -> Array2<f64> {
    let mut out = Array2::zeros((draws.len(), 2));
    for (row, d) in draws.iter().enumerate() {
        out[[row, 0]] = d.index as f64;
        out[[row, 1]] = d.radius;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_table_layout() {
        let dist = MosaicRadiusDistribution::new(20).unwrap();
        // 171 + 88 + 45 + 23 + 12 + 6 + 3 + 2 + 1, radii above 9 round to zero slots
        assert_eq!(dist.len(), 351);
        assert_eq!(dist.radius_at(0), Some(2.0));
        assert_eq!(dist.radius_at(170), Some(2.0));
        assert_eq!(dist.radius_at(171), Some(4.0));
        assert_eq!(dist.radius_at(350), Some(18.0));
        assert_eq!(dist.radius_at(351), None);
        assert_eq!(dist.probability(15), 0.0);
    }

    #[test]
    fn test_small_bound() {
        let dist = MosaicRadiusDistribution::new(1).unwrap();
        assert_eq!(dist.len(), 171);
        assert_eq!(dist.probability(1), 1.0);
    }

    #[test]
    fn test_zero_bound_rejected() {
        let err = MosaicRadiusDistribution::new(0).unwrap_err();
        assert!(matches!(err, CarbonateError::InvalidParameter { .. }));
    }

    #[test]
    fn test_same_seed_same_draws() {
        let dist = MosaicRadiusDistribution::new(20).unwrap();
        let mut a = MosaicSampler::new(dist.clone(), 1234);
        let mut b = MosaicSampler::new(dist, 1234);
        assert_eq!(a.draw_table(500), b.draw_table(500));
    }

    #[test]
    fn test_reseed_restarts_stream() {
        let dist = MosaicRadiusDistribution::new(20).unwrap();
        let mut a = MosaicSampler::new(dist, 9);
        let first = a.draw_table(64);
        a.reseed(9);
        assert_eq!(a.draw_table(64), first);
        a.reseed(10);
        assert_ne!(a.draw_table(64), first);
    }

    #[test]
    fn test_empirical_frequency_follows_decay_law() {
        let dist = MosaicRadiusDistribution::new(20).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2019);
        let draws = 100_000;

        let mut counts: HashMap<u32, usize> = HashMap::new();
        for _ in 0..draws {
            let r = (dist.sample(&mut rng) / RADIUS_SCALING_FACTOR).round() as u32;
            *counts.entry(r).or_default() += 1;
        }

        let continuous_total: f64 = (1..=20).map(decay_frequency).sum();
        for r in 1..=20u32 {
            let empirical = counts.get(&r).copied().unwrap_or(0) as f64 / draws as f64;
            let law = decay_frequency(r) / continuous_total;
            assert!(
                (empirical - law).abs() < 0.01,
                "radius {}: empirical {:.4} vs law {:.4}",
                r,
                empirical,
                law
            );
            assert!((empirical - dist.probability(r)).abs() < 0.01);
        }
    }

    #[test]
    fn test_draw_table_array_shape() {
        let dist = MosaicRadiusDistribution::new(5).unwrap();
        let mut sampler = MosaicSampler::new(dist, 3);
        let table = sampler.draw_table(10);
        let array = draw_table_array(&table);
        assert_eq!(array.dim(), (10, 2));
        assert_eq!(array[[9, 0]], table[9].index as f64);
        assert_eq!(array[[4, 1]], table[4].radius);
    }

    #[test]
    fn test_draw_table_records_drawn_slot() {
        let dist = MosaicRadiusDistribution::new(20).unwrap();
        let mut sampler = MosaicSampler::new(dist.clone(), 11);
        let table = sampler.draw_table(2000);
        for d in &table {
            assert!(d.index < dist.len());
            assert_eq!(dist.radius_at(d.index), Some(d.radius));
        }
        // slots, not row numbers
        assert!(table.iter().enumerate().any(|(row, d)| d.index != row));

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let radii: Vec<f64> = (0..2000).map(|_| dist.sample(&mut rng)).collect();
        assert!(table.iter().zip(&radii).all(|(d, &r)| d.radius == r));
    }
}
