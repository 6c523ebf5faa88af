//! Carbonate Core - stratigraphic accumulation on a gridded carbonate platform
//!
//! The engine advances a seafloor surface through discrete chrons:
//! 1. **Sea level**: a time-indexed curve (constant, sampled or periodic)
//! 2. **Zonation**: water depth picks a facies through a pluggable profile
//! 3. **Growth**: facies growth rates capped at sea level, then subsidence
//!
//! Every chron is recorded in an append-only column of thickness and facies.

pub mod bathymetry;
pub mod column;
pub mod deposition;
pub mod engine;
pub mod facies;
pub mod grid;
pub mod mosaic;
pub mod patches;
pub mod sea_level;

// Re-export key types for convenience
pub use bathymetry::BathymetryField;
pub use column::StratigraphicColumn;
pub use deposition::{CellOutcome, DepositionRule};
pub use engine::{chrons_required, ChronReport, EngineState, StratEngine};
pub use facies::{profile_from_spec, FaciesProfile, RampProfile, UniformProfile};
pub use grid::Grid;
pub use mosaic::{MosaicDraw, MosaicRadiusDistribution, MosaicSampler};
pub use patches::{patch_weights, place_patches, Patch};
pub use sea_level::SeaLevelCurve;

/// Seed stream of the mosaic draw table.
pub const MOSAIC_STREAM: u64 = 1;

/// Derives an independent seed for one random stream from the master seed.
pub fn stream_seed(master: u64, stream: u64) -> u64 {
    master.wrapping_mul(0x9e3779b97f4a7c15) ^ stream.wrapping_mul(0x517cc1b727220a95)
}
