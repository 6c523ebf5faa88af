//! Carbonate Environment Layer
//!
//! Everything the stratigraphic engine needs from the outside world, kept
//! free of simulation logic:
//! - **Errors**: the workspace-wide [`CarbonateError`] taxonomy
//! - **Parameters**: the immutable [`SimulationParameters`] and its JSON loader
//! - **Inputs**: delimited-text readers for bathymetry samples and sea-level curves
//! - **Outputs**: the atomic binary [`ContainerWriter`] for named arrays
//!
//! # Example
//!
//! ```ignore
//! use carbonate_env::{SimulationParameters, ContainerWriter};
//!
//! let params = SimulationParameters::load("model.json")?;
//! // ... run the engine, collect an ArrayBundle ...
//! ContainerWriter::new("model.cstr").write(&bundle)?;
//! ```

mod container;
mod delimited;
mod error;
mod params;
mod types;

pub use container::{read_container, ContainerWriter, MAGIC};
pub use delimited::{
    parse_bathymetry, parse_sea_level_curve, read_bathymetry, read_sea_level_curve,
    BathymetrySample,
};
pub use error::{CarbonateError, Result};
pub use params::{
    BathymetrySource, DistributeType, Extrapolation, GridSpec, MosaicSpec, ProfileSpec,
    SeaLevelComponent, SeaLevelSpec, SimulationParameters, DEFAULT_CHRONS_MAX,
    DEFAULT_MOSAIC_DRAWS, DEFAULT_MOSAIC_MAX_RADIUS,
};
pub use types::{ArrayBundle, Facies, GrowthRates};
