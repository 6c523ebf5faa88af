//! Carbonate Simulation Harness
//!
//! Drives the stratigraphic engine from a parameter file or a built-in
//! scenario and persists the result.
//!
//! # Core Principle: One Seed
//!
//! Every random stream of a run is derived from a single 64-bit master seed,
//! so a run is reproduced exactly by its parameters and seed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     SimulationRunner                         │
//! │                                                              │
//! │  parameters ──► bathymetry ──► sea-level curve ──► sampler   │
//! │                                    │                         │
//! │                          ┌─────────▼─────────┐               │
//! │                          │   StratEngine     │ chron loop    │
//! │                          └─────────┬─────────┘               │
//! │                                    │                         │
//! │              ContainerWriter (.cstr)   RunSummary (.json)    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use carbonate_sim::{RunContext, SimulationRunner};
//!
//! let runner = SimulationRunner::new(RunContext::new(42)).with_output("model.cstr");
//! let result = runner.run_file("model.json")?;
//! assert!(result.passed());
//! ```

mod context;
mod exporter;
mod runner;
pub mod scenarios;

pub use context::RunContext;
pub use exporter::RunSummary;
pub use runner::{RunResult, SimulationRunner};
