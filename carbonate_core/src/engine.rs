//! Stratigraphic engine: the time-stepped accumulation loop.
//!
//! # State machine
//!
//! ```text
//! new() ──ok──► Ready ──step()/run()──► Running ──last chron──► Completed
//!   │                                      │
//!   └──err (CapacityExceeded, ...)          └──runtime error──► Failed
//! ```
//!
//! Each chron reads the previous surface, computes every cell into fresh
//! buffers (in parallel), writes the column slice, then swaps the new
//! surface in. Chron `n` therefore only ever sees chron `n − 1`'s surface.

use crate::bathymetry::BathymetryField;
use crate::column::StratigraphicColumn;
use crate::deposition::{CellOutcome, DepositionRule};
use crate::facies::{profile_from_spec, FaciesProfile};
use crate::grid::Grid;
use crate::mosaic::{draw_table_array, MosaicDraw, MosaicSampler};
use crate::patches::{patch_weights, place_patches};
use crate::sea_level::SeaLevelCurve;
use crate::stream_seed;

use carbonate_env::{
    ArrayBundle, CarbonateError, DistributeType, Facies, Result, SimulationParameters,
};
use ndarray::{Array2, Zip};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Seed stream used for per-chron patch placement.
pub const PATCH_STREAM: u64 = 2;

/// Tolerance when turning `(end − start) / step` into a chron count.
const CHRON_COUNT_EPSILON: f64 = 1e-9;

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Ready,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EngineState::Ready => "ready",
            EngineState::Running => "running",
            EngineState::Completed => "completed",
            EngineState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Summary of one chron.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChronReport {
    pub chron: usize,
    pub time: f64,
    pub sea_level: f64,
    /// Σ thickness × cell area
    pub deposited_volume: f64,
    /// Cells whose growth was cut back at sea level
    pub clamped_cells: usize,
    /// Cells at or above sea level
    pub exposed_cells: usize,
    /// Patches placed this chron (mosaic distribution only)
    pub patches: usize,
}

/// Number of chrons between `start_time` and `end_time`.
///
/// Fails with `CapacityExceeded` when the count is zero or above `chrons_max`.
pub fn chrons_required(params: &SimulationParameters) -> Result<usize> {
    let ratio = (params.end_time - params.start_time) / params.time_step;
    let count = if ratio.is_finite() && ratio > 0.0 {
        (ratio + CHRON_COUNT_EPSILON).floor() as usize
    } else {
        0
    };
    if count == 0 || count > params.chrons_max {
        return Err(CarbonateError::CapacityExceeded {
            requested: count,
            capacity: params.chrons_max,
        });
    }
    Ok(count)
}

/// The accumulation engine. Owns every grid-scoped field.
pub struct StratEngine {
    params: SimulationParameters,
    grid: Grid,
    state: EngineState,
    chron: usize,
    chrons_total: usize,

    initial_bathymetry: Array2<f64>,
    /// Surface produced by the last completed chron
    bathymetry: Array2<f64>,
    column: StratigraphicColumn,

    sea_level: SeaLevelCurve,
    start_level: f64,
    profile: Box<dyn FaciesProfile>,

    sampler: MosaicSampler,
    draws: Vec<MosaicDraw>,
    patch_rng: ChaCha8Rng,

    reports: Vec<ChronReport>,
    failure: Option<String>,
}

impl StratEngine {
    /// Builds a ready engine.
    ///
    /// Validates the parameters, the chron count against the column
    /// capacity, and the bathymetry shape against the grid. Draws the mosaic
    /// table once from `sampler`.
    pub fn new(
        params: &SimulationParameters,
        bathymetry: BathymetryField,
        sea_level: SeaLevelCurve,
        mut sampler: MosaicSampler,
    ) -> Result<Self> {
        params.validate()?;
        let chrons_total = chrons_required(params)?;
        let grid = Grid::from_spec(&params.grid);
        let bathymetry = bathymetry.require_grid(&grid)?.into_array();
        let column =
            StratigraphicColumn::new(grid.x_max, grid.y_max, chrons_total, params.chrons_max)?;
        let draws = sampler.draw_table(params.mosaic.draws);
        let profile = profile_from_spec(&params.profile);
        // A rejecting curve may begin after start_time; that only matters once a chron needs it.
        let start_level = sea_level
            .level_at(params.start_time)
            .unwrap_or(params.init_sealevel);

        info!(
            "Engine ready: {} ({}x{} cells, {} chrons, sea level {}, profile {})",
            params.model_name,
            grid.x_max,
            grid.y_max,
            chrons_total,
            sea_level.name(),
            profile.name()
        );

        Ok(Self {
            params: params.clone(),
            grid,
            state: EngineState::Ready,
            chron: 0,
            chrons_total,
            initial_bathymetry: bathymetry.clone(),
            bathymetry,
            column,
            sea_level,
            start_level,
            profile,
            sampler,
            draws,
            patch_rng: ChaCha8Rng::seed_from_u64(stream_seed(params.seed, PATCH_STREAM)),
            reports: Vec::new(),
            failure: None,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Last completed chron (0 before the first step).
    pub fn current_chron(&self) -> usize {
        self.chron
    }

    pub fn chrons_total(&self) -> usize {
        self.chrons_total
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    /// Current seafloor surface.
    pub fn bathymetry(&self) -> &Array2<f64> {
        &self.bathymetry
    }

    pub fn column(&self) -> &StratigraphicColumn {
        &self.column
    }

    pub fn reports(&self) -> &[ChronReport] {
        &self.reports
    }

    pub fn mosaic_draws(&self) -> &[MosaicDraw] {
        &self.draws
    }

    /// Reason of the failure, if the engine failed.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Simulation time at the end of `chron`.
    pub fn time_of(&self, chron: usize) -> f64 {
        self.params.start_time + chron as f64 * self.params.time_step
    }

    /// Regenerates the mosaic draw table from a new seed. Only before the run starts.
    pub fn reseed_mosaic(&mut self, seed: u64) -> Result<()> {
        if self.state != EngineState::Ready {
            return Err(CarbonateError::InvalidState {
                operation: "reseed_mosaic",
                expected: "ready",
                actual: self.state.to_string(),
            });
        }
        self.sampler.reseed(seed);
        self.draws = self.sampler.draw_table(self.params.mosaic.draws);
        Ok(())
    }

    /// Advances one chron.
    ///
    /// Returns `Ok(None)` once the run is complete. A runtime error moves the
    /// engine to `Failed`; chrons already written stay valid.
    pub fn step(&mut self) -> Result<Option<ChronReport>> {
        match self.state {
            EngineState::Ready => self.state = EngineState::Running,
            EngineState::Running => {}
            EngineState::Completed => return Ok(None),
            EngineState::Failed => {
                return Err(CarbonateError::InvalidState {
                    operation: "step",
                    expected: "ready or running",
                    actual: self.state.to_string(),
                })
            }
        }

        match self.advance() {
            Ok(report) => {
                if self.chron == self.chrons_total {
                    self.state = EngineState::Completed;
                    info!(
                        "Run complete: {} chrons, final time {}",
                        self.chron,
                        self.time_of(self.chron)
                    );
                }
                Ok(Some(report))
            }
            Err(e) => {
                warn!("Chron {} failed: {}", self.chron + 1, e);
                self.state = EngineState::Failed;
                self.failure = Some(e.to_string());
                self.column.mark_incomplete();
                Err(e)
            }
        }
    }

    /// Runs every remaining chron.
    pub fn run(&mut self) -> Result<()> {
        while self.step()?.is_some() {}
        Ok(())
    }

    fn advance(&mut self) -> Result<ChronReport> {
        let chron = self.chron + 1;
        let time = self.time_of(chron);
        let sea_level = self.sea_level.level_at(time)?;

        let (weights, patches) = match self.params.distribute_type {
            DistributeType::Uniform => (self.grid.filled(1.0), 0),
            DistributeType::Mosaic => {
                let patches = place_patches(
                    &self.grid,
                    &self.draws,
                    self.params.mosaic.patches_per_chron,
                    &mut self.patch_rng,
                );
                (patch_weights(&self.grid, &patches), patches.len())
            }
        };

        let rule = DepositionRule {
            sea_level,
            time_step: self.params.time_step,
            subsidence_rate: self.params.subsidence_rate,
            growth_rates: &self.params.growth_rates,
            profile: self.profile.as_ref(),
        };
        let outcomes: Array2<CellOutcome> = Zip::from(&self.bathymetry)
            .and(&weights)
            .par_map_collect(|&elevation, &weight| rule.apply(elevation, weight));

        let thickness = outcomes.map(|o| o.thickness);
        let facies = outcomes.map(|o| o.facies);
        self.column.write_chron(chron, &thickness, &facies)?;

        let report = ChronReport {
            chron,
            time,
            sea_level,
            deposited_volume: thickness.sum() * self.grid.cell_area(),
            clamped_cells: outcomes.iter().filter(|o| o.clamped).count(),
            exposed_cells: facies.iter().filter(|&&f| f == Facies::Exposed).count(),
            patches,
        };

        if report.exposed_cells == self.grid.cell_count() {
            warn!("Chron {}: platform fully exposed at sea level {:.3}", chron, sea_level);
        }

        self.bathymetry = outcomes.map(|o| o.elevation);
        self.chron = chron;

        debug!(
            "chron {}/{} t={} sl={:.3} vol={:.3} clamped={} exposed={}",
            chron,
            self.chrons_total,
            time,
            sea_level,
            report.deposited_volume,
            report.clamped_cells,
            report.exposed_cells
        );
        self.reports.push(report);
        Ok(report)
    }

    /// Named output arrays. Only available once the run completed.
    pub fn outputs(&self) -> Result<ArrayBundle> {
        if self.state != EngineState::Completed {
            return Err(CarbonateError::InvalidState {
                operation: "outputs",
                expected: "completed",
                actual: self.state.to_string(),
            });
        }

        let mut sea_levels = Array2::zeros((self.reports.len() + 1, 2));
        sea_levels[[0, 0]] = self.params.start_time;
        sea_levels[[0, 1]] = self.start_level;
        for r in &self.reports {
            sea_levels[[r.chron, 0]] = r.time;
            sea_levels[[r.chron, 1]] = r.sea_level;
        }

        let mut bundle = ArrayBundle::new();
        bundle.insert("bathymetry", self.bathymetry.clone().into_dyn());
        bundle.insert("initial_bathymetry", self.initial_bathymetry.clone().into_dyn());
        bundle.insert("strat", self.column.thickness().clone().into_dyn());
        bundle.insert("facies", self.column.facies_codes().into_dyn());
        bundle.insert("sealevel", sea_levels.into_dyn());
        bundle.insert("mosaic_thick_distrib", draw_table_array(&self.draws).into_dyn());
        Ok(bundle)
    }
}
