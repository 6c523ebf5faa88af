//! Simulation runner - load, run the engine, write the container.

use crate::context::RunContext;
use crate::scenarios::ScenarioId;

use carbonate_core::{BathymetryField, ChronReport, EngineState, Grid, SeaLevelCurve, StratEngine};
use carbonate_env::{ContainerWriter, Result, SimulationParameters};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Results from one simulation run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Model or scenario name
    pub model_name: String,

    /// Master seed used
    pub seed: u64,

    /// Final engine state
    pub state: EngineState,

    /// Chrons planned for the run
    pub chrons_total: usize,

    /// Chrons actually written to the column
    pub chrons_written: usize,

    /// Simulation time reached
    pub final_time: f64,

    /// Final surface range (min, max)
    pub bathymetry_range: (f64, f64),

    /// Container written on success
    pub output: Option<PathBuf>,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Per-chron reports
    pub reports: Vec<ChronReport>,
}

impl RunResult {
    pub fn passed(&self) -> bool {
        self.state == EngineState::Completed && self.failure_reason.is_none()
    }

    /// Σ deposited volume over every chron.
    pub fn deposited_volume(&self) -> f64 {
        self.reports.iter().map(|r| r.deposited_volume).sum()
    }
}

/// Runs a simulation end to end.
pub struct SimulationRunner {
    /// Seed bookkeeping
    context: RunContext,

    /// Container path; `None` skips writing
    output: Option<PathBuf>,
}

impl SimulationRunner {
    /// Creates a runner for the given context.
    pub fn new(context: RunContext) -> Self {
        Self {
            context,
            output: None,
        }
    }

    /// Sets the container path.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// Runs the model described by a parameter file.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<RunResult> {
        let path = path.as_ref();
        info!("Loading parameters from {}", path.display());
        let params = SimulationParameters::load(path)?;
        self.run_params(&params)
    }

    /// Runs a model, loading its initial surface from the configured source.
    pub fn run_params(&self, params: &SimulationParameters) -> Result<RunResult> {
        let params = self.context.apply(params);
        let grid = Grid::from_spec(&params.grid);
        let bathymetry = BathymetryField::load(&params.initial_bathymetry, &grid)?;
        self.run_with(&params, bathymetry)
    }

    /// Runs a built-in scenario.
    pub fn run_scenario(&self, scenario: ScenarioId) -> Result<RunResult> {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.context.seed());
        info!("  {}", scenario.description());
        let params = scenario.parameters(self.context.seed());
        let grid = Grid::from_spec(&params.grid);
        let bathymetry = scenario.bathymetry(&grid);
        self.run_with(&params, bathymetry)
    }

    /// Runs the engine over an already loaded surface.
    ///
    /// Setup errors are returned as `Err`. A failure during the run is
    /// reported in the result instead, with the chrons written so far.
    pub fn run_with(
        &self,
        params: &SimulationParameters,
        bathymetry: BathymetryField,
    ) -> Result<RunResult> {
        let params = self.context.apply(params);
        let sea_level = SeaLevelCurve::from_spec(&params.sea_level, params.init_sealevel)?;
        let sampler = self.context.sampler(&params.mosaic)?;
        let mut engine = StratEngine::new(&params, bathymetry, sea_level, sampler)?;

        let failure_reason = match engine.run() {
            Ok(()) => None,
            Err(e) => {
                error!("✗ {} failed at chron {}: {}", params.model_name, engine.current_chron() + 1, e);
                Some(e.to_string())
            }
        };

        let mut output = None;
        if engine.state() == EngineState::Completed {
            if let Some(path) = &self.output {
                let bundle = engine.outputs()?;
                ContainerWriter::new(path).write(&bundle)?;
                info!("Wrote {} arrays to {}", bundle.len(), path.display());
                output = Some(path.clone());
            }
        } else if self.output.is_some() {
            warn!("Run did not complete; no container written");
        }

        let range = BathymetryField::from_array(engine.bathymetry().clone()).range();

        Ok(RunResult {
            model_name: params.model_name.clone(),
            seed: self.context.seed(),
            state: engine.state(),
            chrons_total: engine.chrons_total(),
            chrons_written: engine.column().written_chrons(),
            final_time: engine.time_of(engine.current_chron()),
            bathymetry_range: range,
            output,
            failure_reason,
            reports: engine.reports().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use carbonate_env::{read_container, CarbonateError, Extrapolation, GrowthRates, SeaLevelSpec};
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("carbonate_runner_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_flat_reef_scenario_writes_container() {
        let dir = temp_dir("flat");
        let path = dir.join("flat_reef.cstr");
        let runner = SimulationRunner::new(RunContext::new(42)).with_output(&path);

        let result = runner.run_scenario(ScenarioId::FlatReef).unwrap();
        assert!(result.passed());
        assert_eq!(result.chrons_written, 3);
        assert_relative_eq!(result.final_time, 3.0);
        assert_relative_eq!(result.bathymetry_range.1, -2.0);
        assert_relative_eq!(result.deposited_volume(), 12.0);

        let bundle = read_container(&path).unwrap();
        assert_eq!(bundle.get("strat").unwrap().shape(), &[2, 2, 4]);
        assert_eq!(bundle.get("facies").unwrap().shape(), &[2, 2, 4]);
        assert_eq!(bundle.len(), 6);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_parameter_file_run() {
        let dir = temp_dir("file");
        fs::write(dir.join("bathy.csv"), "0,0,-5\n0,1,-5\n1,0,-5\n1,1,-5\n").unwrap();
        fs::write(
            dir.join("model.json"),
            r#"{
                "main": {"model_name": "file_model", "start_time": 0, "end_time": 3, "time_step": 1},
                "grid": {"x_length": 1, "y_length": 1, "grid_spacing": 1},
                "initial_conditions": {
                    "initial_bathymetry_type": "file",
                    "initial_bathymetry_file": "bathy.csv",
                    "init_sealevel": 0
                },
                "lithology": {"reef": 1, "lagoon": 0, "oolite": 0, "shale": 0},
                "sealevel_conditions": {"sealevel_type": "constant"},
                "carbonates_type": {"distribute_type": "uniform", "profile_type": "uniform"},
                "sediment": {"subsidence_rate": 0}
            }"#,
        )
        .unwrap();

        let runner = SimulationRunner::new(RunContext::new(1));
        let result = runner.run_file(dir.join("model.json")).unwrap();
        assert!(result.passed());
        assert_eq!(result.model_name, "file_model");
        assert!(result.output.is_none());
        assert_relative_eq!(result.bathymetry_range.0, -2.0);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_runtime_failure_is_reported() {
        let dir = temp_dir("fail");
        let path = dir.join("never.cstr");
        let samples = dir.join("curve.csv");
        fs::write(&samples, "0,0\n1,0\n").unwrap();

        let params = ScenarioId::FlatReef
            .parameters(5)
            .with_sea_level(SeaLevelSpec::File {
                path: samples,
                extrapolation: Extrapolation::Reject,
            });
        let runner = SimulationRunner::new(RunContext::new(5)).with_output(&path);
        let grid = Grid::from_spec(&params.grid);
        let result = runner.run_with(&params, BathymetryField::flat(&grid, -5.0)).unwrap();

        assert!(!result.passed());
        assert_eq!(result.state, EngineState::Failed);
        assert_eq!(result.chrons_written, 1);
        assert!(result.failure_reason.is_some());
        assert!(result.output.is_none());
        assert!(!path.exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_setup_error_is_returned() {
        let params = SimulationParameters::new("big", 0.0, 10_000.0, 1.0, 1, 1)
            .with_growth_rates(GrowthRates::uniform(1.0));
        let runner = SimulationRunner::new(RunContext::new(1));
        assert!(matches!(
            runner.run_params(&params),
            Err(CarbonateError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_mosaic_reports_follow_seed() {
        let a = SimulationRunner::new(RunContext::new(1))
            .run_scenario(ScenarioId::MosaicReef)
            .unwrap();
        let b = SimulationRunner::new(RunContext::new(1))
            .run_scenario(ScenarioId::MosaicReef)
            .unwrap();
        let c = SimulationRunner::new(RunContext::new(2))
            .run_scenario(ScenarioId::MosaicReef)
            .unwrap();
        assert_eq!(a.reports, b.reports);
        assert_ne!(a.reports, c.reports);
    }
}
