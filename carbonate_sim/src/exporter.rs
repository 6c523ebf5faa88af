//! JSON run-summary exporter.
//!
//! Exports the outcome of a run and its per-chron reports for downstream
//! plotting and CI checks.

use crate::runner::RunResult;
use carbonate_core::{ChronReport, EngineState};
use carbonate_env::{CarbonateError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Complete run summary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Model or scenario name
    pub model_name: String,

    /// Seed used
    pub seed: u64,

    pub state: EngineState,
    pub passed: bool,

    pub chrons_total: usize,
    pub chrons_written: usize,
    pub final_time: f64,

    /// Σ deposited volume over the run
    pub deposited_volume: f64,

    pub min_elevation: f64,
    pub max_elevation: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// Per-chron reports
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub chrons: Vec<ChronReport>,
}

impl RunSummary {
    /// Summarises a run. `with_chrons` keeps the per-chron reports.
    pub fn from_result(result: &RunResult, with_chrons: bool) -> Self {
        Self {
            model_name: result.model_name.clone(),
            seed: result.seed,
            state: result.state,
            passed: result.passed(),
            chrons_total: result.chrons_total,
            chrons_written: result.chrons_written,
            final_time: result.final_time,
            deposited_volume: result.deposited_volume(),
            min_elevation: result.bathymetry_range.0,
            max_elevation: result.bathymetry_range.1,
            output: result.output.as_ref().map(|p| p.display().to_string()),
            failure_reason: result.failure_reason.clone(),
            chrons: if with_chrons {
                result.reports.clone()
            } else {
                Vec::new()
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CarbonateError::invalid("summary", &self.model_name, e.to_string()))
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        let mut file = File::create(path).map_err(|e| CarbonateError::io(path, e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| CarbonateError::io(path, e))?;
        Ok(())
    }
}
