//! Simulation parameters and the JSON parameter-document loader.
//!
//! The document has the sections `main`, `grid`, `initial_conditions`,
//! `lithology`, `sealevel_conditions`, `carbonates_type` and `sediment`.
//! Deserialisation keeps every field optional so that a missing field can be
//! reported by its dotted path (`main.time_step`) instead of a serde position.

use crate::error::{CarbonateError, Result};
use crate::types::{Facies, GrowthRates};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default capacity of the stratigraphic column, in chrons.
pub const DEFAULT_CHRONS_MAX: usize = 2000;

/// Default upper bound for mosaic patch radii.
pub const DEFAULT_MOSAIC_MAX_RADIUS: u32 = 20;

/// Default number of draws in the mosaic draw table.
pub const DEFAULT_MOSAIC_DRAWS: usize = 9999;

// Default ramp depth bands (water depth, same unit as elevation).
const DEFAULT_OOLITE_MAX_DEPTH: f64 = 2.0;
const DEFAULT_REEF_MAX_DEPTH: f64 = 10.0;
const DEFAULT_LAGOON_MAX_DEPTH: f64 = 30.0;

/// Grid declaration. The grid holds `x_length + 1` by `y_length + 1` cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub x_length: usize,
    pub y_length: usize,
    pub grid_spacing: f64,
}

/// Where the initial seafloor comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum BathymetrySource {
    /// Sparse `X,Y,Z` samples in a delimited text file
    File(PathBuf),
    /// Uniform elevation everywhere
    Flat { elevation: f64 },
}

/// Behaviour of a file-driven sea-level curve outside its sampled range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extrapolation {
    /// Hold the boundary value
    #[default]
    Clamp,
    /// Fail the query with `OutOfRange`
    Reject,
}

/// One periodic sea-level component.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SeaLevelComponent {
    pub amplitude: f64,
    pub period: f64,
}

/// Sea-level model selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SeaLevelSpec {
    Constant,
    File {
        path: PathBuf,
        extrapolation: Extrapolation,
    },
    Components(Vec<SeaLevelComponent>),
}

/// How facies are spread laterally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistributeType {
    /// Every cell takes the facies its depth band gives
    #[default]
    Uniform,
    /// Reef grows only inside stochastic patches; inter-patch reef becomes lagoon
    Mosaic,
}

/// How water depth maps to facies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileSpec {
    /// Every submerged cell takes the same facies
    Uniform { facies: Facies },
    /// Depth bands: oolite shoals, then reef, then lagoon, then shale
    Ramp {
        oolite_max_depth: f64,
        reef_max_depth: f64,
        lagoon_max_depth: f64,
    },
}

impl ProfileSpec {
    /// Ramp with the default band limits.
    pub fn default_ramp() -> Self {
        ProfileSpec::Ramp {
            oolite_max_depth: DEFAULT_OOLITE_MAX_DEPTH,
            reef_max_depth: DEFAULT_REEF_MAX_DEPTH,
            lagoon_max_depth: DEFAULT_LAGOON_MAX_DEPTH,
        }
    }
}

/// Mosaic sampler and patch placement settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosaicSpec {
    pub max_radius: u32,
    pub draws: usize,
    pub patches_per_chron: f64,
}

impl Default for MosaicSpec {
    fn default() -> Self {
        Self {
            max_radius: DEFAULT_MOSAIC_MAX_RADIUS,
            draws: DEFAULT_MOSAIC_DRAWS,
            patches_per_chron: 4.0,
        }
    }
}

/// Immutable parameters for one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParameters {
    pub model_name: String,
    pub seed: u64,
    pub start_time: f64,
    pub end_time: f64,
    pub time_step: f64,
    pub chrons_max: usize,
    pub grid: GridSpec,
    pub initial_bathymetry: BathymetrySource,
    pub init_sealevel: f64,
    pub growth_rates: GrowthRates,
    pub sea_level: SeaLevelSpec,
    pub distribute_type: DistributeType,
    pub profile: ProfileSpec,
    pub mosaic: MosaicSpec,
    pub subsidence_rate: f64,
}

impl SimulationParameters {
    /// Creates parameters with the given time frame and grid, flat zero
    /// bathymetry, constant sea level at 0 and no growth.
    pub fn new(
        model_name: &str,
        start_time: f64,
        end_time: f64,
        time_step: f64,
        x_length: usize,
        y_length: usize,
    ) -> Self {
        Self {
            model_name: model_name.to_string(),
            seed: 42,
            start_time,
            end_time,
            time_step,
            chrons_max: DEFAULT_CHRONS_MAX,
            grid: GridSpec {
                x_length,
                y_length,
                grid_spacing: 1.0,
            },
            initial_bathymetry: BathymetrySource::Flat { elevation: 0.0 },
            init_sealevel: 0.0,
            growth_rates: GrowthRates::default(),
            sea_level: SeaLevelSpec::Constant,
            distribute_type: DistributeType::Uniform,
            profile: ProfileSpec::Uniform { facies: Facies::Reef },
            mosaic: MosaicSpec::default(),
            subsidence_rate: 0.0,
        }
    }

    /// Sets the master seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the growth-rate table.
    pub fn with_growth_rates(mut self, rates: GrowthRates) -> Self {
        self.growth_rates = rates;
        self
    }

    /// Sets the subsidence rate.
    pub fn with_subsidence(mut self, rate: f64) -> Self {
        self.subsidence_rate = rate;
        self
    }

    /// Sets the column capacity.
    pub fn with_chrons_max(mut self, chrons_max: usize) -> Self {
        self.chrons_max = chrons_max;
        self
    }

    /// Sets the facies profile.
    pub fn with_profile(mut self, profile: ProfileSpec) -> Self {
        self.profile = profile;
        self
    }

    /// Sets the lateral distribution policy.
    pub fn with_distribute(mut self, distribute: DistributeType) -> Self {
        self.distribute_type = distribute;
        self
    }

    /// Sets the initial sea level.
    pub fn with_init_sealevel(mut self, level: f64) -> Self {
        self.init_sealevel = level;
        self
    }

    /// Sets the sea-level model.
    pub fn with_sea_level(mut self, spec: SeaLevelSpec) -> Self {
        self.sea_level = spec;
        self
    }

    /// Sets the mosaic settings.
    pub fn with_mosaic(mut self, mosaic: MosaicSpec) -> Self {
        self.mosaic = mosaic;
        self
    }

    /// Sets the initial bathymetry source.
    pub fn with_bathymetry(mut self, source: BathymetrySource) -> Self {
        self.initial_bathymetry = source;
        self
    }

    /// Number of cells along x (`x_length + 1`).
    pub fn x_max(&self) -> usize {
        self.grid.x_length + 1
    }

    /// Number of cells along y (`y_length + 1`).
    pub fn y_max(&self) -> usize {
        self.grid.y_length + 1
    }

    /// Loads and validates a parameter document from disk.
    ///
    /// Relative file paths inside the document resolve against the
    /// document's own directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CarbonateError::io(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_json_str(&text, base)
    }

    /// Parses and validates a parameter document.
    pub fn from_json_str(text: &str, base_dir: &Path) -> Result<Self> {
        let doc: ParamDocument = serde_json::from_str(text)
            .map_err(|e| CarbonateError::config("<document>", e.to_string()))?;
        let params = doc.into_params(base_dir)?;
        params.validate()?;
        Ok(params)
    }

    /// Checks the invariants every component relies on.
    pub fn validate(&self) -> Result<()> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(CarbonateError::config(
                "main.time_step",
                format!("must be > 0, got {}", self.time_step),
            ));
        }
        if !(self.start_time.is_finite() && self.end_time.is_finite()) {
            return Err(CarbonateError::config("main.start_time", "times must be finite"));
        }
        if self.end_time <= self.start_time {
            return Err(CarbonateError::config(
                "main.end_time",
                format!(
                    "must be greater than start_time ({} <= {})",
                    self.end_time, self.start_time
                ),
            ));
        }
        if self.chrons_max == 0 {
            return Err(CarbonateError::config("main.chrons_max", "must be >= 1"));
        }
        if self.grid.x_length < 1 {
            return Err(CarbonateError::config("grid.x_length", "must be >= 1"));
        }
        if self.grid.y_length < 1 {
            return Err(CarbonateError::config("grid.y_length", "must be >= 1"));
        }
        if !(self.grid.grid_spacing.is_finite() && self.grid.grid_spacing > 0.0) {
            return Err(CarbonateError::config(
                "grid.grid_spacing",
                format!("must be > 0, got {}", self.grid.grid_spacing),
            ));
        }
        for facies in Facies::DEPOSITIONAL {
            let rate = self.growth_rates.rate(facies);
            if !(rate.is_finite() && rate >= 0.0) {
                return Err(CarbonateError::config(
                    format!("lithology.{}", facies.name()),
                    format!("growth rate must be finite and >= 0, got {}", rate),
                ));
            }
        }
        if !self.subsidence_rate.is_finite() {
            return Err(CarbonateError::config("sediment.subsidence_rate", "must be finite"));
        }
        if let ProfileSpec::Ramp {
            oolite_max_depth,
            reef_max_depth,
            lagoon_max_depth,
        } = self.profile
        {
            let ascending = 0.0 <= oolite_max_depth
                && oolite_max_depth <= reef_max_depth
                && reef_max_depth <= lagoon_max_depth;
            if !ascending {
                return Err(CarbonateError::config(
                    "carbonates_type.profile_type",
                    format!(
                        "ramp depth bands must ascend: oolite {} <= reef {} <= lagoon {}",
                        oolite_max_depth, reef_max_depth, lagoon_max_depth
                    ),
                ));
            }
        }
        if !(self.mosaic.patches_per_chron.is_finite() && self.mosaic.patches_per_chron >= 0.0) {
            return Err(CarbonateError::config(
                "carbonates_type.patches_per_chron",
                format!("must be >= 0, got {}", self.mosaic.patches_per_chron),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// DOCUMENT SHAPE
// =============================================================================

/// A number written either as a JSON number or as a numeric string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn value(&self, field: &str) -> Result<f64> {
        match self {
            Numeric::Number(v) => Ok(*v),
            Numeric::Text(s) => s.trim().parse::<f64>().map_err(|_| {
                CarbonateError::config(field, format!("expected a number, got {:?}", s))
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(f64),
    Many(Vec<f64>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<f64> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ParamDocument {
    main: Option<MainSection>,
    grid: Option<GridSection>,
    initial_conditions: Option<InitialSection>,
    #[serde(alias = "lithlogoy")]
    lithology: Option<LithologySection>,
    sealevel_conditions: Option<SeaLevelSection>,
    carbonates_type: Option<CarbonatesSection>,
    sediment: Option<SedimentSection>,
}

#[derive(Debug, Deserialize)]
struct MainSection {
    model_name: Option<String>,
    start_time: Option<f64>,
    end_time: Option<f64>,
    time_step: Option<f64>,
    seed: Option<u64>,
    chrons_max: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct GridSection {
    x_length: Option<usize>,
    y_length: Option<usize>,
    grid_spacing: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct InitialSection {
    #[serde(alias = "initial_bathmetry_type")]
    initial_bathymetry_type: Option<String>,
    #[serde(alias = "initial_bathmetry_file")]
    initial_bathymetry_file: Option<String>,
    initial_elevation: Option<f64>,
    init_sealevel: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct LithologySection {
    reef: Option<Numeric>,
    lagoon: Option<Numeric>,
    oolite: Option<Numeric>,
    shale: Option<Numeric>,
}

#[derive(Debug, Deserialize)]
struct SeaLevelSection {
    sealevel_type: Option<String>,
    sealevel_file: Option<String>,
    sealevel_components: Option<Vec<SeaLevelComponent>>,
    sealevel_amp: Option<OneOrMany>,
    sealevel_period: Option<OneOrMany>,
    extrapolation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CarbonatesSection {
    distribute_type: Option<String>,
    profile_type: Option<String>,
    mosaic_max_radius: Option<u32>,
    mosaic_draws: Option<usize>,
    patches_per_chron: Option<f64>,
    oolite_max_depth: Option<f64>,
    reef_max_depth: Option<f64>,
    lagoon_max_depth: Option<f64>,
    uniform_facies: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SedimentSection {
    subsidence_rate: Option<f64>,
}

fn require<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| CarbonateError::config(field, "missing required field"))
}

fn resolve(base_dir: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    }
}

impl ParamDocument {
    fn into_params(self, base_dir: &Path) -> Result<SimulationParameters> {
        let main = require(self.main, "main")?;
        let grid = require(self.grid, "grid")?;
        let initial = require(self.initial_conditions, "initial_conditions")?;
        let lithology = require(self.lithology, "lithology")?;
        let sealevel = require(self.sealevel_conditions, "sealevel_conditions")?;
        let carbonates = require(self.carbonates_type, "carbonates_type")?;
        let sediment = require(self.sediment, "sediment")?;

        let grid = GridSpec {
            x_length: require(grid.x_length, "grid.x_length")?,
            y_length: require(grid.y_length, "grid.y_length")?,
            grid_spacing: require(grid.grid_spacing, "grid.grid_spacing")?,
        };

        let bathy_type = initial
            .initial_bathymetry_type
            .unwrap_or_else(|| "file".to_string());
        let initial_bathymetry = match bathy_type.to_lowercase().as_str() {
            "file" => {
                let file = require(
                    initial.initial_bathymetry_file,
                    "initial_conditions.initial_bathymetry_file",
                )?;
                BathymetrySource::File(resolve(base_dir, &file))
            }
            "flat" => BathymetrySource::Flat {
                elevation: initial.initial_elevation.unwrap_or(0.0),
            },
            other => {
                return Err(CarbonateError::config(
                    "initial_conditions.initial_bathymetry_type",
                    format!("unknown bathymetry type {:?} (expected file or flat)", other),
                ))
            }
        };

        let growth_rates = GrowthRates {
            reef: require(lithology.reef, "lithology.reef")?.value("lithology.reef")?,
            lagoon: require(lithology.lagoon, "lithology.lagoon")?.value("lithology.lagoon")?,
            oolite: require(lithology.oolite, "lithology.oolite")?.value("lithology.oolite")?,
            shale: require(lithology.shale, "lithology.shale")?.value("lithology.shale")?,
        };

        let sea_level = parse_sea_level(sealevel, base_dir)?;

        let distribute_type = match require(
            carbonates.distribute_type,
            "carbonates_type.distribute_type",
        )?
        .to_lowercase()
        .as_str()
        {
            "uniform" => DistributeType::Uniform,
            "mosaic" => DistributeType::Mosaic,
            other => {
                return Err(CarbonateError::config(
                    "carbonates_type.distribute_type",
                    format!("unknown distribution {:?} (expected uniform or mosaic)", other),
                ))
            }
        };

        let profile = match require(carbonates.profile_type, "carbonates_type.profile_type")?
            .to_lowercase()
            .as_str()
        {
            "uniform" => {
                let facies = match carbonates.uniform_facies {
                    Some(name) => name.parse::<Facies>().map_err(|e| {
                        CarbonateError::config("carbonates_type.uniform_facies", e)
                    })?,
                    None => Facies::Reef,
                };
                if facies == Facies::Exposed {
                    return Err(CarbonateError::config(
                        "carbonates_type.uniform_facies",
                        "must be a depositing facies",
                    ));
                }
                ProfileSpec::Uniform { facies }
            }
            "ramp" => ProfileSpec::Ramp {
                oolite_max_depth: carbonates.oolite_max_depth.unwrap_or(DEFAULT_OOLITE_MAX_DEPTH),
                reef_max_depth: carbonates.reef_max_depth.unwrap_or(DEFAULT_REEF_MAX_DEPTH),
                lagoon_max_depth: carbonates.lagoon_max_depth.unwrap_or(DEFAULT_LAGOON_MAX_DEPTH),
            },
            other => {
                return Err(CarbonateError::config(
                    "carbonates_type.profile_type",
                    format!("unknown profile {:?} (expected uniform or ramp)", other),
                ))
            }
        };

        let defaults = MosaicSpec::default();
        let mosaic = MosaicSpec {
            max_radius: carbonates.mosaic_max_radius.unwrap_or(defaults.max_radius),
            draws: carbonates.mosaic_draws.unwrap_or(defaults.draws),
            patches_per_chron: carbonates
                .patches_per_chron
                .unwrap_or(defaults.patches_per_chron),
        };

        Ok(SimulationParameters {
            model_name: require(main.model_name, "main.model_name")?,
            seed: main.seed.unwrap_or(42),
            start_time: require(main.start_time, "main.start_time")?,
            end_time: require(main.end_time, "main.end_time")?,
            time_step: require(main.time_step, "main.time_step")?,
            chrons_max: main.chrons_max.unwrap_or(DEFAULT_CHRONS_MAX),
            grid,
            initial_bathymetry,
            init_sealevel: require(initial.init_sealevel, "initial_conditions.init_sealevel")?,
            growth_rates,
            sea_level,
            distribute_type,
            profile,
            mosaic,
            subsidence_rate: require(sediment.subsidence_rate, "sediment.subsidence_rate")?,
        })
    }
}

fn parse_sea_level(section: SeaLevelSection, base_dir: &Path) -> Result<SeaLevelSpec> {
    let kind = require(section.sealevel_type, "sealevel_conditions.sealevel_type")?;
    match kind.to_lowercase().as_str() {
        "constant" => Ok(SeaLevelSpec::Constant),
        "file" | "curve" => {
            let file = require(section.sealevel_file, "sealevel_conditions.sealevel_file")?;
            let extrapolation = match section
                .extrapolation
                .as_deref()
                .map(str::to_lowercase)
                .as_deref()
            {
                None | Some("clamp") => Extrapolation::Clamp,
                Some("reject") => Extrapolation::Reject,
                Some(other) => {
                    return Err(CarbonateError::config(
                        "sealevel_conditions.extrapolation",
                        format!("unknown mode {:?} (expected clamp or reject)", other),
                    ))
                }
            };
            Ok(SeaLevelSpec::File {
                path: resolve(base_dir, &file),
                extrapolation,
            })
        }
        "components" | "periodic" | "sine" => {
            let mut components = section.sealevel_components.unwrap_or_default();
            match (section.sealevel_amp, section.sealevel_period) {
                (Some(amp), Some(period)) => {
                    let amps = amp.into_vec();
                    let periods = period.into_vec();
                    if amps.len() != periods.len() {
                        return Err(CarbonateError::config(
                            "sealevel_conditions.sealevel_period",
                            format!(
                                "{} amplitudes but {} periods",
                                amps.len(),
                                periods.len()
                            ),
                        ));
                    }
                    components.extend(
                        amps.into_iter()
                            .zip(periods)
                            .map(|(amplitude, period)| SeaLevelComponent { amplitude, period }),
                    );
                }
                (Some(_), None) => {
                    return Err(CarbonateError::config(
                        "sealevel_conditions.sealevel_period",
                        "sealevel_amp given without sealevel_period",
                    ))
                }
                (None, Some(_)) => {
                    return Err(CarbonateError::config(
                        "sealevel_conditions.sealevel_amp",
                        "sealevel_period given without sealevel_amp",
                    ))
                }
                (None, None) => {}
            }
            if components.is_empty() {
                return Err(CarbonateError::config(
                    "sealevel_conditions.sealevel_components",
                    "component model needs at least one {amplitude, period}",
                ));
            }
            Ok(SeaLevelSpec::Components(components))
        }
        other => Err(CarbonateError::config(
            "sealevel_conditions.sealevel_type",
            format!("unknown model {:?} (expected constant, file or components)", other),
        )),
    }
}
