//! Built-in platform scenarios.
//!
//! Each scenario is a complete parameter set plus a synthetic initial
//! surface, so it runs without any input files.

use carbonate_core::{BathymetryField, Grid};
use carbonate_env::{
    DistributeType, Facies, GrowthRates, MosaicSpec, ProfileSpec, SeaLevelComponent,
    SeaLevelSpec, SimulationParameters,
};
use ndarray::Array2;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// 2×2 reef at −5 m, constant sea level, three chrons
    FlatReef,

    /// Seaward-dipping ramp under a single sea-level cycle
    Ramp,

    /// Subsidence outpaces reef growth
    Drowning,

    /// Patchy reef mosaic over a flat shelf
    MosaicReef,

    /// Two superposed sea-level cycles over a ramp
    GlacialCycles,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::FlatReef,
            ScenarioId::Ramp,
            ScenarioId::Drowning,
            ScenarioId::MosaicReef,
            ScenarioId::GlacialCycles,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::FlatReef => "flat_reef",
            ScenarioId::Ramp => "ramp",
            ScenarioId::Drowning => "drowning",
            ScenarioId::MosaicReef => "mosaic_reef",
            ScenarioId::GlacialCycles => "glacial_cycles",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::FlatReef => "2x2 reef at -5 m, constant sea level, 1 m/step for 3 steps",
            ScenarioId::Ramp => "Ramp dipping to -40 m, 100 chrons, one 5 m sea-level cycle",
            ScenarioId::Drowning => "Reef at -3 m growing 0.5 m/step while subsiding 1 m/step",
            ScenarioId::MosaicReef => "60x60 shelf at -6 m with Poisson-placed reef patches",
            ScenarioId::GlacialCycles => "Ramp under 10 m / 100 and 3 m / 20 sea-level cycles",
        }
    }

    /// Parameters of the scenario, with the given master seed.
    pub fn parameters(&self, seed: u64) -> SimulationParameters {
        let carbonate = GrowthRates {
            reef: 2.0,
            lagoon: 0.4,
            oolite: 1.2,
            shale: 0.05,
        };
        let params = match self {
            ScenarioId::FlatReef => SimulationParameters::new(self.name(), 0.0, 3.0, 1.0, 1, 1)
                .with_growth_rates(GrowthRates {
                    reef: 1.0,
                    ..GrowthRates::default()
                }),
            ScenarioId::Ramp => SimulationParameters::new(self.name(), 0.0, 100.0, 1.0, 40, 20)
                .with_growth_rates(carbonate)
                .with_profile(ProfileSpec::default_ramp())
                .with_subsidence(0.2)
                .with_sea_level(SeaLevelSpec::Components(vec![SeaLevelComponent {
                    amplitude: 5.0,
                    period: 50.0,
                }])),
            ScenarioId::Drowning => SimulationParameters::new(self.name(), 0.0, 20.0, 1.0, 10, 10)
                .with_growth_rates(GrowthRates {
                    reef: 0.5,
                    ..GrowthRates::default()
                })
                .with_profile(ProfileSpec::Uniform { facies: Facies::Reef })
                .with_subsidence(1.0),
            ScenarioId::MosaicReef => SimulationParameters::new(self.name(), 0.0, 50.0, 1.0, 60, 60)
                .with_growth_rates(carbonate)
                .with_profile(ProfileSpec::default_ramp())
                .with_distribute(DistributeType::Mosaic)
                .with_mosaic(MosaicSpec {
                    patches_per_chron: 6.0,
                    ..MosaicSpec::default()
                })
                .with_subsidence(0.5),
            ScenarioId::GlacialCycles => {
                SimulationParameters::new(self.name(), 0.0, 400.0, 2.0, 50, 10)
                    .with_growth_rates(carbonate)
                    .with_profile(ProfileSpec::default_ramp())
                    .with_subsidence(0.1)
                    .with_sea_level(SeaLevelSpec::Components(vec![
                        SeaLevelComponent {
                            amplitude: 10.0,
                            period: 100.0,
                        },
                        SeaLevelComponent {
                            amplitude: 3.0,
                            period: 20.0,
                        },
                    ]))
            }
        };
        params.with_seed(seed)
    }

    /// Initial surface on the scenario's grid.
    pub fn bathymetry(&self, grid: &Grid) -> BathymetryField {
        match self {
            ScenarioId::FlatReef => BathymetryField::flat(grid, -5.0),
            ScenarioId::Drowning => BathymetryField::flat(grid, -3.0),
            ScenarioId::MosaicReef => BathymetryField::flat(grid, -6.0),
            ScenarioId::Ramp => ramp_surface(grid, 2.0, -40.0),
            ScenarioId::GlacialCycles => ramp_surface(grid, 5.0, -60.0),
        }
    }
}

/// Linear dip along x from `shore` at x = 0 to `basin` at the far edge.
fn ramp_surface(grid: &Grid, shore: f64, basin: f64) -> BathymetryField {
    let span = grid.x_max.saturating_sub(1).max(1) as f64;
    let surface = Array2::from_shape_fn(grid.shape(), |(x, _)| {
        shore + (basin - shore) * x as f64 / span
    });
    BathymetryField::from_array(surface)
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat_reef" | "flatreef" | "e2e" => Ok(ScenarioId::FlatReef),
            "ramp" => Ok(ScenarioId::Ramp),
            "drowning" | "drown" => Ok(ScenarioId::Drowning),
            "mosaic_reef" | "mosaicreef" | "mosaic" => Ok(ScenarioId::MosaicReef),
            "glacial_cycles" | "glacialcycles" | "glacial" => Ok(ScenarioId::GlacialCycles),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for id in ScenarioId::all() {
            assert_eq!(id.name().parse::<ScenarioId>(), Ok(id));
            assert_eq!(id.to_string(), id.name());
        }
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }

    #[test]
    fn test_parameters_are_valid() {
        for id in ScenarioId::all() {
            let params = id.parameters(3);
            params.validate().unwrap();
            assert_eq!(params.seed, 3);
            assert_eq!(params.model_name, id.name());

            let grid = Grid::from_spec(&params.grid);
            assert_eq!(id.bathymetry(&grid).shape(), grid.shape());
        }
    }

    #[test]
    fn test_ramp_surface_dips_seaward() {
        let grid = Grid::new(5, 2, 1.0);
        let surface = ramp_surface(&grid, 2.0, -6.0);
        assert_eq!(surface.get(0, 1), Some(2.0));
        assert_eq!(surface.get(2, 0), Some(-2.0));
        assert_eq!(surface.get(4, 1), Some(-6.0));
    }
}
