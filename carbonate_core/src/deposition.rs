//! Per-cell deposition rule for one chron.
//!
//! A cell's outcome depends only on its own previous elevation and its patch
//! weight, so the rule can run over every cell in parallel.

use crate::facies::FaciesProfile;
use carbonate_env::{Facies, GrowthRates};

/// What happened to one cell in one chron.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellOutcome {
    pub facies: Facies,
    /// Thickness actually deposited (after the accommodation cap)
    pub thickness: f64,
    /// Elevation after deposition and subsidence
    pub elevation: f64,
    /// Growth exceeded accommodation and was cut back
    pub clamped: bool,
}

/// Chron-wide inputs shared by every cell.
#[derive(Debug, Clone, Copy)]
pub struct DepositionRule<'a> {
    pub sea_level: f64,
    pub time_step: f64,
    pub subsidence_rate: f64,
    pub growth_rates: &'a GrowthRates,
    pub profile: &'a dyn FaciesProfile,
}

impl DepositionRule<'_> {
    /// Applies the rule to a cell.
    ///
    /// `patch_weight` is 1 everywhere for uniform distribution. Under the
    /// mosaic policy it is 0 outside patches, where reef falls back to
    /// inter-reef lagoon.
    pub fn apply(&self, elevation: f64, patch_weight: f64) -> CellOutcome {
        let water_depth = self.sea_level - elevation;
        let mut facies = self.profile.classify(water_depth);
        let mut weight = 1.0;
        if facies == Facies::Reef {
            if patch_weight > 0.0 {
                weight = patch_weight;
            } else {
                facies = Facies::Lagoon;
            }
        }

        let growth = self.growth_rates.rate(facies) * self.time_step * weight;
        let accommodation = water_depth.max(0.0);
        let thickness = growth.min(accommodation);

        CellOutcome {
            facies,
            thickness,
            elevation: elevation + thickness - self.subsidence_rate * self.time_step,
            clamped: growth > accommodation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facies::{RampProfile, UniformProfile};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const REEF: UniformProfile = UniformProfile { facies: Facies::Reef };

    fn rule<'a>(rates: &'a GrowthRates, profile: &'a dyn FaciesProfile) -> DepositionRule<'a> {
        DepositionRule {
            sea_level: 0.0,
            time_step: 1.0,
            subsidence_rate: 0.0,
            growth_rates: rates,
            profile,
        }
    }

    #[test]
    fn test_growth_below_accommodation() {
        let rates = GrowthRates::uniform(1.0);
        let out = rule(&rates, &REEF).apply(-5.0, 1.0);
        assert_eq!(out.facies, Facies::Reef);
        assert_relative_eq!(out.thickness, 1.0);
        assert_relative_eq!(out.elevation, -4.0);
        assert!(!out.clamped);
    }

    #[test]
    fn test_growth_clamped_at_sea_level() {
        let rates = GrowthRates::uniform(100.0);
        let out = rule(&rates, &REEF).apply(-5.0, 1.0);
        assert_relative_eq!(out.thickness, 5.0);
        assert_relative_eq!(out.elevation, 0.0);
        assert!(out.clamped);
    }

    #[test]
    fn test_exposed_cell_only_subsides() {
        let rates = GrowthRates::uniform(1.0);
        let mut r = rule(&rates, &REEF);
        r.subsidence_rate = 0.25;
        r.time_step = 2.0;
        let out = r.apply(3.0, 1.0);
        assert_eq!(out.facies, Facies::Exposed);
        assert_eq!(out.thickness, 0.0);
        assert_relative_eq!(out.elevation, 2.5);
    }

    #[test]
    fn test_mosaic_weight_and_lagoon_fallback() {
        let rates = GrowthRates {
            reef: 2.0,
            lagoon: 0.5,
            oolite: 1.0,
            shale: 0.1,
        };
        let ramp = RampProfile {
            oolite_max_depth: 2.0,
            reef_max_depth: 10.0,
            lagoon_max_depth: 30.0,
        };
        let r = rule(&rates, &ramp);

        let inside = r.apply(-6.0, 0.75);
        assert_eq!(inside.facies, Facies::Reef);
        assert_relative_eq!(inside.thickness, 1.5);

        let outside = r.apply(-6.0, 0.0);
        assert_eq!(outside.facies, Facies::Lagoon);
        assert_relative_eq!(outside.thickness, 0.5);

        // weight only touches reef
        let shoal = r.apply(-1.0, 0.0);
        assert_eq!(shoal.facies, Facies::Oolite);
        assert_relative_eq!(shoal.thickness, 1.0);
    }

    proptest! {
        #[test]
        fn prop_never_deposits_above_sea_level(
            elevation in -200.0f64..50.0,
            sea_level in -20.0f64..20.0,
            rate in 0.0f64..500.0,
            dt in 0.01f64..10.0,
            weight in 0.0f64..1.0,
        ) {
            let rates = GrowthRates::uniform(rate);
            let ramp = RampProfile { oolite_max_depth: 2.0, reef_max_depth: 10.0, lagoon_max_depth: 30.0 };
            let r = DepositionRule {
                sea_level,
                time_step: dt,
                subsidence_rate: 0.0,
                growth_rates: &rates,
                profile: &ramp,
            };
            let out = r.apply(elevation, weight);
            prop_assert!(out.thickness >= 0.0);
            prop_assert!(out.thickness <= (sea_level - elevation).max(0.0));
        }
    }
}
