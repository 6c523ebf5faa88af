//! Facies zonation policies: water depth → facies.
//!
//! Thresholds belong to the policy, never to the engine. Cells at or above
//! sea level are always [`Facies::Exposed`].

use carbonate_env::{Facies, ProfileSpec};

/// Maps water depth to a facies.
pub trait FaciesProfile: Send + Sync + std::fmt::Debug {
    /// Classify a cell with the given water depth (sea level minus elevation).
    fn classify(&self, water_depth: f64) -> Facies;

    /// Returns the name of this profile.
    fn name(&self) -> &str;
}

/// Every submerged cell gets the same facies.
#[derive(Debug, Clone, Copy)]
pub struct UniformProfile {
    pub facies: Facies,
}

impl FaciesProfile for UniformProfile {
    fn classify(&self, water_depth: f64) -> Facies {
        if water_depth > 0.0 {
            self.facies
        } else {
            Facies::Exposed
        }
    }

    fn name(&self) -> &str {
        "uniform"
    }
}

/// Carbonate ramp: oolite shoals in the shallowest water, reef below,
/// then lagoon, with shale beyond the deepest band.
#[derive(Debug, Clone, Copy)]
pub struct RampProfile {
    pub oolite_max_depth: f64,
    pub reef_max_depth: f64,
    pub lagoon_max_depth: f64,
}

impl FaciesProfile for RampProfile {
    fn classify(&self, water_depth: f64) -> Facies {
        if water_depth <= 0.0 {
            Facies::Exposed
        } else if water_depth <= self.oolite_max_depth {
            Facies::Oolite
        } else if water_depth <= self.reef_max_depth {
            Facies::Reef
        } else if water_depth <= self.lagoon_max_depth {
            Facies::Lagoon
        } else {
            Facies::Shale
        }
    }

    fn name(&self) -> &str {
        "ramp"
    }
}

/// Creates the profile selected in the parameters.
pub fn profile_from_spec(spec: &ProfileSpec) -> Box<dyn FaciesProfile> {
    match *spec {
        ProfileSpec::Uniform { facies } => Box::new(UniformProfile { facies }),
        ProfileSpec::Ramp {
            oolite_max_depth,
            reef_max_depth,
            lagoon_max_depth,
        } => Box::new(RampProfile {
            oolite_max_depth,
            reef_max_depth,
            lagoon_max_depth,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ramp_bands() {
        let ramp = profile_from_spec(&ProfileSpec::default_ramp());
        assert_eq!(ramp.name(), "ramp");
        assert_eq!(ramp.classify(-1.0), Facies::Exposed);
        assert_eq!(ramp.classify(0.0), Facies::Exposed);
        assert_eq!(ramp.classify(1.0), Facies::Oolite);
        assert_eq!(ramp.classify(2.0), Facies::Oolite);
        assert_eq!(ramp.classify(5.0), Facies::Reef);
        assert_eq!(ramp.classify(20.0), Facies::Lagoon);
        assert_eq!(ramp.classify(300.0), Facies::Shale);
    }

    #[test]
    fn test_uniform_profile() {
        let uniform = profile_from_spec(&ProfileSpec::Uniform { facies: Facies::Lagoon });
        assert_eq!(uniform.classify(0.01), Facies::Lagoon);
        assert_eq!(uniform.classify(1e4), Facies::Lagoon);
        assert_eq!(uniform.classify(-0.5), Facies::Exposed);
    }
}
