//! Common types shared by the loader, the engine and the writer.

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sediment classification assigned to a cell in a given chron.
///
/// The numeric codes are stable: they are what the `facies` output array holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facies {
    /// At or above sea level, nothing deposited
    #[default]
    Exposed,
    Reef,
    Lagoon,
    Oolite,
    Shale,
}

impl Facies {
    /// All depositing facies, in code order.
    pub const DEPOSITIONAL: [Facies; 4] = [Facies::Reef, Facies::Lagoon, Facies::Oolite, Facies::Shale];

    /// Returns the stable numeric code.
    pub fn code(self) -> u8 {
        match self {
            Facies::Exposed => 0,
            Facies::Reef => 1,
            Facies::Lagoon => 2,
            Facies::Oolite => 3,
            Facies::Shale => 4,
        }
    }

    /// Inverse of [`Facies::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Facies::Exposed),
            1 => Some(Facies::Reef),
            2 => Some(Facies::Lagoon),
            3 => Some(Facies::Oolite),
            4 => Some(Facies::Shale),
            _ => None,
        }
    }

    /// Returns the facies name.
    pub fn name(&self) -> &'static str {
        match self {
            Facies::Exposed => "exposed",
            Facies::Reef => "reef",
            Facies::Lagoon => "lagoon",
            Facies::Oolite => "oolite",
            Facies::Shale => "shale",
        }
    }
}

impl std::fmt::Display for Facies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Facies {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "exposed" => Ok(Facies::Exposed),
            "reef" => Ok(Facies::Reef),
            "lagoon" => Ok(Facies::Lagoon),
            "oolite" => Ok(Facies::Oolite),
            "shale" => Ok(Facies::Shale),
            _ => Err(format!("Unknown facies: {}", s)),
        }
    }
}

/// Growth rate per lithology, in thickness units per time unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GrowthRates {
    pub reef: f64,
    pub lagoon: f64,
    pub oolite: f64,
    pub shale: f64,
}

impl GrowthRates {
    /// Same rate for every lithology.
    pub fn uniform(rate: f64) -> Self {
        Self {
            reef: rate,
            lagoon: rate,
            oolite: rate,
            shale: rate,
        }
    }

    /// Rate for a facies; exposed cells never grow.
    pub fn rate(&self, facies: Facies) -> f64 {
        match facies {
            Facies::Exposed => 0.0,
            Facies::Reef => self.reef,
            Facies::Lagoon => self.lagoon,
            Facies::Oolite => self.oolite,
            Facies::Shale => self.shale,
        }
    }
}

/// Explicit name → dense array mapping handed to the writer.
///
/// Names are kept sorted so the container layout does not depend on
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayBundle {
    arrays: BTreeMap<String, ArrayD<f64>>,
}

impl ArrayBundle {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a named array.
    pub fn insert(&mut self, name: impl Into<String>, array: ArrayD<f64>) {
        self.arrays.insert(name.into(), array);
    }

    /// Returns the array stored under `name`.
    pub fn get(&self, name: &str) -> Option<&ArrayD<f64>> {
        self.arrays.get(name)
    }

    /// Iterates entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArrayD<f64>)> {
        self.arrays.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the entry names in order.
    pub fn names(&self) -> Vec<&str> {
        self.arrays.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_facies_codes_roundtrip() {
        for code in 0..=4u8 {
            let facies = Facies::from_code(code).unwrap();
            assert_eq!(facies.code(), code);
        }
        assert_eq!(Facies::from_code(5), None);
        assert_eq!("Reef".parse::<Facies>().unwrap(), Facies::Reef);
    }

    #[test]
    fn test_exposed_never_grows() {
        let rates = GrowthRates::uniform(3.0);
        assert_eq!(rates.rate(Facies::Exposed), 0.0);
        assert_eq!(rates.rate(Facies::Shale), 3.0);
    }

    #[test]
    fn test_bundle_is_name_ordered() {
        let mut bundle = ArrayBundle::new();
        bundle.insert("strat", ArrayD::zeros(IxDyn(&[1, 1, 1])));
        bundle.insert("bathymetry", ArrayD::zeros(IxDyn(&[1, 1])));
        assert_eq!(bundle.names(), vec!["bathymetry", "strat"]);
        assert_eq!(bundle.len(), 2);
    }
}
