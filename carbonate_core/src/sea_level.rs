//! Eustatic sea-level models.
//!
//! A curve is a pure function of time. All validation happens at
//! construction; the only query-time failures are a non-finite time and,
//! for sampled curves configured with [`Extrapolation::Reject`], a time
//! outside the sampled range.

use carbonate_env::{
    read_sea_level_curve, CarbonateError, Extrapolation, Result, SeaLevelComponent, SeaLevelSpec,
};
use std::f64::consts::PI;

/// Sea level as a function of simulation time.
#[derive(Debug, Clone, PartialEq)]
pub enum SeaLevelCurve {
    /// Same level at every time
    Constant {
        /// Level returned for all t
        level: f64,
    },
    /// Linear interpolation between ascending `(time, level)` samples
    Sampled {
        times: Vec<f64>,
        levels: Vec<f64>,
        extrapolation: Extrapolation,
    },
    /// `baseline + Σ amplitude·sin(2π·t / period)`
    Components {
        baseline: f64,
        components: Vec<SeaLevelComponent>,
    },
}

impl SeaLevelCurve {
    /// Constant curve.
    pub fn constant(level: f64) -> Self {
        SeaLevelCurve::Constant { level }
    }

    /// Sampled curve. Times must be finite and strictly ascending.
    pub fn sampled(points: &[(f64, f64)], extrapolation: Extrapolation) -> Result<Self> {
        if points.is_empty() {
            return Err(CarbonateError::invalid(
                "sealevel_file",
                "0 samples",
                "curve needs at least one (time, level) sample",
            ));
        }
        for (i, &(time, level)) in points.iter().enumerate() {
            if !(time.is_finite() && level.is_finite()) {
                return Err(CarbonateError::invalid(
                    format!("sealevel_file sample {}", i + 1),
                    format!("({}, {})", time, level),
                    "time and level must be finite",
                ));
            }
        }
        for (i, pair) in points.windows(2).enumerate() {
            if pair[1].0 <= pair[0].0 {
                return Err(CarbonateError::invalid(
                    format!("sealevel_file sample {}", i + 2),
                    pair[1].0,
                    format!("time must be greater than the previous sample ({})", pair[0].0),
                ));
            }
        }
        let (times, levels) = points.iter().copied().unzip();
        Ok(SeaLevelCurve::Sampled {
            times,
            levels,
            extrapolation,
        })
    }

    /// Periodic component sum around `baseline`. Every period must be > 0.
    pub fn components(baseline: f64, components: Vec<SeaLevelComponent>) -> Result<Self> {
        for (i, c) in components.iter().enumerate() {
            if !(c.period.is_finite() && c.period > 0.0) {
                return Err(CarbonateError::invalid(
                    format!("sealevel_components[{}].period", i),
                    c.period,
                    "period must be > 0",
                ));
            }
            if !c.amplitude.is_finite() {
                return Err(CarbonateError::invalid(
                    format!("sealevel_components[{}].amplitude", i),
                    c.amplitude,
                    "amplitude must be finite",
                ));
            }
        }
        Ok(SeaLevelCurve::Components {
            baseline,
            components,
        })
    }

    /// Builds the curve selected in the parameters, reading the curve file if needed.
    pub fn from_spec(spec: &SeaLevelSpec, init_sealevel: f64) -> Result<Self> {
        match spec {
            SeaLevelSpec::Constant => Ok(Self::constant(init_sealevel)),
            SeaLevelSpec::File {
                path,
                extrapolation,
            } => {
                let points = read_sea_level_curve(path)?;
                Self::sampled(&points, *extrapolation)
            }
            SeaLevelSpec::Components(components) => {
                Self::components(init_sealevel, components.clone())
            }
        }
    }

    /// Sea level at time `t`.
    pub fn level_at(&self, t: f64) -> Result<f64> {
        if !t.is_finite() {
            return Err(CarbonateError::invalid("time", t, "sea-level query time must be finite"));
        }
        match self {
            SeaLevelCurve::Constant { level } => Ok(*level),
            SeaLevelCurve::Sampled {
                times,
                levels,
                extrapolation,
            } => interpolate(times, levels, *extrapolation, t),
            SeaLevelCurve::Components {
                baseline,
                components,
            } => Ok(baseline
                + components
                    .iter()
                    .map(|c| c.amplitude * (2.0 * PI * t / c.period).sin())
                    .sum::<f64>()),
        }
    }

    /// Returns the model name.
    pub fn name(&self) -> &'static str {
        match self {
            SeaLevelCurve::Constant { .. } => "constant",
            SeaLevelCurve::Sampled { .. } => "file",
            SeaLevelCurve::Components { .. } => "components",
        }
    }
}

fn interpolate(times: &[f64], levels: &[f64], extrapolation: Extrapolation, t: f64) -> Result<f64> {
    let first = times[0];
    let last = times[times.len() - 1];
    if t < first || t > last {
        return match extrapolation {
            Extrapolation::Reject => Err(CarbonateError::OutOfRange {
                time: t,
                min: first,
                max: last,
            }),
            Extrapolation::Clamp if t < first => Ok(levels[0]),
            Extrapolation::Clamp => Ok(levels[levels.len() - 1]),
        };
    }
    // First sample strictly after t; t lies in [times[hi-1], times[hi]).
    let hi = times.partition_point(|&s| s <= t);
    if hi == times.len() {
        return Ok(levels[levels.len() - 1]);
    }
    let lo = hi - 1;
    let frac = (t - times[lo]) / (times[hi] - times[lo]);
    Ok(levels[lo] + frac * (levels[hi] - levels[lo]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_constant_curve() {
        let curve = SeaLevelCurve::constant(3.5);
        assert_eq!(curve.level_at(-1e6).unwrap(), 3.5);
        assert_eq!(curve.level_at(42.0).unwrap(), 3.5);
    }

    #[test]
    fn test_sampled_interpolates_and_clamps() {
        let curve =
            SeaLevelCurve::sampled(&[(0.0, 0.0), (10.0, 10.0), (20.0, -10.0)], Extrapolation::Clamp)
                .unwrap();
        assert_relative_eq!(curve.level_at(5.0).unwrap(), 5.0);
        assert_relative_eq!(curve.level_at(10.0).unwrap(), 10.0);
        assert_relative_eq!(curve.level_at(15.0).unwrap(), 0.0);
        assert_relative_eq!(curve.level_at(20.0).unwrap(), -10.0);
        assert_relative_eq!(curve.level_at(-3.0).unwrap(), 0.0);
        assert_relative_eq!(curve.level_at(99.0).unwrap(), -10.0);
    }

    #[test]
    fn test_sampled_reject_outside_range() {
        let curve =
            SeaLevelCurve::sampled(&[(0.0, 1.0), (10.0, 2.0)], Extrapolation::Reject).unwrap();
        assert_relative_eq!(curve.level_at(10.0).unwrap(), 2.0);
        match curve.level_at(10.5).unwrap_err() {
            CarbonateError::OutOfRange { time, min, max } => {
                assert_eq!((time, min, max), (10.5, 0.0, 10.0));
            }
            other => panic!("expected out of range, got {:?}", other),
        }
    }

    #[test]
    fn test_single_sample_curve() {
        let curve = SeaLevelCurve::sampled(&[(5.0, 7.0)], Extrapolation::Clamp).unwrap();
        assert_eq!(curve.level_at(5.0).unwrap(), 7.0);
        assert_eq!(curve.level_at(0.0).unwrap(), 7.0);
    }

    #[test]
    fn test_sampled_rejects_unsorted() {
        let err = SeaLevelCurve::sampled(&[(0.0, 1.0), (0.0, 2.0)], Extrapolation::Clamp)
            .unwrap_err();
        assert!(matches!(err, CarbonateError::InvalidParameter { .. }));
        assert!(SeaLevelCurve::sampled(&[], Extrapolation::Clamp).is_err());
    }

    #[test]
    fn test_sampled_rejects_non_finite() {
        match SeaLevelCurve::sampled(&[(f64::NAN, 0.0), (1.0, 2.0)], Extrapolation::Clamp) {
            Err(CarbonateError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "sealevel_file sample 1");
            }
            other => panic!("expected invalid parameter, got {:?}", other),
        }
        match SeaLevelCurve::sampled(&[(0.0, 0.0), (1.0, f64::INFINITY)], Extrapolation::Reject) {
            Err(CarbonateError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "sealevel_file sample 2");
            }
            other => panic!("expected invalid parameter, got {:?}", other),
        }
        assert!(SeaLevelCurve::sampled(&[(0.0, 0.0), (f64::NAN, 1.0)], Extrapolation::Clamp).is_err());
    }

    #[test]
    fn test_components_sum() {
        let curve = SeaLevelCurve::components(
            1.0,
            vec![
                SeaLevelComponent { amplitude: 2.0, period: 4.0 },
                SeaLevelComponent { amplitude: 0.5, period: 8.0 },
            ],
        )
        .unwrap();
        // t = 1: sin(π/2) = 1, sin(π/4) = √2/2
        assert_relative_eq!(
            curve.level_at(1.0).unwrap(),
            1.0 + 2.0 + 0.5 * std::f64::consts::FRAC_1_SQRT_2,
            epsilon = 1e-12
        );
        assert_relative_eq!(curve.level_at(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_non_positive_period_rejected() {
        let err = SeaLevelCurve::components(
            0.0,
            vec![SeaLevelComponent { amplitude: 1.0, period: 0.0 }],
        )
        .unwrap_err();
        assert!(err.to_string().contains("sealevel_components[0].period"));
    }

    #[test]
    fn test_non_finite_time_rejected() {
        let curve = SeaLevelCurve::constant(0.0);
        assert!(curve.level_at(f64::NAN).is_err());
    }

    proptest! {
        #[test]
        fn prop_zero_amplitude_equals_constant(
            baseline in -100.0f64..100.0,
            periods in proptest::collection::vec(0.1f64..1000.0, 1..6),
            t in -1e5f64..1e5,
        ) {
            let components = periods
                .into_iter()
                .map(|period| SeaLevelComponent { amplitude: 0.0, period })
                .collect();
            let summed = SeaLevelCurve::components(baseline, components).unwrap();
            let constant = SeaLevelCurve::constant(baseline);
            prop_assert_eq!(summed.level_at(t).unwrap(), constant.level_at(t).unwrap());
        }
    }
}
