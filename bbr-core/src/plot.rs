//! Plot data independent of any rendering backend.

use serde::{Deserialize, Serialize};

use crate::error::PlotError;
use crate::loss::wise::gradient_gain;

/// Every series needs its own color.
pub fn check_colors<C>(colors: &[C], series: usize) -> Result<(), PlotError> {
    if colors.len() < series {
        Err(PlotError::InsufficientColors { colors: colors.len(), series })
    } else {
        Ok(())
    }
}

/// `n` evenly spaced values from `start` to `end`, inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Outlier degrees sampled for gain curves.
pub const BETA_MAX: f64 = 8.;
pub const BETA_SAMPLES: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainCurve {
    pub gamma: f64,
    pub delta: f64,
    /// `(β, r)` pairs
    pub points: Vec<(f64, f64)>,
}

impl GainCurve {
    pub fn new(gamma: f64, delta: f64) -> Self {
        let points = linspace(0., BETA_MAX, BETA_SAMPLES)
            .into_iter()
            .map(|beta| (beta, gradient_gain(beta, gamma, delta)))
            .collect();
        GainCurve { gamma, delta, points }
    }
    pub fn label(&self) -> String {
        format!("α={}  δ={}", self.gamma, self.delta)
    }
}

/// One curve per `(γ, δ)` pair; unpaired trailing values are ignored.
pub fn gain_curves(gammas: &[f64], deltas: &[f64]) -> Vec<GainCurve> {
    gammas.iter().zip(deltas).map(|(g, d)| GainCurve::new(*g, *d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_check_colors() {
        assert_eq!(check_colors(&["red", "blue"], 2), Ok(()));
        assert_eq!(
            check_colors(&["red"], 3),
            Err(PlotError::InsufficientColors { colors: 1, series: 3 })
        );
        assert_eq!(check_colors::<&str>(&[], 0), Ok(()));
    }

    #[test]
    fn test_linspace() {
        let xs = linspace(0., 8., 100);
        assert_eq!(xs.len(), 100);
        assert_eq!(xs[0], 0.);
        assert_relative_eq!(xs[99], 8.);
        assert_eq!(linspace(1., 2., 1), vec![1.]);
        assert!(linspace(1., 2., 0).is_empty());
    }

    #[test]
    fn test_gain_curves() {
        let curves = gain_curves(&[2.5, 1.9, 1.6, 1.4], &[2., 3., 4., 5.]);
        assert_eq!(curves.len(), 4);
        for curve in &curves {
            assert_eq!(curve.points.len(), BETA_SAMPLES);
            assert_eq!(curve.points[0], (0., 0.));
            assert_relative_eq!(gradient_gain(curve.delta, curve.gamma, curve.delta), 1.);
        }
        assert_eq!(curves[1].label(), "α=1.9  δ=3");
        assert_eq!(gain_curves(&[2.], &[1., 2.]).len(), 1);
    }
}
