//! One predictor/response panel: the naive fit, then the same statistics
//! re-derived at the effective sample size.

use serde::{Deserialize, Serialize};

use crate::config::SignificanceConfig;
use crate::effective_dof::{effective_dof_with, DofModel};
use crate::error::StatsResult;
use crate::indices::YearMonth;
use crate::regression::{
    corrected_significance_with, fit, prediction_band, PredictionBand, RegressionResult,
    Significance,
};
use crate::statistics::linspace;

/// Everything computed for one predictor/response pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    pub predictor: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<(YearMonth, YearMonth)>,
    pub fit: RegressionResult,
    /// Band assuming independent samples
    pub naive_band: PredictionBand,
    /// Slope test re-derived at Neff = n (cross-check of `fit.p_value`)
    pub naive_check: Significance,
    pub dof_model: DofModel,
    pub joint_dof: bool,
    pub neff: f64,
    /// Corrected statistics; absent when Neff leaves no degrees of freedom
    pub corrected: Option<Significance>,
    pub corrected_band: Option<PredictionBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_error: Option<String>,
    pub timestamp: String,
}

impl RegressionReport {
    /// Whether the corrected slope test rejects zero slope at `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.corrected
            .as_ref()
            .map(|s| s.p_value < alpha)
            .unwrap_or(false)
    }
}

/// Labels attached to a report
#[derive(Debug, Clone, Default)]
pub struct PairLabels {
    pub predictor: String,
    pub response: String,
    pub period: Option<(YearMonth, YearMonth)>,
}

/// Run the full regression analysis of `y` on `x`.
///
/// Errors only for inputs the naive fit cannot handle; an effective sample
/// size too small for a t-test is recorded in `corrected_error` instead.
pub fn analyze_pair(
    x: &[f64],
    y: &[f64],
    labels: PairLabels,
    config: &SignificanceConfig,
) -> StatsResult<RegressionReport> {
    let result = fit(x, y)?;
    let n = x.len();

    let (x_min, x_max) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let new_x = linspace(x_min, x_max, config.band_points.max(2));
    let pct_range = config.pct_range();

    let naive_band = prediction_band(
        x,
        y,
        result.slope,
        result.intercept,
        &new_x,
        pct_range,
        None,
    )?;
    let naive_check =
        corrected_significance_with(x, y, result.slope, result.intercept, n as f64, pct_range)?;

    let dof_model = config.dof_model();
    let joint_dof = !config.single_series;
    let neff = effective_dof_with(x, joint_dof.then_some(y), dof_model)?;

    let corrected = corrected_significance_with(x, y, result.slope, result.intercept, neff, pct_range)
        .and_then(|sig| {
            let band = prediction_band(
                x,
                y,
                result.slope,
                result.intercept,
                &new_x,
                pct_range,
                Some(neff),
            )?;
            Ok((sig, band))
        });

    let (corrected, corrected_band, corrected_error) = match corrected {
        Ok((sig, band)) => (Some(sig), Some(band), None),
        Err(e) => (None, None, Some(e.to_string())),
    };

    Ok(RegressionReport {
        predictor: labels.predictor,
        response: labels.response,
        period: labels.period,
        fit: result,
        naive_band,
        naive_check,
        dof_model,
        joint_dof,
        neff,
        corrected,
        corrected_band,
        corrected_error,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effective_dof::MIN_NEFF;

    fn labels() -> PairLabels {
        PairLabels {
            predictor: "x".to_string(),
            response: "y".to_string(),
            period: None,
        }
    }

    #[test]
    fn test_trend_predictor_hits_clamp() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 5.0, 4.0, 5.0];
        let mut config = SignificanceConfig::default();
        config.single_series = true;

        let report = analyze_pair(&x, &y, labels(), &config).unwrap();

        assert_eq!(report.neff, MIN_NEFF);
        assert!(report.corrected.is_none());
        assert!(report.corrected_band.is_none());
        assert!(report.corrected_error.as_deref().unwrap().contains("Neff"));
        assert!(!report.is_significant(0.05));

        // Naive statistics are still reported
        assert!((report.fit.slope - 0.6).abs() < 1e-12);
        assert!((report.naive_check.p_value - report.fit.p_value).abs() < 1e-12);
    }

    #[test]
    fn test_independent_like_series_keeps_full_neff() {
        // Alternating predictor has negative lag-1 autocorrelation
        let x: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { i as f64 } else { -(i as f64) }).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.5 * v + 1.0 + (v * 0.7).sin()).collect();
        let mut config = SignificanceConfig::default();
        config.band_points = 10;

        let report = analyze_pair(&x, &y, labels(), &config).unwrap();

        assert_eq!(report.neff, 30.0);
        let corrected = report.corrected.unwrap();
        assert!((corrected.p_value - report.fit.p_value).abs() < 1e-12);
        assert_eq!(report.naive_band.new_x.len(), 10);
        assert_eq!(report.corrected_band.unwrap().fitted, report.naive_band.fitted);
    }

    #[test]
    fn test_configured_percentiles_reach_slope_interval() {
        let x: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { i as f64 } else { -(i as f64) }).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.5 * v + 1.0 + (v * 0.7).sin()).collect();
        let mut config = SignificanceConfig::default();
        config.pct_low = 2.5;
        config.pct_high = 97.5;

        let report = analyze_pair(&x, &y, labels(), &config).unwrap();

        let corrected = report.corrected.unwrap();
        assert_eq!(corrected.pct_range, (2.5, 97.5));
        assert_eq!(report.naive_check.pct_range, (2.5, 97.5));
        let band = report.corrected_band.unwrap();
        assert_eq!(band.pct_range, corrected.pct_range);
        assert!((corrected.slope_ci.1 - report.fit.slope - band.slope_half_width()).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_pair_is_an_error() {
        let config = SignificanceConfig::default();
        assert!(analyze_pair(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], labels(), &config).is_err());
    }
}
