//! Simple linear regression with significance testing at an arbitrary
//! effective sample size.
//!
//! `fit` and `corrected_significance` share one code path: the baseline
//! p-value of `fit` is `corrected_significance` evaluated at `Neff = n`.

use serde::{Deserialize, Serialize};

use crate::distribution::{check_percentiles, t_ppf, two_tailed_p};
use crate::error::{StatsError, StatsResult};
use crate::statistics::{
    covariance, ensure_finite, mean, pearson, sum_squared_deviations, validate_pair, variance,
};

/// Percentile range used for slope intervals and bands when none is given.
pub const DEFAULT_PCT_RANGE: (f64, f64) = (5.0, 95.0);

/// Ordinary least squares fit statistics over the raw sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub r_value: f64,
    /// Two-tailed p-value of the slope assuming independent samples
    pub p_value: f64,
    /// Standard error of the slope assuming independent samples
    pub std_err: f64,
    pub n: usize,
}

impl RegressionResult {
    pub fn r_squared(&self) -> f64 {
        self.r_value * self.r_value
    }

    /// Value of the fitted line at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Slope significance re-derived with `df = Neff - 2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Significance {
    pub neff: f64,
    pub df: f64,
    /// Infinite for an exact fit
    #[serde(with = "extended_float")]
    pub t_statistic: f64,
    pub p_value: f64,
    /// `1 - p`, negative when the slope is negative
    pub signed_confidence: f64,
    pub slope_std_err: f64,
    /// Percentile range (percent) of `slope_ci`
    pub pct_range: (f64, f64),
    pub slope_ci: (f64, f64),
}

/// JSON has no infinity or NaN; those are written as `"inf"`, `"-inf"` and
/// `"nan"` and read back from the same strings.
mod extended_float {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(s) => match s.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(de::Error::invalid_value(
                    de::Unexpected::Str(other),
                    &"a number, \"inf\", \"-inf\" or \"nan\"",
                )),
            },
        }
    }
}

/// Confidence band of the regression line evaluated on a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBand {
    pub neff: f64,
    pub df: f64,
    pub pct_range: (f64, f64),
    /// Offsets to add to the slope for the lower and upper percentile
    pub slope_offsets: (f64, f64),
    pub new_x: Vec<f64>,
    /// Regression line at each `new_x`
    pub fitted: Vec<f64>,
    /// Offsets to add to `fitted` for the lower percentile
    pub lower: Vec<f64>,
    /// Offsets to add to `fitted` for the upper percentile
    pub upper: Vec<f64>,
}

impl PredictionBand {
    /// Half-width of the slope interval on the upper side.
    pub fn slope_half_width(&self) -> f64 {
        self.slope_offsets.1
    }
}

/// Residual statistics at a given effective sample size.
struct ResidualFit {
    x_mean: f64,
    sxx: f64,
    /// Residual variance s² = SSR / (Neff - 2)
    residual_variance: f64,
    df: f64,
}

fn check_neff(neff: f64, n: usize) -> StatsResult<()> {
    // Small tolerance so Neff computed as n * 1.0 is accepted
    if !neff.is_finite() || neff <= 2.0 || neff > n as f64 * (1.0 + 1e-12) {
        return Err(StatsError::InvalidDof { neff });
    }
    Ok(())
}

fn residual_fit(
    x: &[f64],
    y: &[f64],
    slope: f64,
    intercept: f64,
    neff: f64,
) -> StatsResult<ResidualFit> {
    validate_pair(x, y)?;
    check_neff(neff, x.len())?;

    let sxx = sum_squared_deviations(x);
    if sxx <= 0.0 {
        return Err(StatsError::degenerate("x has zero variance"));
    }

    let ssr: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - slope * xi - intercept).powi(2))
        .sum();

    Ok(ResidualFit {
        x_mean: mean(x),
        sxx,
        residual_variance: ssr / (neff - 2.0),
        df: neff - 2.0,
    })
}

/// Ordinary least squares fit of `y` on `x`.
///
/// The baseline `p_value` and `std_err` assume every sample is independent
/// (`Neff = n`); use [`corrected_significance`] for autocorrelated series.
pub fn fit(x: &[f64], y: &[f64]) -> StatsResult<RegressionResult> {
    validate_pair(x, y)?;

    let var_x = variance(x);
    if var_x <= 0.0 {
        return Err(StatsError::degenerate("x has zero variance"));
    }

    let slope = covariance(x, y) / var_x;
    let intercept = mean(y) - slope * mean(x);
    // Constant y is a perfectly flat fit, not an error
    let r_value = pearson(x, y).unwrap_or(0.0);

    let n = x.len();
    let baseline = corrected_significance(x, y, slope, intercept, n as f64)?;

    Ok(RegressionResult {
        slope,
        intercept,
        r_value,
        p_value: baseline.p_value,
        std_err: baseline.slope_std_err,
        n,
    })
}

/// Slope significance with the degrees of freedom reduced to `Neff - 2`.
///
/// Fails with [`StatsError::InvalidDof`] unless `2 < Neff <= n`. The slope
/// interval spans [`DEFAULT_PCT_RANGE`].
pub fn corrected_significance(
    x: &[f64],
    y: &[f64],
    slope: f64,
    intercept: f64,
    neff: f64,
) -> StatsResult<Significance> {
    corrected_significance_with(x, y, slope, intercept, neff, DEFAULT_PCT_RANGE)
}

/// [`corrected_significance`] with the slope interval at `pct_range` (percent).
pub fn corrected_significance_with(
    x: &[f64],
    y: &[f64],
    slope: f64,
    intercept: f64,
    neff: f64,
    pct_range: (f64, f64),
) -> StatsResult<Significance> {
    check_percentiles(pct_range)?;
    let rf = residual_fit(x, y, slope, intercept, neff)?;

    let slope_std_err = (rf.residual_variance / rf.sxx).sqrt();
    let t_statistic = if slope_std_err > 0.0 {
        slope / slope_std_err
    } else if slope == 0.0 {
        0.0
    } else {
        // Exact fit: the slope is known without error
        slope.signum() * f64::INFINITY
    };

    let p_value = two_tailed_p(t_statistic, rf.df)?;
    let mut signed_confidence = 1.0 - p_value;
    if t_statistic < 0.0 {
        signed_confidence = -signed_confidence;
    }

    let (lo, hi) = pct_range;
    let slope_ci = (
        slope + t_ppf(lo / 100.0, rf.df)? * slope_std_err,
        slope + t_ppf(hi / 100.0, rf.df)? * slope_std_err,
    );

    Ok(Significance {
        neff,
        df: rf.df,
        t_statistic,
        p_value,
        signed_confidence,
        slope_std_err,
        pct_range,
        slope_ci,
    })
}

/// Evaluate the regression line on `new_x` with its confidence band.
///
/// The band is the interval of the regression mean,
/// `t(p) * s * sqrt(1/Neff + (x - mean x)² / Σ(x - mean x)²)`, at both ends of
/// `pct_range` (percent). `neff` defaults to `n`.
pub fn prediction_band(
    x: &[f64],
    y: &[f64],
    slope: f64,
    intercept: f64,
    new_x: &[f64],
    pct_range: (f64, f64),
    neff: Option<f64>,
) -> StatsResult<PredictionBand> {
    check_percentiles(pct_range)?;
    if new_x.is_empty() {
        return Err(StatsError::degenerate("empty evaluation grid"));
    }
    ensure_finite(new_x)?;

    let neff = neff.unwrap_or(x.len() as f64);
    let rf = residual_fit(x, y, slope, intercept, neff)?;

    let t_lo = t_ppf(pct_range.0 / 100.0, rf.df)?;
    let t_hi = t_ppf(pct_range.1 / 100.0, rf.df)?;

    let s = rf.residual_variance.sqrt();
    let slope_se = (rf.residual_variance / rf.sxx).sqrt();

    let mut fitted = Vec::with_capacity(new_x.len());
    let mut lower = Vec::with_capacity(new_x.len());
    let mut upper = Vec::with_capacity(new_x.len());
    for &xv in new_x {
        let se_mean = s * (1.0 / neff + (xv - rf.x_mean).powi(2) / rf.sxx).sqrt();
        fitted.push(slope * xv + intercept);
        lower.push(t_lo * se_mean);
        upper.push(t_hi * se_mean);
    }

    Ok(PredictionBand {
        neff,
        df: rf.df,
        pct_range,
        slope_offsets: (t_lo * slope_se, t_hi * slope_se),
        new_x: new_x.to_vec(),
        fitted,
        lower,
        upper,
    })
}
