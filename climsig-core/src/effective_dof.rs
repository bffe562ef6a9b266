//! Effective sample size of serially correlated series.
//!
//! Monthly climate indices are strongly persistent, so `n` overstates the
//! number of independent observations. These estimators shrink `n` from the
//! lag-k autocorrelation structure and always return a value in `[2, n]`.

use serde::{Deserialize, Serialize};

use crate::error::{StatsError, StatsResult};
use crate::statistics::{autocorrelation, ensure_finite, lag1_autocorrelation};

/// Lower bound of every effective sample size estimate.
pub const MIN_NEFF: f64 = 2.0;

/// How the autocorrelation structure is turned into an effective sample size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum DofModel {
    /// First-order autoregressive: `Neff = n (1 - r1) / (1 + r1)`
    #[default]
    Ar1,
    /// `Neff = n / (1 + 2 Σ (1 - k/n) r_k)`, summed until the first
    /// non-positive `r_k` or `max_lag`
    LagSum { max_lag: usize },
}

/// Clamp an estimate into `[2, n]`.
fn clamp_neff(neff: f64, n: usize) -> f64 {
    let n = n as f64;
    if neff.is_nan() {
        return n;
    }
    neff.clamp(MIN_NEFF, n)
}

/// AR(1) effective sample size for a known lag-1 autocorrelation.
///
/// Non-positive or undefined `r1` gives `n` (no discount).
pub fn neff_from_autocorrelation(n: usize, r1: f64) -> f64 {
    if !(r1.is_finite() && r1 > 0.0) {
        return n as f64;
    }
    clamp_neff(n as f64 * (1.0 - r1) / (1.0 + r1), n)
}

/// Joint persistence of two series at one lag: the more persistent side.
///
/// A joint estimate never discounts less than either series alone.
fn joint_autocorrelation(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(ra), Some(rb)) => Some(ra.max(rb)),
        (Some(r), None) | (None, Some(r)) => Some(r),
        (None, None) => None,
    }
}

fn lag_autocorrelation(a: &[f64], b: Option<&[f64]>, lag: usize) -> Option<f64> {
    let ra = autocorrelation(a, lag);
    match b {
        Some(b) => joint_autocorrelation(ra, autocorrelation(b, lag)),
        None => ra,
    }
}

fn validate_series(a: &[f64], b: Option<&[f64]>) -> StatsResult<()> {
    if a.len() < 3 {
        return Err(StatsError::degenerate(format!(
            "need at least 3 samples, got {}",
            a.len()
        )));
    }
    ensure_finite(a)?;
    if let Some(b) = b {
        if b.len() != a.len() {
            return Err(StatsError::LengthMismatch {
                x: a.len(),
                y: b.len(),
            });
        }
        ensure_finite(b).map_err(|e| match e {
            StatsError::NonFinite { index } => StatsError::NonFinite {
                index: index + a.len(),
            },
            other => other,
        })?;
    }
    Ok(())
}

/// Effective sample size from the lag-1 autocorrelation of `a`, or of `a`
/// and `b` jointly when a second series is given.
pub fn effective_dof(a: &[f64], b: Option<&[f64]>) -> StatsResult<f64> {
    effective_dof_with(a, b, DofModel::Ar1)
}

/// Effective sample size under an explicit [`DofModel`].
pub fn effective_dof_with(a: &[f64], b: Option<&[f64]>, model: DofModel) -> StatsResult<f64> {
    validate_series(a, b)?;
    let n = a.len();

    match model {
        DofModel::Ar1 => {
            let r1 = match b {
                Some(b) => joint_autocorrelation(
                    lag1_autocorrelation(a),
                    lag1_autocorrelation(b),
                ),
                None => lag1_autocorrelation(a),
            };
            Ok(r1.map_or(n as f64, |r| neff_from_autocorrelation(n, r)))
        }
        DofModel::LagSum { max_lag } => {
            let nf = n as f64;
            let mut sum = 0.0;
            for k in 1..=max_lag.min(n.saturating_sub(3)) {
                match lag_autocorrelation(a, b, k) {
                    Some(r) if r > 0.0 => sum += (1.0 - k as f64 / nf) * r,
                    _ => break,
                }
            }
            Ok(clamp_neff(nf / (1.0 + 2.0 * sum), n))
        }
    }
}
