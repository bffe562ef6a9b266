//! Array reductions shared by the regression and effective-DOF routines.
//!
//! Lagged views are taken by slicing, so nothing here allocates except
//! `linspace`.

use crate::error::{StatsError, StatsResult};

/// Calculate the arithmetic mean of a slice of values
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Calculate the population variance of a slice of values
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    sum_squared_deviations(values) / values.len() as f64
}

/// Σ(v - mean)²
pub fn sum_squared_deviations(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|&v| (v - m).powi(2)).sum()
}

/// Σ(x - mean x)(y - mean y). Slices must have equal length.
pub fn sum_cross_deviations(x: &[f64], y: &[f64]) -> f64 {
    let mx = mean(x);
    let my = mean(y);
    x.iter().zip(y).map(|(&a, &b)| (a - mx) * (b - my)).sum()
}

/// Population covariance of two equal-length slices
pub fn covariance(x: &[f64], y: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    sum_cross_deviations(x, y) / x.len() as f64
}

/// Pearson correlation coefficient, `None` when either side has no spread.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let sxx = sum_squared_deviations(x);
    let syy = sum_squared_deviations(y);
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    let r = sum_cross_deviations(x, y) / (sxx * syy).sqrt();
    if !r.is_finite() {
        return None;
    }
    Some(r.clamp(-1.0, 1.0))
}

/// Lag-k autocorrelation: Pearson correlation between `values[..n-k]` and
/// `values[k..]`.
///
/// Returns `None` when fewer than three overlapping pairs remain or either
/// lagged view is constant.
pub fn autocorrelation(values: &[f64], lag: usize) -> Option<f64> {
    if lag == 0 {
        return Some(1.0);
    }
    if values.len() < lag + 3 {
        return None;
    }
    let n = values.len();
    pearson(&values[..n - lag], &values[lag..])
}

/// Lag-1 autocorrelation (short-range persistence).
pub fn lag1_autocorrelation(values: &[f64]) -> Option<f64> {
    autocorrelation(values, 1)
}

/// Reject NaN and infinities before any reduction touches them.
pub fn ensure_finite(values: &[f64]) -> StatsResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(StatsError::NonFinite { index }),
        None => Ok(()),
    }
}

/// Validate a sample pair: equal lengths, `n >= 3`, all values finite.
pub fn validate_pair(x: &[f64], y: &[f64]) -> StatsResult<()> {
    if x.len() != y.len() {
        return Err(StatsError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    if x.len() < 3 {
        return Err(StatsError::degenerate(format!(
            "need at least 3 samples, got {}",
            x.len()
        )));
    }
    ensure_finite(x)?;
    // Offset so the index refers to the concatenated pair x ++ y
    ensure_finite(y).map_err(|e| match e {
        StatsError::NonFinite { index } => StatsError::NonFinite {
            index: index + x.len(),
        },
        other => other,
    })
}

/// `count` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(mean(&values), 3.0);

        let empty: Vec<f64> = vec![];
        assert_eq!(mean(&empty), 0.0);
    }

    #[test]
    fn test_variance() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let var = variance(&values);
        // Expected variance: 4.0
        assert!((var - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_covariance_and_pearson() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![2.0, 4.0, 5.0, 4.0, 5.0];
        assert!((sum_cross_deviations(&x, &y) - 6.0).abs() < 1e-12);
        assert!((covariance(&x, &y) - 1.2).abs() < 1e-12);

        let r = pearson(&x, &y).unwrap();
        assert!((r * r - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_constant_is_none() {
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![4.0, 4.0, 4.0];
        assert_eq!(pearson(&x, &y), None);
    }

    #[test]
    fn test_lag1_of_trend_is_one() {
        let trend: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let r1 = lag1_autocorrelation(&trend).unwrap();
        assert!((r1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lag1_of_alternating_is_negative() {
        let alternating: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let r1 = lag1_autocorrelation(&alternating);
        // Both lagged views are still alternating, so correlation is exactly -1
        assert!((r1.unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_autocorrelation_too_short() {
        assert_eq!(autocorrelation(&[1.0, 2.0, 3.0], 1), None);
        assert_eq!(autocorrelation(&[1.0, 2.0, 3.0], 0), Some(1.0));
    }

    #[test]
    fn test_validate_pair() {
        assert_eq!(
            validate_pair(&[1.0, 2.0], &[1.0]),
            Err(StatsError::LengthMismatch { x: 2, y: 1 })
        );
        assert!(matches!(
            validate_pair(&[1.0, 2.0], &[1.0, 2.0]),
            Err(StatsError::DegenerateInput { .. })
        ));
        assert_eq!(
            validate_pair(&[1.0, 2.0, 3.0], &[1.0, f64::NAN, 3.0]),
            Err(StatsError::NonFinite { index: 4 })
        );
        assert!(validate_pair(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).is_ok());
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(2.0, 3.0, 0).is_empty());
    }
}
