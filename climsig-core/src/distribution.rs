//! Student-t tail probabilities and quantiles over fractional degrees of freedom.
//!
//! Effective sample sizes are rarely integers, so `df = Neff - 2` is carried
//! as `f64` all the way into the distribution.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::{StatsError, StatsResult};

fn standard_t(df: f64) -> StatsResult<StudentsT> {
    if !(df.is_finite() && df > 0.0) {
        return Err(StatsError::InvalidDof { neff: df + 2.0 });
    }
    StudentsT::new(0.0, 1.0, df).map_err(|e| StatsError::Distribution(e.to_string()))
}

/// Upper-tail probability `P(T > t)` for a standard Student-t with `df` degrees of freedom.
pub fn t_sf(t: f64, df: f64) -> StatsResult<f64> {
    let dist = standard_t(df)?;
    if t == f64::INFINITY {
        return Ok(0.0);
    }
    if t == f64::NEG_INFINITY {
        return Ok(1.0);
    }
    Ok(dist.sf(t).clamp(0.0, 1.0))
}

/// Two-tailed p-value `2 * P(T > |t|)`.
pub fn two_tailed_p(t: f64, df: f64) -> StatsResult<f64> {
    Ok((2.0 * t_sf(t.abs(), df)?).min(1.0))
}

/// Quantile (percent point function) of the standard Student-t.
///
/// `q` is a probability in `(0, 1)`.
pub fn t_ppf(q: f64, df: f64) -> StatsResult<f64> {
    if !(q > 0.0 && q < 1.0) {
        return Err(StatsError::InvalidPercentile {
            lower: q * 100.0,
            upper: q * 100.0,
        });
    }
    let dist = standard_t(df)?;
    // Symmetric: evaluate the upper half and mirror for numerical stability
    if q < 0.5 {
        Ok(-dist.inverse_cdf(1.0 - q))
    } else {
        Ok(dist.inverse_cdf(q))
    }
}

/// Validate a `(lower, upper)` percentile pair given in percent.
pub fn check_percentiles(pct_range: (f64, f64)) -> StatsResult<()> {
    let (lower, upper) = pct_range;
    if lower > 0.0 && lower < upper && upper < 100.0 {
        Ok(())
    } else {
        Err(StatsError::InvalidPercentile { lower, upper })
    }
}
