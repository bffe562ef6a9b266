//! Error types for the numeric core and the index file reader.

use thiserror::Error;

/// Failures of the regression and effective-DOF routines.
///
/// Every variant is detected before the division it would otherwise poison,
/// so callers can skip or annotate a pair instead of carrying NaN around.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: String },

    #[error("length mismatch: x has {x} values, y has {y}")]
    LengthMismatch { x: usize, y: usize },

    #[error("invalid effective degrees of freedom: Neff = {neff} (need 2 < Neff <= n)")]
    InvalidDof { neff: f64 },

    #[error("non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error("invalid percentile range [{lower}, {upper}] (need 0 < lower < upper < 100)")]
    InvalidPercentile { lower: f64, upper: f64 },

    #[error("distribution error: {0}")]
    Distribution(String),
}

impl StatsError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        StatsError::DegenerateInput {
            reason: reason.into(),
        }
    }
}

/// Failures while reading or slicing a monthly index file.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to read index file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("{start} to {end} is outside the index coverage {first_year}-{last_year}")]
    OutOfRange {
        start: String,
        end: String,
        first_year: i32,
        last_year: i32,
    },

    #[error("invalid month '{0}' (expected YYYY-MM)")]
    InvalidMonth(String),
}

pub type StatsResult<T> = Result<T, StatsError>;
