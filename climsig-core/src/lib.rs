//! Autocorrelation-aware linear regression significance for monthly climate
//! indices.
//!
//! The baseline OLS p-value assumes independent samples. Month-to-month
//! climate series are persistent, so [`effective_dof`] shrinks `n` to an
//! effective sample size and [`corrected_significance`] re-derives the slope
//! test with `df = Neff - 2`.

pub mod analysis;
pub mod config;
pub mod distribution;
pub mod effective_dof;
pub mod error;
pub mod indices;
pub mod output;
pub mod regression;
pub mod statistics;

pub use analysis::{analyze_pair, PairLabels, RegressionReport};
pub use config::AnalysisConfig;
pub use effective_dof::{effective_dof, effective_dof_with, neff_from_autocorrelation, DofModel};
pub use error::{IndexError, StatsError, StatsResult};
pub use indices::{MonthlyIndex, YearMonth};
pub use output::*;
pub use regression::{
    corrected_significance, fit, prediction_band, PredictionBand, RegressionResult, Significance,
    DEFAULT_PCT_RANGE,
};
