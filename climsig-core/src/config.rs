use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::effective_dof::DofModel;
use crate::indices::YearMonth;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "climsig.toml";

/// Which autocorrelation model drives the effective sample size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DofModelKind {
    Ar1,
    LagSum,
}

/// Configuration for significance testing and confidence bands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignificanceConfig {
    /// Lower percentile of the slope interval and regression band
    #[serde(default = "default_pct_low")]
    pub pct_low: f64,

    /// Upper percentile of the slope interval and regression band
    #[serde(default = "default_pct_high")]
    pub pct_high: f64,

    /// Number of evaluation points for the regression band
    #[serde(default = "default_band_points")]
    pub band_points: usize,

    /// Autocorrelation model for the effective sample size
    #[serde(default = "default_dof_model")]
    pub dof_model: DofModelKind,

    /// Largest lag summed by the lag-sum model
    #[serde(default = "default_max_lag")]
    pub max_lag: usize,

    /// Use only the predictor's persistence instead of both series jointly
    #[serde(default)]
    pub single_series: bool,
}

fn default_pct_low() -> f64 { 5.0 }
fn default_pct_high() -> f64 { 95.0 }
fn default_band_points() -> usize { 100 }
fn default_dof_model() -> DofModelKind { DofModelKind::Ar1 }
fn default_max_lag() -> usize { 24 }

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self {
            pct_low: default_pct_low(),
            pct_high: default_pct_high(),
            band_points: default_band_points(),
            dof_model: default_dof_model(),
            max_lag: default_max_lag(),
            single_series: false,
        }
    }
}

impl SignificanceConfig {
    pub fn pct_range(&self) -> (f64, f64) {
        (self.pct_low, self.pct_high)
    }

    pub fn dof_model(&self) -> DofModel {
        match self.dof_model {
            DofModelKind::Ar1 => DofModel::Ar1,
            DofModelKind::LagSum => DofModel::LagSum {
                max_lag: self.max_lag,
            },
        }
    }
}

/// Analysis period and preprocessing of the input series
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PeriodConfig {
    /// First month (YYYY-MM); None = start of the shortest index
    #[serde(default)]
    pub start: Option<YearMonth>,

    /// Last month (YYYY-MM); None = end of the shortest index
    #[serde(default)]
    pub end: Option<YearMonth>,

    /// Remove the mean annual cycle before regressing
    #[serde(default)]
    pub remove_annual_cycle: bool,
}

/// Complete climsig configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub significance: SignificanceConfig,

    #[serde(default)]
    pub period: PeriodConfig,
}

impl AnalysisConfig {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Ok(file_config) = Self::from_file(CONFIG_FILE) {
            config = file_config;
        }

        config.apply_env_overrides();

        config
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: AnalysisConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(low) = std::env::var("CLIMSIG_PCT_LOW") {
            if let Ok(val) = low.parse() {
                self.significance.pct_low = val;
            }
        }

        if let Ok(high) = std::env::var("CLIMSIG_PCT_HIGH") {
            if let Ok(val) = high.parse() {
                self.significance.pct_high = val;
            }
        }

        if let Ok(points) = std::env::var("CLIMSIG_BAND_POINTS") {
            if let Ok(val) = points.parse() {
                self.significance.band_points = val;
            }
        }

        if let Ok(model) = std::env::var("CLIMSIG_DOF_MODEL") {
            match model.as_str() {
                "ar1" => self.significance.dof_model = DofModelKind::Ar1,
                "lag-sum" => self.significance.dof_model = DofModelKind::LagSum,
                _ => {}
            }
        }

        if let Ok(lag) = std::env::var("CLIMSIG_MAX_LAG") {
            if let Ok(val) = lag.parse() {
                self.significance.max_lag = val;
            }
        }

        if std::env::var("CLIMSIG_SINGLE_SERIES").is_ok() {
            self.significance.single_series = true;
        }
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.significance.pct_range(), (5.0, 95.0));
        assert_eq!(config.significance.band_points, 100);
        assert_eq!(config.significance.dof_model(), DofModel::Ar1);
        assert_eq!(config.significance.single_series, false);
        assert_eq!(config.period.start, None);
        assert_eq!(config.period.remove_annual_cycle, false);
    }

    #[test]
    fn test_save_and_load_config() {
        let mut config = AnalysisConfig::default();
        config.period.start = Some(YearMonth::new(2015, 1).unwrap());
        let temp_file = NamedTempFile::new().unwrap();

        config.save(temp_file.path()).unwrap();
        let loaded = AnalysisConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(loaded.significance.band_points, 100);
        assert_eq!(loaded.period.start, Some(YearMonth::new(2015, 1).unwrap()));
    }

    #[test]
    fn test_env_overrides() {
        env::set_var("CLIMSIG_PCT_LOW", "2.5");
        env::set_var("CLIMSIG_PCT_HIGH", "97.5");
        env::set_var("CLIMSIG_BAND_POINTS", "50");
        env::set_var("CLIMSIG_DOF_MODEL", "lag-sum");
        env::set_var("CLIMSIG_MAX_LAG", "6");
        env::set_var("CLIMSIG_SINGLE_SERIES", "1");

        let mut config = AnalysisConfig::default();
        config.apply_env_overrides();

        assert_eq!(config.significance.pct_range(), (2.5, 97.5));
        assert_eq!(config.significance.band_points, 50);
        assert_eq!(config.significance.dof_model(), DofModel::LagSum { max_lag: 6 });
        assert_eq!(config.significance.single_series, true);

        // Clean up
        env::remove_var("CLIMSIG_PCT_LOW");
        env::remove_var("CLIMSIG_PCT_HIGH");
        env::remove_var("CLIMSIG_BAND_POINTS");
        env::remove_var("CLIMSIG_DOF_MODEL");
        env::remove_var("CLIMSIG_MAX_LAG");
        env::remove_var("CLIMSIG_SINGLE_SERIES");
    }

    #[test]
    fn test_partial_config_file() {
        let toml_content = r#"
            [significance]
            dof_model = "lag-sum"
            max_lag = 12

            [period]
            start = "2015-01"
            remove_annual_cycle = true
        "#;

        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), toml_content).unwrap();

        let config = AnalysisConfig::from_file(temp_file.path()).unwrap();

        // Specified values
        assert_eq!(config.significance.dof_model(), DofModel::LagSum { max_lag: 12 });
        assert!(config.period.remove_annual_cycle);
        assert_eq!(config.period.start, Some(YearMonth::new(2015, 1).unwrap()));

        // Default values for unspecified fields
        assert_eq!(config.significance.pct_range(), (5.0, 95.0));
        assert_eq!(config.period.end, None);
    }
}
