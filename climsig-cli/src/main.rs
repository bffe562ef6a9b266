mod neff;
mod progress;
mod regress;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use climsig_core::config::{AnalysisConfig, DofModelKind, CONFIG_FILE};
use climsig_core::YearMonth;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "climsig")]
#[command(author, version, about = "Regression significance for autocorrelated climate indices", long_about = None)]
struct Cli {
    /// Configuration file (default: ./climsig.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Suppress progress bars
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regress one or more response indices on a predictor index
    Regress {
        /// Predictor index file (PSL monthly table)
        #[arg(short, long)]
        predictor: PathBuf,

        /// Response index files (PSL monthly tables)
        #[arg(short, long, required = true, num_args = 1..)]
        response: Vec<PathBuf>,

        #[command(flatten)]
        period: PeriodArgs,

        /// Remove the mean annual cycle from both series
        #[arg(long)]
        anomaly: bool,

        /// Effective sample size from the predictor alone
        #[arg(long)]
        single_series: bool,

        /// Autocorrelation model for the effective sample size
        #[arg(long, value_parser = parse_dof_model)]
        dof_model: Option<DofModelKind>,

        /// Write all reports as JSON to this file
        #[arg(long)]
        json: Option<PathBuf>,

        /// Significance level for the summary
        #[arg(long, default_value_t = 0.05)]
        alpha: f64,

        /// Print the Neff = N cross-check and analysis period
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print lag-1 autocorrelation and effective sample size of index files
    Neff {
        /// Index file (PSL monthly table)
        #[arg(short, long)]
        input: PathBuf,

        /// Second index for the joint estimate
        #[arg(short, long)]
        with: Option<PathBuf>,

        #[command(flatten)]
        period: PeriodArgs,

        /// Remove the mean annual cycle first
        #[arg(long)]
        anomaly: bool,
    },

    /// Write the default configuration file
    InitConfig {
        #[arg(long, default_value = CONFIG_FILE)]
        path: PathBuf,
    },
}

#[derive(clap::Args, Clone, Default)]
pub struct PeriodArgs {
    /// First month, YYYY-MM
    #[arg(long)]
    pub start: Option<YearMonth>,

    /// Last month, YYYY-MM
    #[arg(long)]
    pub end: Option<YearMonth>,
}

fn parse_dof_model(s: &str) -> Result<DofModelKind, String> {
    match s {
        "ar1" => Ok(DofModelKind::Ar1),
        "lag-sum" => Ok(DofModelKind::LagSum),
        other => Err(format!("unknown model '{}' (expected ar1 or lag-sum)", other)),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => {
            let mut config = AnalysisConfig::from_file(path)
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => Ok(AnalysisConfig::load()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let quiet = cli.quiet || std::env::var("CLIMSIG_QUIET").is_ok();

    match cli.command {
        Commands::Regress {
            predictor,
            response,
            period,
            anomaly,
            single_series,
            dof_model,
            json,
            alpha,
            verbose,
        } => {
            let mut config = load_config(cli.config.as_ref())?;

            // CLI flags override config file and env vars
            if let Some(start) = period.start {
                config.period.start = Some(start);
            }
            if let Some(end) = period.end {
                config.period.end = Some(end);
            }
            if anomaly {
                config.period.remove_annual_cycle = true;
            }
            if single_series {
                config.significance.single_series = true;
            }
            if let Some(model) = dof_model {
                config.significance.dof_model = model;
            }

            let options = regress::RegressOptions {
                json,
                alpha,
                verbose,
                quiet,
            };
            let failures = regress::run_regress(&predictor, &response, &config, &options)?;
            if failures > 0 {
                std::process::exit(1);
            }
        }
        Commands::Neff {
            input,
            with,
            period,
            anomaly,
        } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(start) = period.start {
                config.period.start = Some(start);
            }
            if let Some(end) = period.end {
                config.period.end = Some(end);
            }
            if anomaly {
                config.period.remove_annual_cycle = true;
            }
            neff::run_neff(&input, with.as_deref(), &config)?;
        }
        Commands::InitConfig { path } => {
            if path.exists() {
                anyhow::bail!("{} already exists", path.display());
            }
            AnalysisConfig::default()
                .save(&path)
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_regress() {
        let cli = Cli::try_parse_from([
            "climsig",
            "regress",
            "--predictor",
            "nino34.txt",
            "--response",
            "tio.txt",
            "spo.txt",
            "--start",
            "2015-01",
            "--end",
            "2020-12",
            "--dof-model",
            "lag-sum",
        ])
        .unwrap();

        match cli.command {
            Commands::Regress {
                response,
                period,
                dof_model,
                alpha,
                ..
            } => {
                assert_eq!(response.len(), 2);
                assert_eq!(period.start, Some(YearMonth::new(2015, 1).unwrap()));
                assert_eq!(dof_model, Some(DofModelKind::LagSum));
                assert_eq!(alpha, 0.05);
            }
            _ => panic!("expected regress"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_month() {
        assert!(Cli::try_parse_from([
            "climsig", "neff", "--input", "a.txt", "--start", "2015-13"
        ])
        .is_err());
    }
}
