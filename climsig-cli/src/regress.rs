//! `climsig regress`: one report per response index against a shared predictor.

use anyhow::{Context, Result};
use climsig_core::config::{AnalysisConfig, PeriodConfig};
use climsig_core::indices::{read_psl_table, remove_annual_cycle};
use climsig_core::{
    analyze_pair, print_report, print_summary, save_reports_to_file, MonthlyIndex, PairLabels,
    RegressionReport, YearMonth,
};
use colored::*;
use std::path::{Path, PathBuf};

use crate::progress::RegressProgress;

pub struct RegressOptions {
    pub json: Option<PathBuf>,
    pub alpha: f64,
    pub verbose: bool,
    pub quiet: bool,
}

pub fn load_index(path: &Path) -> Result<MonthlyIndex> {
    read_psl_table(path).with_context(|| format!("Failed to read index file {}", path.display()))
}

/// Configured period, defaulting to the range every index covers
pub fn resolve_period(indices: &[&MonthlyIndex], period: &PeriodConfig) -> Result<(YearMonth, YearMonth)> {
    let common_start = indices.iter().map(|i| i.start()).max();
    let common_end = indices.iter().map(|i| i.end()).min();
    let (Some(common_start), Some(common_end)) = (common_start, common_end) else {
        anyhow::bail!("No index files given");
    };

    let start = period.start.unwrap_or(common_start);
    let end = period.end.unwrap_or(common_end);
    if start > end {
        anyhow::bail!("Empty analysis period: {} to {}", start, end);
    }
    Ok((start, end))
}

/// Slice an index to the period and optionally remove its annual cycle
pub fn prepare_series(index: &MonthlyIndex, period: (YearMonth, YearMonth), anomaly: bool) -> Result<Vec<f64>> {
    let values = index
        .slice(period.0, period.1)
        .with_context(|| format!("Index '{}' does not cover the analysis period", index.name))?;
    Ok(if anomaly {
        remove_annual_cycle(&values)
    } else {
        values
    })
}

/// Returns the number of responses that could not be analyzed
pub fn run_regress(
    predictor_path: &Path,
    response_paths: &[PathBuf],
    config: &AnalysisConfig,
    options: &RegressOptions,
) -> Result<usize> {
    let predictor = load_index(predictor_path)?;

    let mut responses = Vec::with_capacity(response_paths.len());
    for path in response_paths {
        responses.push(load_index(path)?);
    }

    let mut all: Vec<&MonthlyIndex> = vec![&predictor];
    all.extend(responses.iter());
    let period = resolve_period(&all, &config.period)?;
    let anomaly = config.period.remove_annual_cycle;
    let x = prepare_series(&predictor, period, anomaly)?;

    println!(
        "\n{} {} against {} ({} to {}, {} months{})",
        "Regressing".green().bold(),
        if responses.len() == 1 {
            "1 index".to_string()
        } else {
            format!("{} indices", responses.len())
        },
        predictor.name.cyan().bold(),
        period.0,
        period.1,
        x.len(),
        if anomaly { ", annual cycle removed" } else { "" }
    );
    println!();

    let progress = RegressProgress::new(responses.len() as u64, options.quiet);
    let mut reports: Vec<RegressionReport> = Vec::with_capacity(responses.len());
    let mut failures = 0;

    for response in &responses {
        progress.start(&response.name);

        let outcome = prepare_series(response, period, anomaly).and_then(|y| {
            analyze_pair(
                &x,
                &y,
                PairLabels {
                    predictor: predictor.name.clone(),
                    response: response.name.clone(),
                    period: Some(period),
                },
                &config.significance,
            )
            .map_err(anyhow::Error::from)
        });

        progress.suspend(|| match outcome {
            Ok(report) => {
                print_report(&report, options.verbose);
                reports.push(report);
            }
            Err(e) => {
                failures += 1;
                eprintln!(
                    "{} {} ~ {}: {:#}",
                    "FAILED".red().bold(),
                    response.name,
                    predictor.name,
                    e
                );
            }
        });
        progress.advance();
    }
    progress.finish();

    print_summary(&reports, failures, options.alpha);

    if let Some(path) = &options.json {
        save_reports_to_file(&reports, path)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("{} {}", "Saved".green().bold(), path.display());
    }

    Ok(failures)
}
