//! `climsig neff`: persistence diagnostics for one index or a pair.

use anyhow::Result;
use climsig_core::config::AnalysisConfig;
use climsig_core::effective_dof::effective_dof_with;
use climsig_core::statistics::lag1_autocorrelation;
use colored::*;
use std::path::Path;

use crate::regress::{load_index, prepare_series, resolve_period};

fn format_r1(r1: Option<f64>) -> String {
    match r1 {
        Some(r) => format!("{:.3}", r),
        None => "undefined".to_string(),
    }
}

pub fn run_neff(input: &Path, with: Option<&Path>, config: &AnalysisConfig) -> Result<()> {
    let first = load_index(input)?;
    let second = with.map(load_index).transpose()?;

    let mut all = vec![&first];
    if let Some(ref s) = second {
        all.push(s);
    }
    let period = resolve_period(&all, &config.period)?;
    let anomaly = config.period.remove_annual_cycle;

    let a = prepare_series(&first, period, anomaly)?;
    let b = match &second {
        Some(s) => Some(prepare_series(s, period, anomaly)?),
        None => None,
    };

    let model = config.significance.dof_model();
    let neff = effective_dof_with(&a, b.as_deref(), model)?;

    println!(
        "{} {} to {} ({} months, model: {:?})",
        "Period:".cyan().bold(),
        period.0,
        period.1,
        a.len(),
        model
    );
    println!("  {}  {}", format!("r1({}):", first.name).cyan(), format_r1(lag1_autocorrelation(&a)));
    if let (Some(s), Some(b)) = (&second, &b) {
        println!("  {}  {}", format!("r1({}):", s.name).cyan(), format_r1(lag1_autocorrelation(b)));
    }
    println!(
        "  {}  {:.2} of {} ({:.0}%)",
        "Neff:".cyan(),
        neff,
        a.len(),
        neff / a.len() as f64 * 100.0
    );
    if neff <= 2.0 {
        println!(
            "{} series too persistent for a corrected t-test (Neff <= 2)",
            "Warning:".yellow().bold()
        );
    }

    Ok(())
}
