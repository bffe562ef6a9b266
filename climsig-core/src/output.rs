use crate::analysis::RegressionReport;
use colored::*;
use std::fs;
use std::path::Path;

pub fn save_report_to_file<P: AsRef<Path>>(
    report: &RegressionReport,
    path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_report_from_file<P: AsRef<Path>>(
    path: P,
) -> Result<RegressionReport, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)?;
    let report = serde_json::from_str(&json)?;
    Ok(report)
}

pub fn save_reports_to_file<P: AsRef<Path>>(
    reports: &[RegressionReport],
    path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(reports)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_reports_from_file<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<RegressionReport>, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(path)?;
    let reports = serde_json::from_str(&json)?;
    Ok(reports)
}

/// Format a p-value, switching to scientific notation below 0.001
pub fn format_p_value(p: f64) -> String {
    if p < 0.001 {
        format!("{:.2e}", p)
    } else {
        format!("{:.3}", p)
    }
}

/// Naive statistics line: R², slope ± half-width, p-value
pub fn format_naive_line(report: &RegressionReport) -> String {
    format!(
        "{} {} R²={:.3}  slope={:.2} ±{:.2}  p={}",
        "REGR".green().bold(),
        format!("{} ~ {}", report.response, report.predictor).cyan(),
        report.fit.r_squared(),
        report.fit.slope,
        report.naive_band.slope_half_width(),
        format_p_value(report.fit.p_value).bold()
    )
}

/// Corrected statistics line: N, Neff, slope ± half-width, revised p-value
pub fn format_corrected_line(report: &RegressionReport) -> String {
    let header = format!("N={}  Neff={:.2}", report.fit.n, report.neff);
    match (&report.corrected, &report.corrected_band) {
        (Some(sig), Some(band)) => {
            let p_str = format_p_value(sig.p_value);
            let p_colored = if sig.p_value < 0.05 {
                p_str.green().bold()
            } else {
                p_str.yellow()
            };
            format!(
                "        {} {}  slope={:.2} ±{:.2}  revised p={}",
                "NEFF".blue().bold(),
                header.dimmed(),
                report.fit.slope,
                band.slope_half_width(),
                p_colored
            )
        }
        _ => format!(
            "        {} {}  {}",
            "NEFF".blue().bold(),
            header.dimmed(),
            report
                .corrected_error
                .as_deref()
                .unwrap_or("no corrected statistics")
                .red()
        ),
    }
}

/// Print a single report (naive line, corrected line, optional cross-check)
pub fn print_report(report: &RegressionReport, verbose: bool) {
    println!("{}", format_naive_line(report));
    println!("{}", format_corrected_line(report));

    if verbose {
        println!(
            "        {} linregress p={}  own calculation with Neff=N p={}",
            "CHECK".dimmed(),
            format_p_value(report.fit.p_value),
            format_p_value(report.naive_check.p_value)
        );
        if let Some((start, end)) = report.period {
            println!("        {} {} to {}", "Period:".dimmed(), start, end);
        }
    }
}

/// Print summary footer
pub fn print_summary(reports: &[RegressionReport], failures: usize, alpha: f64) {
    let significant = reports.iter().filter(|r| r.is_significant(alpha)).count();
    let undetermined = reports.iter().filter(|r| r.corrected.is_none()).count();
    let not_significant = reports.len() - significant - undetermined;

    println!("{}", "─".repeat(80).dimmed());
    println!(
        "{} {} total: {} {}, {} {}, {} {}{}",
        "Summary:".cyan().bold(),
        reports.len() + failures,
        significant,
        "significant".green(),
        not_significant,
        "not significant".dimmed(),
        undetermined,
        if undetermined > 0 {
            "undetermined".yellow().bold()
        } else {
            "undetermined".dimmed()
        },
        if failures > 0 {
            format!(", {} {}", failures, "failed".red().bold())
        } else {
            String::new()
        }
    );

    if undetermined > 0 {
        println!(
            "{} {} pair(s) too persistent for a corrected t-test (Neff <= 2)",
            "Warning:".yellow().bold(),
            undetermined
        );
    }
}
