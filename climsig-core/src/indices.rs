//! Monthly climate index tables (Niño3.4, IOD, QBO) in the NOAA PSL layout.
//!
//! ```text
//!  1870 2020
//!  1870   -1.00   -1.20  ...  (12 monthly values)
//!  ...
//!  2020    0.48    0.39  ...
//!   -99.99
//!   Nino Anom 3.4 Index using ersstv5 from CPC
//! ```
//!
//! The header gives the first and last year, one row per year follows, then
//! the missing-value marker and free-text description lines.

use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

pub const MONTHS_PER_YEAR: usize = 12;

/// Header years must be four-digit calendar years.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

/// A calendar month, ordered chronologically. Serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    pub year: i32,
    /// 1-based
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, IndexError> {
        if !(1..=12).contains(&month) {
            return Err(IndexError::InvalidMonth(format!("{}-{}", year, month)));
        }
        Ok(Self { year, month })
    }

    /// Parse `YYYY-MM` (also accepts `YYYY.MM`).
    pub fn parse(s: &str) -> Result<Self, IndexError> {
        let normalized = s.trim().replace('.', "-");
        let date = NaiveDate::parse_from_str(&format!("{}-01", normalized), "%Y-%m-%d")
            .map_err(|_| IndexError::InvalidMonth(s.to_string()))?;
        Ok(Self::from(date))
    }

    /// Months elapsed since January of year 0.
    fn ordinal(&self) -> i64 {
        self.year as i64 * MONTHS_PER_YEAR as i64 + (self.month as i64 - 1)
    }

    /// Number of months from `self` to `end`, both inclusive (0 if `end` precedes `self`).
    pub fn months_through(&self, end: YearMonth) -> usize {
        (end.ordinal() - self.ordinal() + 1).max(0) as usize
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = IndexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<YearMonth> for String {
    fn from(ym: YearMonth) -> Self {
        ym.to_string()
    }
}

impl std::str::FromStr for YearMonth {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}


/// One monthly index, twelve values per year, NaN where the file marks a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyIndex {
    pub name: String,
    pub first_year: i32,
    pub last_year: i32,
    pub missing_value: Option<f64>,
    pub values: Vec<f64>,
    pub description: Vec<String>,
}

impl MonthlyIndex {
    pub fn start(&self) -> YearMonth {
        YearMonth {
            year: self.first_year,
            month: 1,
        }
    }

    pub fn end(&self) -> YearMonth {
        YearMonth {
            year: self.last_year,
            month: 12,
        }
    }

    /// Values from `start` through `end` inclusive.
    pub fn slice(&self, start: YearMonth, end: YearMonth) -> Result<Vec<f64>, IndexError> {
        if start > end || start < self.start() || end > self.end() {
            return Err(IndexError::OutOfRange {
                start: start.to_string(),
                end: end.to_string(),
                first_year: self.first_year,
                last_year: self.last_year,
            });
        }
        let offset = self.start().months_through(start) - 1;
        let len = start.months_through(end);
        Ok(self.values[offset..offset + len].to_vec())
    }

    /// Number of NaN (missing) values in the table.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

fn parse_err(line: usize, reason: impl Into<String>) -> IndexError {
    IndexError::Parse {
        line,
        reason: reason.into(),
    }
}

/// Parse the contents of a PSL monthly table.
pub fn parse_psl_table(name: &str, contents: &str) -> Result<MonthlyIndex, IndexError> {
    let mut lines = contents
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| parse_err(1, "empty file"))?;
    let years: Vec<i32> = header
        .split_whitespace()
        .map(str::parse::<i32>)
        .collect::<Result<_, _>>()
        .map_err(|_| parse_err(header_line, "header must be '<first_year> <last_year>'"))?;
    let (first_year, last_year) = match years.as_slice() {
        [first, last] if first <= last => (*first, *last),
        _ => return Err(parse_err(header_line, "header must be '<first_year> <last_year>'")),
    };
    if !YEAR_RANGE.contains(&first_year) || !YEAR_RANGE.contains(&last_year) {
        return Err(parse_err(
            header_line,
            format!("years must lie in {}..={}", YEAR_RANGE.start(), YEAR_RANGE.end()),
        ));
    }

    let mut raw = Vec::new();
    let mut last_line = header_line;
    for expected_year in first_year..=last_year {
        let (line_no, line) = lines.next().ok_or_else(|| {
            parse_err(
                last_line,
                format!("unexpected end of file, missing row for year {}", expected_year),
            )
        })?;
        last_line = line_no;
        let mut fields = line.split_whitespace();
        let year: i32 = fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| parse_err(line_no, "row must start with a year"))?;
        if year != expected_year {
            return Err(parse_err(
                line_no,
                format!("expected year {}, found {}", expected_year, year),
            ));
        }
        let row: Vec<f64> = fields
            .map(str::parse::<f64>)
            .collect::<Result<_, _>>()
            .map_err(|e| parse_err(line_no, format!("bad value: {}", e)))?;
        if row.len() != MONTHS_PER_YEAR {
            return Err(parse_err(
                line_no,
                format!("expected {} monthly values, found {}", MONTHS_PER_YEAR, row.len()),
            ));
        }
        raw.extend(row);
    }

    // The line after the table is the missing-value marker when it is a single number
    let mut description = Vec::new();
    let mut missing_value = None;
    if let Some((_, line)) = lines.next() {
        match line.parse::<f64>() {
            Ok(v) => missing_value = Some(v),
            Err(_) => description.push(line.to_string()),
        }
    }
    description.extend(lines.map(|(_, l)| l.to_string()));

    let values = raw
        .into_iter()
        .map(|v| match missing_value {
            Some(m) if (v - m).abs() < 1e-6 => f64::NAN,
            _ => v,
        })
        .collect();

    Ok(MonthlyIndex {
        name: name.to_string(),
        first_year,
        last_year,
        missing_value,
        values,
        description,
    })
}

/// Read a PSL monthly table from disk; the file stem becomes the index name.
pub fn read_psl_table<P: AsRef<Path>>(path: P) -> Result<MonthlyIndex, IndexError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_psl_table(&name, &contents)
}

/// Subtract the mean of each calendar month (the annual cycle).
///
/// `values[0]` is taken to be the first calendar month of the cycle; NaN
/// entries are skipped when forming climatology and stay NaN.
pub fn remove_annual_cycle(values: &[f64]) -> Vec<f64> {
    let mut sums = [0.0; MONTHS_PER_YEAR];
    let mut counts = [0usize; MONTHS_PER_YEAR];
    for (i, &v) in values.iter().enumerate() {
        if v.is_finite() {
            sums[i % MONTHS_PER_YEAR] += v;
            counts[i % MONTHS_PER_YEAR] += 1;
        }
    }
    let climatology: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { f64::NAN })
        .collect();

    values
        .iter()
        .enumerate()
        .map(|(i, &v)| v - climatology[i % MONTHS_PER_YEAR])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "  2019 2021
 2019   0.70   0.74   0.78   0.75   0.57   0.54   0.30   0.04   0.11   0.31   0.53   0.48
 2020   0.51   0.44   0.52   0.32  -0.11  -0.28  -0.30  -0.58  -0.84  -1.26  -1.16  -1.06
 2021  -0.97  -0.86  -0.66  -0.46  -0.21  -0.14  -0.30  -0.51  -0.65  -0.87  -1.01  -99.99
  -99.99
  Nino 3.4 anomaly
  Source: example
";

    #[test]
    fn test_parse_sample() {
        let idx = parse_psl_table("nino34", SAMPLE).unwrap();
        assert_eq!(idx.first_year, 2019);
        assert_eq!(idx.last_year, 2021);
        assert_eq!(idx.values.len(), 36);
        assert_eq!(idx.missing_value, Some(-99.99));
        assert_eq!(idx.missing_count(), 1);
        assert!(idx.values[35].is_nan());
        assert_eq!(idx.values[12], 0.51);
        assert_eq!(idx.description, vec!["Nino 3.4 anomaly", "Source: example"]);
    }

    #[test]
    fn test_slice_inclusive() {
        let idx = parse_psl_table("nino34", SAMPLE).unwrap();
        let s = idx
            .slice(YearMonth::new(2019, 12).unwrap(), YearMonth::new(2020, 2).unwrap())
            .unwrap();
        assert_eq!(s, vec![0.48, 0.51, 0.44]);

        let all = idx.slice(idx.start(), idx.end()).unwrap();
        assert_eq!(all.len(), 36);
    }

    #[test]
    fn test_slice_out_of_range() {
        let idx = parse_psl_table("nino34", SAMPLE).unwrap();
        assert!(matches!(
            idx.slice(YearMonth::new(2018, 12).unwrap(), YearMonth::new(2019, 3).unwrap()),
            Err(IndexError::OutOfRange { .. })
        ));
        assert!(matches!(
            idx.slice(YearMonth::new(2020, 3).unwrap(), YearMonth::new(2020, 2).unwrap()),
            Err(IndexError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_psl_table("x", ""),
            Err(IndexError::Parse { .. })
        ));
        assert!(matches!(
            parse_psl_table("x", "2020 2019\n"),
            Err(IndexError::Parse { .. })
        ));
        let short_row = "2020 2020\n2020 1 2 3\n";
        assert!(matches!(
            parse_psl_table("x", short_row),
            Err(IndexError::Parse { line: 2, .. })
        ));
        let wrong_year = "2020 2020\n2021 1 2 3 4 5 6 7 8 9 10 11 12\n";
        assert!(matches!(
            parse_psl_table("x", wrong_year),
            Err(IndexError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_header_years_out_of_range() {
        for header in ["-2147483648 2147483647\n", "1 100000000\n", "0 2020\n"] {
            assert!(
                matches!(
                    parse_psl_table("x", header),
                    Err(IndexError::Parse { line: 1, .. })
                ),
                "header {:?} should be rejected",
                header
            );
        }
    }

    #[test]
    fn test_truncated_table_reports_last_line() {
        let truncated = "2020 2021\n\n2020 1 2 3 4 5 6 7 8 9 10 11 12\n";
        match parse_psl_table("x", truncated) {
            Err(IndexError::Parse { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("2021"));
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_missing_marker() {
        let idx = parse_psl_table("x", "2020 2020\n2020 1 2 3 4 5 6 7 8 9 10 11 12\n").unwrap();
        assert_eq!(idx.missing_value, None);
        assert!(idx.description.is_empty());
    }

    #[test]
    fn test_year_month_parse_and_order() {
        let a = YearMonth::parse("2010-12").unwrap();
        let b: YearMonth = "2021.02".parse().unwrap();
        assert_eq!(a, YearMonth { year: 2010, month: 12 });
        assert!(a < b);
        assert_eq!(a.months_through(b), 123);
        assert_eq!(b.to_string(), "2021-02");
        assert!(YearMonth::parse("2021-13").is_err());
        assert!(YearMonth::new(2021, 0).is_err());
    }

    #[test]
    fn test_remove_annual_cycle() {
        let cycle: Vec<f64> = (0..36).map(|i| (i % 12) as f64 + (i / 12) as f64).collect();
        let anomalies = remove_annual_cycle(&cycle);
        // Each calendar month: values m, m+1, m+2 -> anomalies -1, 0, 1
        assert!((anomalies[0] + 1.0).abs() < 1e-12);
        assert!(anomalies[12].abs() < 1e-12);
        assert!((anomalies[35] - 1.0).abs() < 1e-12);
    }
}
