//! Progress bar display while response indices are analyzed.
//!
//! Only drawn when stderr is a terminal and output is not suppressed.

use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;

pub struct RegressProgress {
    bar: Option<ProgressBar>,
}

impl RegressProgress {
    pub fn new(total: u64, quiet: bool) -> Self {
        let enabled = std::io::stderr().is_terminal() && !quiet && total > 1;
        if !enabled {
            return Self { bar: None };
        }

        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{prefix:>12.cyan.bold} [{bar:30.green/dim}] {pos}/{len} {msg}")
            .map(|s| s.progress_chars("━━╺"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_prefix("Analyzing");
        Self { bar: Some(pb) }
    }

    pub fn is_enabled(&self) -> bool {
        self.bar.is_some()
    }

    pub fn start(&self, name: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(name.to_string());
        }
    }

    /// Run `f` with the bar hidden so printed lines don't interleave with it
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        match &self.bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    pub fn advance(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_disables_bar() {
        let progress = RegressProgress::new(10, true);
        assert!(!progress.is_enabled());
        // All operations are no-ops without a bar
        progress.start("tio");
        assert_eq!(progress.suspend(|| 42), 42);
        progress.advance();
        progress.finish();
    }

    #[test]
    fn test_single_item_has_no_bar() {
        assert!(!RegressProgress::new(1, false).is_enabled());
    }
}
