//! Progress reporting for a running count.
//!
//! The coordinator only talks to [`ProgressReporter`]; the terminal bar is one
//! implementation and [`SilentProgress`] discards everything for `--silent`
//! runs.

use indicatif::{ProgressBar, ProgressStyle};

pub trait ProgressReporter: Send + Sync {
    /// Called once before any segment starts. `None` means the expected total
    /// is unknown.
    fn start(&self, expected_total: Option<u64>);
    fn update(&self, current_value: u64);
    fn finish(&self);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn start(&self, _expected_total: Option<u64>) {}

    fn update(&self, _current_value: u64) {}

    fn finish(&self) {}
}

/// Terminal progress bar drawn on stderr.
///
/// With an intro header set, `start` first prints the header and the
/// approximate item count on stdout, once the expected total is known.
#[derive(Debug, Clone)]
pub struct BarProgress {
    bar: ProgressBar,
    intro: Option<String>,
}

impl BarProgress {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::no_length())
    }

    pub fn with_bar(bar: ProgressBar) -> Self {
        Self { bar, intro: None }
    }

    pub fn with_intro(mut self, header: impl Into<String>) -> Self {
        self.intro = Some(header.into());
        self
    }

    /// Lines printed by `start` before the bar is drawn.
    pub fn intro_lines(&self, expected_total: Option<u64>) -> Vec<String> {
        let Some(header) = &self.intro else {
            return Vec::new();
        };
        let estimate = expected_total
            .map(|total| total.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        vec![header.clone(), format!("Aprox item count: {estimate}")]
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for BarProgress {
    fn start(&self, expected_total: Option<u64>) {
        for line in self.intro_lines(expected_total) {
            println!("{line}");
        }
        match expected_total {
            Some(total) => {
                self.bar.set_style(bar_style());
                self.bar.set_length(total);
            }
            None => self.bar.set_style(spinner_style()),
        }
        self.bar.set_position(0);
    }

    fn update(&self, current_value: u64) {
        self.bar.set_position(current_value);
    }

    /// Leaves the bar at its last clamped position instead of jumping to
    /// the full length when segments stopped early.
    fn finish(&self) {
        self.bar.abandon();
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {pos}/{len} ({eta})")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {pos} items")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_tracks_expected_total_and_position() {
        let progress = BarProgress::with_bar(ProgressBar::hidden());
        progress.start(Some(100));
        progress.update(40);

        assert_eq!(progress.length(), Some(100));
        assert_eq!(progress.position(), 40);

        progress.finish();
        assert_eq!(progress.position(), 40);
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn intro_reports_estimate_after_header() {
        let progress = BarProgress::with_bar(ProgressBar::hidden())
            .with_intro("Counting records for table orders on region eu-west-1...");

        assert_eq!(
            progress.intro_lines(Some(1_500)),
            vec![
                "Counting records for table orders on region eu-west-1...".to_string(),
                "Aprox item count: 1500".to_string(),
            ]
        );
        assert_eq!(progress.intro_lines(None)[1], "Aprox item count: unknown");
    }

    #[test]
    fn bar_without_intro_prints_nothing() {
        let progress = BarProgress::with_bar(ProgressBar::hidden());
        assert!(progress.intro_lines(Some(10)).is_empty());
    }

    #[test]
    fn bar_without_estimate_has_no_length() {
        let progress = BarProgress::with_bar(ProgressBar::hidden());
        progress.start(None);
        progress.update(7);

        assert_eq!(progress.length(), None);
        assert_eq!(progress.position(), 7);
    }
}
