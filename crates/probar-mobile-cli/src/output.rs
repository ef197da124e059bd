//! Report rendering and progress reporting

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use probar_mobile::{overall_score, DeviceDescriptor, ReportRecord};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

/// Longest snippet printed in text reports
const MAX_SNIPPET_CHARS: usize = 160;

/// Complete audit report as written to disk or stdout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// Audited URL
    pub url: String,
    /// RFC 3339 timestamp
    pub generated_at: String,
    /// Weighted page score
    pub overall_score: f64,
    /// Per-check records
    pub results: Vec<ReportRecord>,
}

impl AuditReport {
    /// Build a report stamped with the current time
    #[must_use]
    pub fn new(url: impl Into<String>, results: Vec<ReportRecord>) -> Self {
        Self {
            url: url.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            overall_score: overall_score(&results),
            results,
        }
    }

    /// One-line outcome, e.g. `2 of 4 checks failed, overall score 0.75`
    #[must_use]
    pub fn summary(&self) -> String {
        let failed = self.results.iter().filter(|r| !r.passed()).count();
        format!(
            "{failed} of {} checks failed, overall score {:.2}",
            self.results.len(),
            self.overall_score
        )
    }
}

fn truncate(snippet: &str) -> String {
    let single_line = snippet.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= MAX_SNIPPET_CHARS {
        single_line
    } else {
        let cut: String = single_line.chars().take(MAX_SNIPPET_CHARS).collect();
        format!("{cut}…")
    }
}

/// Render a report as human-readable text
#[must_use]
pub fn render_text(report: &AuditReport, use_color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Mobile-friendliness audit of {}", report.url);
    let _ = writeln!(out);

    for record in &report.results {
        let status = match (record.passed(), use_color) {
            (true, true) => style("PASS").green().bold().to_string(),
            (false, true) => style("FAIL").red().bold().to_string(),
            (true, false) => "PASS".to_string(),
            (false, false) => "FAIL".to_string(),
        };
        let _ = writeln!(
            out,
            "{status} {:<24} score {:.2}  weight {:.2}",
            record.title, record.score, record.weight
        );

        for evidence in &record.snippets {
            let _ = writeln!(out, "     {}", truncate(evidence.snippet()));
        }
        for recommendation in record.recommendations.iter().flatten() {
            let _ = writeln!(out, "     → {}", recommendation.render());
        }
    }

    let _ = writeln!(out);
    let score = format!("{:.2}", report.overall_score);
    let score = if !use_color {
        score
    } else if report.overall_score >= 1.0 {
        style(score).green().bold().to_string()
    } else {
        style(score).yellow().bold().to_string()
    };
    let _ = writeln!(out, "Overall score: {score}");
    out
}

/// Render a report as pretty-printed JSON
pub fn render_json(report: &AuditReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

/// Render the device catalog as a table
#[must_use]
pub fn render_devices_text(devices: &[DeviceDescriptor]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<12} {:>10} {:>6} {:>7} {:>6}",
        "NAME", "VIEWPORT", "SCALE", "MOBILE", "TOUCH"
    );
    for device in devices {
        let viewport = format!("{}x{}", device.viewport.width, device.viewport.height);
        let _ = writeln!(
            out,
            "{:<12} {:>10} {:>6.1} {:>7} {:>6}",
            device.name,
            viewport,
            device.device_scale_factor,
            if device.is_mobile { "yes" } else { "no" },
            device.touch.max_touch_points()
        );
    }
    out
}

/// Progress reporter for audit execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    spinner: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            spinner: None,
            use_color,
            quiet,
        }
    }

    /// Start a spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.quiet {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    /// Update the spinner message
    pub fn set_message(&self, message: &str) {
        if let Some(ref spinner) = self.spinner {
            spinner.set_message(message.to_string());
        }
    }

    /// Stop and clear the spinner
    pub fn finish(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use probar_mobile::{aggregate, CheckId, CheckOutcome, DeviceCatalog, Evidence, FailureMap};

    fn failing_report() -> AuditReport {
        let mut failures = FailureMap::new();
        failures.record(
            CheckId::FontSize,
            "iPhone 7",
            CheckOutcome::fail(vec![Evidence::Markup("<p>tiny</p>".to_string())]),
        );
        failures.record(CheckId::Viewport, "iPhone 7", CheckOutcome::fail(Vec::new()));
        AuditReport::new("https://example.com", aggregate(&failures))
    }

    mod text_tests {
        use super::*;

        #[test]
        fn test_plain_text_report() {
            let text = render_text(&failing_report(), false);
            assert!(text.contains("Mobile-friendliness audit of https://example.com"));
            assert!(text.contains("PASS Horizontal overflow"));
            assert!(text.contains("FAIL Viewport meta tag"));
            assert!(text.contains("FAIL Font size readability"));
            assert!(text.contains("<p>tiny</p>"));
            assert!(text.contains("detected on the following devices: iPhone 7."));
            assert!(text.contains("Overall score: 0.75"));
        }

        #[test]
        fn test_summary_counts_failed_checks() {
            assert_eq!(
                failing_report().summary(),
                "2 of 4 checks failed, overall score 0.75"
            );
            let clean = AuditReport::new("https://example.com", aggregate(&FailureMap::new()));
            assert_eq!(clean.summary(), "0 of 4 checks failed, overall score 1.00");
        }

        #[test]
        fn test_long_snippets_are_truncated() {
            let long = format!("<div class=\"{}\">", "x".repeat(500));
            let shown = truncate(&long);
            assert_eq!(shown.chars().count(), MAX_SNIPPET_CHARS + 1);
            assert!(shown.ends_with('…'));
            assert_eq!(truncate("<p>\n  hi\n</p>"), "<p> hi </p>");
        }

        #[test]
        fn test_devices_table() {
            let text = render_devices_text(DeviceCatalog::new().devices());
            assert!(text.starts_with("NAME"));
            assert!(text.contains("iPhone 7"));
            assert!(text.contains("375x667"));
            assert!(text.contains("iPad Pro"));
        }
    }

    mod json_tests {
        use super::*;

        #[test]
        fn test_json_report_shape() {
            let json = render_json(&failing_report()).unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["url"], "https://example.com");
            assert_eq!(value["overallScore"], 0.75);
            assert_eq!(value["results"].as_array().unwrap().len(), 4);
            assert_eq!(value["results"][2]["uniqueName"], "fontSize");
            assert!(value["generatedAt"].as_str().unwrap().contains('T'));
        }
    }

    #[test]
    fn test_quiet_reporter_has_no_spinner() {
        let mut reporter = ProgressReporter::new(false, true);
        reporter.start("auditing");
        assert!(reporter.spinner.is_none());
        reporter.finish();
    }
}
