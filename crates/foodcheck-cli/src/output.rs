//! Text rendering of scenarios and reports

use console::style;
use foodcheck::{Scenario, ScenarioReport, SuiteReport};

/// Renders reports as colored text
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode: summary and failures only
    pub quiet: bool,
}

impl Printer {
    /// Create a printer
    #[must_use]
    pub const fn new(use_color: bool, quiet: bool) -> Self {
        Self { use_color, quiet }
    }

    fn paint(&self, text: String, color: console::Color) -> String {
        if self.use_color {
            style(text).fg(color).to_string()
        } else {
            text
        }
    }

    /// One line per scenario, failures followed by their details
    #[must_use]
    pub fn scenario_line(&self, report: &ScenarioReport) -> String {
        let mut out = if report.passed() {
            self.paint(
                format!("✓ {} ({}ms)", report.scenario, report.duration_ms),
                console::Color::Green,
            )
        } else {
            self.paint(
                format!("✗ {} ({}ms)", report.scenario, report.duration_ms),
                console::Color::Red,
            )
        };
        if let Some(failure) = &report.failure {
            out.push_str(&format!("\n    [{}] {}", failure.state, failure.message));
        }
        for extra in &report.cleanup_failures {
            out.push('\n');
            out.push_str(&self.paint(
                format!("    cleanup: {}", extra.message),
                console::Color::Yellow,
            ));
        }
        out
    }

    /// Full text report
    #[must_use]
    pub fn suite(&self, report: &SuiteReport) -> String {
        let mut lines: Vec<String> = report
            .scenarios
            .iter()
            .filter(|s| !self.quiet || !s.passed())
            .map(|s| self.scenario_line(s))
            .collect();
        let summary = report.summary();
        let color = if report.passed() {
            console::Color::Green
        } else {
            console::Color::Red
        };
        lines.push(self.paint(format!("{summary} (run {})", report.run_id), color));
        lines.join("\n")
    }

    /// Scenario listing
    #[must_use]
    pub fn scenarios(&self, scenarios: &[Scenario]) -> String {
        scenarios
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let category = if s.select_category {
                    s.category_label.clone()
                } else {
                    format!("{} (form default)", s.category_label)
                };
                format!("{:>2}. {:<14} {:<16} exotic={:<5} {}", i + 1, s.name, category, s.exotic, s.kind)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use foodcheck::{FailureRecord, HarnessError, ScenarioState};

    fn report(failure: Option<FailureRecord>) -> ScenarioReport {
        ScenarioReport {
            scenario: Scenario::add("Potato", "Vegetable", false),
            final_state: if failure.is_some() {
                ScenarioState::Failed
            } else {
                ScenarioState::CleanedUp
            },
            transitions: vec![ScenarioState::Init],
            verdict: None,
            inserted: 1,
            deleted: Some(1),
            failure,
            cleanup_failures: Vec::new(),
            duration_ms: 7,
        }
    }

    #[test]
    fn test_passing_line() {
        let line = Printer::new(false, false).scenario_line(&report(None));
        assert_eq!(line, "✓ add (Potato, Vegetable, false) (7ms)");
    }

    #[test]
    fn test_failing_line_has_state_and_message() {
        let failure = FailureRecord::new(ScenarioState::Submitted, &HarnessError::driver("gone"));
        let line = Printer::new(false, false).scenario_line(&report(Some(failure)));
        assert!(line.starts_with("✗ add"));
        assert!(line.contains("[submitted] Driver error: gone"));
    }

    #[test]
    fn test_quiet_suite_hides_passes() {
        let mut suite = SuiteReport::new();
        suite.push(report(None));
        let text = Printer::new(false, true).suite(&suite);
        assert!(!text.contains("Potato"));
        assert!(text.starts_with("1/1 passed"));
    }

    #[test]
    fn test_listing_marks_form_default() {
        let list = Printer::new(false, false).scenarios(&[
            Scenario::add("Potato", "Vegetable", false).without_category_select(),
        ]);
        assert!(list.contains("(form default)"));
        assert!(list.trim_start().starts_with("1. Potato"));
    }
}
