//! Scenario and suite reports.
//!
//! Reports are plain serde data so the CLI can print them as text or JSON.

use crate::consistency::ConsistencyVerdict;
use crate::result::{HarnessError, HarnessResult};
use crate::scenario::{Scenario, ScenarioState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A failure and the state it happened in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Last state reached before the failure
    pub state: ScenarioState,
    /// Stable error label, see [`HarnessError::kind`]
    pub kind: String,
    /// Rendered error
    pub message: String,
}

impl FailureRecord {
    /// Record `error` as raised in `state`
    #[must_use]
    pub fn new(state: ScenarioState, error: &HarnessError) -> Self {
        Self {
            state,
            kind: error.kind().to_string(),
            message: error.to_string(),
        }
    }
}

/// Outcome of one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Scenario as run
    pub scenario: Scenario,
    /// `CleanedUp` or `Failed`
    pub final_state: ScenarioState,
    /// Every state entered, in order
    pub transitions: Vec<ScenarioState>,
    /// Storage verdict after the save, if verification got that far
    pub verdict: Option<ConsistencyVerdict>,
    /// Rows the scenario inserted (seeded plus submitted)
    pub inserted: usize,
    /// Rows removed by cleanup, if it issued a delete
    pub deleted: Option<usize>,
    /// First failure of the scenario
    pub failure: Option<FailureRecord>,
    /// Further failures raised during cleanup
    pub cleanup_failures: Vec<FailureRecord>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl ScenarioReport {
    /// Report for a scenario whose context could not be built
    #[must_use]
    pub fn not_started(scenario: Scenario, error: &HarnessError) -> Self {
        Self {
            scenario,
            final_state: ScenarioState::Failed,
            transitions: vec![ScenarioState::Init, ScenarioState::Failed],
            verdict: None,
            inserted: 0,
            deleted: None,
            failure: Some(FailureRecord::new(ScenarioState::Init, error)),
            cleanup_failures: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Whether the scenario finished cleanly
    #[must_use]
    pub fn passed(&self) -> bool {
        self.final_state == ScenarioState::CleanedUp && self.failure.is_none()
    }

    /// Whether any cleanup step failed.
    ///
    /// A cleanup error on an otherwise verified scenario becomes `failure`
    /// and keeps the `Verified` state, so it counts here as well.
    #[must_use]
    pub fn cleanup_failed(&self) -> bool {
        !self.cleanup_failures.is_empty()
            || self
                .failure
                .as_ref()
                .is_some_and(|f| f.state == ScenarioState::Verified)
    }
}

/// Counts over a suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    /// Scenarios run
    pub total: usize,
    /// Scenarios that ended `CleanedUp`
    pub passed: usize,
    /// Scenarios that ended `Failed`
    pub failed: usize,
    /// Scenarios whose cleanup failed, see [`ScenarioReport::cleanup_failed`]
    pub dirty: usize,
}

impl std::fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} passed", self.passed, self.total)?;
        if self.dirty > 0 {
            write!(f, ", {} with cleanup failures", self.dirty)?;
        }
        Ok(())
    }
}

/// Outcome of a suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Unique run identifier
    pub run_id: Uuid,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time, set by [`SuiteReport::finish`]
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-scenario reports in run order
    pub scenarios: Vec<ScenarioReport>,
}

impl Default for SuiteReport {
    fn default() -> Self {
        Self::new()
    }
}

impl SuiteReport {
    /// Start an empty report
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            scenarios: Vec::new(),
        }
    }

    /// Append a scenario report
    pub fn push(&mut self, report: ScenarioReport) {
        self.scenarios.push(report);
    }

    /// Stamp the end time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Number of passing scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    /// Number of failing scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.scenarios.len() - self.passed_count()
    }

    /// Whether every scenario passed
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failed_count() == 0
    }

    /// Failing scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.passed()).collect()
    }

    /// Counts over the suite
    #[must_use]
    pub fn summary(&self) -> SuiteSummary {
        SuiteSummary {
            total: self.scenarios.len(),
            passed: self.passed_count(),
            failed: self.failed_count(),
            dirty: self
                .scenarios
                .iter()
                .filter(|s| s.cleanup_failed())
                .count(),
        }
    }

    /// Pretty JSON rendering
    pub fn to_json(&self) -> HarnessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn report(name: &str, state: ScenarioState, failure: Option<HarnessError>) -> ScenarioReport {
        ScenarioReport {
            scenario: Scenario::add(name, "Vegetable", false),
            final_state: state,
            transitions: vec![ScenarioState::Init, state],
            verdict: None,
            inserted: 1,
            deleted: Some(1),
            failure: failure.map(|e| FailureRecord::new(ScenarioState::Init, &e)),
            cleanup_failures: Vec::new(),
            duration_ms: 3,
        }
    }

    #[test]
    fn test_summary_counts() {
        let mut suite = SuiteReport::new();
        suite.push(report("Potato", ScenarioState::CleanedUp, None));
        let mut bad = report(
            "Apple",
            ScenarioState::Failed,
            Some(HarnessError::driver("gone")),
        );
        bad.cleanup_failures.push(FailureRecord::new(
            ScenarioState::Init,
            &HarnessError::driver("close failed"),
        ));
        suite.push(bad);
        let summary = suite.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.dirty, 1);
        assert_eq!(summary.to_string(), "1/2 passed, 1 with cleanup failures");
        assert!(!suite.passed());
        assert_eq!(suite.failures()[0].scenario.name, "Apple");
    }

    #[test]
    fn test_cleanup_only_failure_counts_as_dirty() {
        let mut suite = SuiteReport::new();
        let mut leaked = report("Potato", ScenarioState::Failed, None);
        leaked.failure = Some(FailureRecord::new(
            ScenarioState::Verified,
            &HarnessError::CleanupMismatch {
                name: "Potato".into(),
                expected: 1,
                actual: 0,
            },
        ));
        suite.push(leaked);
        suite.push(report(
            "Apple",
            ScenarioState::Failed,
            Some(HarnessError::driver("gone")),
        ));
        let summary = suite.summary();
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.dirty, 1);
        assert!(suite.scenarios[0].cleanup_failed());
        assert!(!suite.scenarios[1].cleanup_failed());
    }

    #[test]
    fn test_json_shape() {
        let mut suite = SuiteReport::new();
        suite.push(report("Potato", ScenarioState::CleanedUp, None));
        suite.finish();
        let value: serde_json::Value = serde_json::from_str(&suite.to_json().unwrap()).unwrap();
        assert_eq!(value["scenarios"][0]["final_state"], "cleaned_up");
        assert_eq!(value["scenarios"][0]["scenario"]["kind"], "add");
        assert!(value["finished_at"].is_string());
    }

    #[test]
    fn test_not_started() {
        let r = ScenarioReport::not_started(
            Scenario::add("Potato", "Vegetable", false),
            &HarnessError::driver("no browser"),
        );
        assert!(!r.passed());
        assert_eq!(r.failure.unwrap().kind, "driver");
    }
}
