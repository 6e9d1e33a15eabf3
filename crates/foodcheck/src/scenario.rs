//! Scenario Runner - one add-item scenario from precheck to cleanup.
//!
//! ```text
//! Init ─► PrecheckPassed ─► Submitted ─► EffectObserved ─► Verified ─► CleanedUp
//!   │            │              │               │              │
//!   └────────────┴──────────────┴───────────────┴──────────────┴──► Failed
//! ```
//!
//! Cleanup runs on every exit path. It deletes exactly what the scenario
//! inserted, optionally resets the page, and closes the session. A cleanup
//! failure never replaces the failure that ended the scenario.

use crate::consistency::{
    check_row_identity, check_stored_fields, expect_verdict, reconcile, verify,
    verify_ui_contains_row, ConsistencyVerdict,
};
use crate::driver::PageDriver;
use crate::locators::Element;
use crate::page::FoodPage;
use crate::record::{CategoryLabels, FoodRecord};
use crate::report::{FailureRecord, ScenarioReport, SuiteReport};
use crate::result::{HarnessError, HarnessResult};
use crate::storage::FoodStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

// =============================================================================
// SCENARIOS
// =============================================================================

/// What a scenario expects storage to end up with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Add through the form; expect one stored row and one new table row
    #[default]
    Add,
    /// Seed one row directly, then add the same record through the form
    DuplicateSeed,
}

impl ScenarioKind {
    /// Verdict the storage count must reach
    #[must_use]
    pub const fn expected_verdict(self) -> ConsistencyVerdict {
        match self {
            Self::Add => ConsistencyVerdict::Present,
            Self::DuplicateSeed => ConsistencyVerdict::Duplicated,
        }
    }
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::DuplicateSeed => f.write_str("duplicate_seed"),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One input tuple of the suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Record name
    pub name: String,
    /// Visible category label, as chosen in the form
    pub category_label: String,
    /// Exotic flag
    pub exotic: bool,
    /// Expected outcome
    #[serde(default)]
    pub kind: ScenarioKind,
    /// Whether to touch the category select at all
    #[serde(default = "default_true")]
    pub select_category: bool,
}

impl Scenario {
    /// An add scenario
    #[must_use]
    pub fn add(name: impl Into<String>, category_label: impl Into<String>, exotic: bool) -> Self {
        Self {
            name: name.into(),
            category_label: category_label.into(),
            exotic,
            kind: ScenarioKind::Add,
            select_category: true,
        }
    }

    /// A duplicate-seed scenario
    #[must_use]
    pub fn duplicate(name: impl Into<String>, category_label: impl Into<String>, exotic: bool) -> Self {
        Self {
            kind: ScenarioKind::DuplicateSeed,
            ..Self::add(name, category_label, exotic)
        }
    }

    /// Keep the form's default category
    #[must_use]
    pub fn without_category_select(mut self) -> Self {
        self.select_category = false;
        self
    }

    /// Resolve the label into a record
    pub fn record(&self, labels: &CategoryLabels) -> HarnessResult<FoodRecord> {
        if self.name.trim().is_empty() {
            return Err(HarnessError::invalid_scenario("scenario name is empty"));
        }
        let category = labels.category_for(&self.category_label)?;
        Ok(FoodRecord::new(self.name.clone(), category, self.exotic))
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}, {}, {})",
            self.kind, self.name, self.category_label, self.exotic
        )
    }
}

/// The built-in suite, labelled with `labels`
#[must_use]
pub fn default_suite(labels: &CategoryLabels) -> Vec<Scenario> {
    let veg = labels.vegetable.as_str();
    let fruit = labels.fruit.as_str();
    vec![
        Scenario::add("Potato", veg, false),
        Scenario::add("Melotria", veg, true),
        Scenario::add("Strawberry", fruit, false),
        Scenario::add("Mangosteen", fruit, true),
        Scenario::duplicate("Grape", fruit, false),
    ]
}

/// Scenarios loaded from a YAML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSet {
    /// Scenarios in run order
    pub scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> HarnessResult<Self> {
        let set: Self = serde_yaml_ng::from_str(yaml)?;
        if set.scenarios.is_empty() {
            return Err(HarnessError::invalid_scenario("scenario file lists no scenarios"));
        }
        Ok(set)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loading scenarios");
        Self::from_yaml_str(&text)
    }

    /// Check every scenario resolves under `labels` and names are unique
    pub fn validate(&self, labels: &CategoryLabels) -> HarnessResult<()> {
        let mut seen = std::collections::HashSet::new();
        for scenario in &self.scenarios {
            scenario.record(labels)?;
            if !seen.insert(scenario.name.as_str()) {
                return Err(HarnessError::invalid_scenario(format!(
                    "scenario name {:?} appears twice",
                    scenario.name
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// STATE MACHINE
// =============================================================================

/// Lifecycle state of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioState {
    /// Nothing done yet
    Init,
    /// The record is absent from UI and storage
    PrecheckPassed,
    /// The form was saved
    Submitted,
    /// The table reflected the save
    EffectObserved,
    /// Storage and table agree with the record
    Verified,
    /// Cleanup finished without error
    CleanedUp,
    /// A step or the cleanup failed
    Failed,
}

impl ScenarioState {
    /// Whether no further transition is possible
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::CleanedUp | Self::Failed)
    }
}

impl std::fmt::Display for ScenarioState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::PrecheckPassed => "precheck_passed",
            Self::Submitted => "submitted",
            Self::EffectObserved => "effect_observed",
            Self::Verified => "verified",
            Self::CleanedUp => "cleaned_up",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Browser session and storage connection owned by one scenario.
///
/// Dropping a context that was never released closes the session.
pub struct ScenarioContext<D: PageDriver, S: FoodStore> {
    page: FoodPage<D>,
    store: S,
    released: bool,
}

impl<D: PageDriver, S: FoodStore> std::fmt::Debug for ScenarioContext<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl<D: PageDriver, S: FoodStore> ScenarioContext<D, S> {
    /// Take ownership of a page and a store
    #[must_use]
    pub fn new(page: FoodPage<D>, store: S) -> Self {
        Self {
            page,
            store,
            released: false,
        }
    }

    /// Page model
    #[must_use]
    pub const fn page(&self) -> &FoodPage<D> {
        &self.page
    }

    /// Page model, mutably
    pub fn page_mut(&mut self) -> &mut FoodPage<D> {
        &mut self.page
    }

    /// Storage gateway
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Whether the session was already closed
    #[must_use]
    pub const fn is_released(&self) -> bool {
        self.released
    }

    /// Close the session; later calls are no-ops
    pub fn release(&mut self) -> HarnessResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.page.close()
    }
}

impl<D: PageDriver, S: FoodStore> Drop for ScenarioContext<D, S> {
    fn drop(&mut self) {
        if !self.released {
            warn!("scenario context dropped without release, closing session");
            if let Err(e) = self.release() {
                warn!(error = %e, "closing session on drop failed");
            }
        }
    }
}

/// Runner settings
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Page URL opened at the start of every scenario
    pub base_url: String,
    /// Category labels the page renders
    pub labels: CategoryLabels,
    /// Reset the page data after each scenario
    pub reset_after: bool,
    /// Stop the suite after the first failing scenario
    pub fail_fast: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            base_url: crate::config::DEFAULT_BASE_URL.to_string(),
            labels: CategoryLabels::default(),
            reset_after: false,
            fail_fast: false,
        }
    }
}

/// Bookkeeping for one run
#[derive(Debug)]
struct Progress {
    state: ScenarioState,
    transitions: Vec<ScenarioState>,
    seeded: usize,
    submitted: usize,
    verdict: Option<ConsistencyVerdict>,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: ScenarioState::Init,
            transitions: vec![ScenarioState::Init],
            seeded: 0,
            submitted: 0,
            verdict: None,
        }
    }

    fn advance(&mut self, scenario: &Scenario, next: ScenarioState) {
        info!(scenario = %scenario.name, from = %self.state, to = %next, "transition");
        self.state = next;
        self.transitions.push(next);
    }

    const fn inserted(&self) -> usize {
        self.seeded + self.submitted
    }
}

/// Drives scenarios through their lifecycle
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    config: RunnerConfig,
}

impl ScenarioRunner {
    /// Create a runner
    #[must_use]
    pub const fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Runner settings
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run one scenario to a terminal state, consuming its context
    pub fn run<D: PageDriver, S: FoodStore>(
        &self,
        scenario: &Scenario,
        mut ctx: ScenarioContext<D, S>,
    ) -> ScenarioReport {
        let start = Instant::now();
        let mut progress = Progress::new();
        info!(scenario = %scenario, "scenario started");

        let primary = match scenario.record(&self.config.labels) {
            Ok(record) => self
                .execute(scenario, &record, &mut ctx, &mut progress)
                .err()
                .map(|e| FailureRecord::new(progress.state, &e)),
            Err(e) => Some(FailureRecord::new(progress.state, &e)),
        };
        if let Some(failure) = &primary {
            warn!(scenario = %scenario.name, state = %failure.state, error = %failure.message, "scenario failed");
        }

        let (deleted, cleanup_errors) = self.cleanup(scenario, &mut ctx, &progress);
        let mut cleanup_failures: Vec<FailureRecord> = cleanup_errors
            .iter()
            .map(|e| FailureRecord::new(progress.state, e))
            .collect();

        let failure = match primary {
            Some(failure) => Some(failure),
            None if !cleanup_failures.is_empty() => Some(cleanup_failures.remove(0)),
            None => None,
        };
        let final_state = if failure.is_some() {
            ScenarioState::Failed
        } else {
            ScenarioState::CleanedUp
        };
        progress.advance(scenario, final_state);

        ScenarioReport {
            scenario: scenario.clone(),
            final_state,
            transitions: progress.transitions,
            verdict: progress.verdict,
            inserted: progress.seeded + progress.submitted,
            deleted,
            failure,
            cleanup_failures,
            duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn execute<D: PageDriver, S: FoodStore>(
        &self,
        scenario: &Scenario,
        record: &FoodRecord,
        ctx: &mut ScenarioContext<D, S>,
        progress: &mut Progress,
    ) -> HarnessResult<()> {
        let labels = &self.config.labels;
        ctx.page.open(&self.config.base_url)?;

        // Precheck
        let count = ctx.store.count_matching(record)?;
        let stored = verify(record, count);
        let shown = verify_ui_contains_row(record, &ctx.page.rows()?, labels);
        match (stored.exists(), shown) {
            (false, false) => {}
            (true, true) => {
                return Err(HarnessError::FixturePollution {
                    name: record.name.clone(),
                    count,
                    in_ui: true,
                })
            }
            (_, shown) => reconcile(record, shown, stored)?,
        }
        if scenario.kind == ScenarioKind::DuplicateSeed {
            let id = ctx.store.insert(record)?;
            progress.seeded += 1;
            debug!(id, record = %record, "seeded storage");
        }
        progress.advance(scenario, ScenarioState::PrecheckPassed);

        // Submit
        let previous = ctx.page.row_count()?;
        ctx.page.fill_add_form(record, scenario.select_category)?;
        ctx.page.await_clickable(Element::SaveButton)?;
        // A save that errors after the click may still have persisted
        progress.submitted += 1;
        ctx.page.save()?;
        progress.advance(scenario, ScenarioState::Submitted);

        // Observe
        match scenario.kind {
            ScenarioKind::Add => ctx.page.await_row_count_equals(previous + 1)?,
            ScenarioKind::DuplicateSeed => ctx.page.await_row_count_exceeds(previous)?,
        };
        progress.advance(scenario, ScenarioState::EffectObserved);

        // Verify
        let verdict = verify(record, ctx.store.count_by_name(&record.name)?);
        progress.verdict = Some(verdict);
        expect_verdict(record, scenario.kind.expected_verdict(), verdict)?;
        check_stored_fields(record, &ctx.store.select_by_name(&record.name)?)?;
        let rows = ctx.page.rows()?;
        let new_row = match scenario.kind {
            ScenarioKind::Add => rows.get(previous),
            ScenarioKind::DuplicateSeed => rows.last(),
        }
        .ok_or_else(|| HarnessError::mismatch("new table row", format!("row {previous}"), "no row"))?;
        check_row_identity(record, new_row, labels)?;
        if scenario.kind == ScenarioKind::Add {
            reconcile(record, verify_ui_contains_row(record, &rows, labels), verdict)?;
        }
        progress.advance(scenario, ScenarioState::Verified);
        Ok(())
    }

    fn cleanup<D: PageDriver, S: FoodStore>(
        &self,
        scenario: &Scenario,
        ctx: &mut ScenarioContext<D, S>,
        progress: &Progress,
    ) -> (Option<usize>, Vec<HarnessError>) {
        let mut errors = Vec::new();
        let mut deleted = None;

        let expected = progress.inserted();
        if expected > 0 {
            match ctx.store.delete_by_name(&scenario.name) {
                Ok(actual) => {
                    deleted = Some(actual);
                    info!(name = %scenario.name, actual, expected, "cleanup delete");
                    if actual != expected {
                        errors.push(HarnessError::CleanupMismatch {
                            name: scenario.name.clone(),
                            expected,
                            actual,
                        });
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        if self.config.reset_after {
            if let Err(e) = ctx.page.reset_data() {
                errors.push(e);
            }
        }

        if let Err(e) = ctx.release() {
            errors.push(e);
        }

        for e in &errors {
            warn!(scenario = %scenario.name, error = %e, "cleanup failure");
        }
        (deleted, errors)
    }
}

/// Run `scenarios` in order, each with a fresh context from `factory`
pub fn run_suite<D, S, F>(runner: &ScenarioRunner, scenarios: &[Scenario], mut factory: F) -> SuiteReport
where
    D: PageDriver,
    S: FoodStore,
    F: FnMut(&Scenario) -> HarnessResult<ScenarioContext<D, S>>,
{
    let mut report = SuiteReport::new();
    for scenario in scenarios {
        let scenario_report = match factory(scenario) {
            Ok(ctx) => runner.run(scenario, ctx),
            Err(e) => ScenarioReport::not_started(scenario.clone(), &e),
        };
        let failed = !scenario_report.passed();
        report.push(scenario_report);
        if failed && runner.config().fail_fast {
            warn!(scenario = %scenario.name, "stopping suite after first failure");
            break;
        }
    }
    report.finish();
    info!(summary = %report.summary(), "suite finished");
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{SimulatedFaults, SimulatedPage};
    use crate::storage::SqliteFoodStore;
    use crate::wait::WaitOptions;

    fn context(
        faults: SimulatedFaults,
    ) -> (ScenarioContext<SimulatedPage, SqliteFoodStore>, SqliteFoodStore) {
        let store = SqliteFoodStore::open_in_memory().unwrap();
        store.seed_baseline().unwrap();
        let driver = SimulatedPage::new(store.clone()).with_faults(faults);
        let page = FoodPage::new(driver)
            .with_wait(WaitOptions::new().with_timeout(300).with_poll_interval(5));
        (ScenarioContext::new(page, store.clone()), store)
    }

    mod scenario_tests {
        use super::*;

        #[test]
        fn test_default_suite() {
            let suite = default_suite(&CategoryLabels::default());
            assert_eq!(suite.len(), 5);
            assert_eq!(suite[4].kind, ScenarioKind::DuplicateSeed);
            assert_eq!(suite[4].name, "Grape");
        }

        #[test]
        fn test_record_resolves_labels() {
            let labels = CategoryLabels::russian();
            let s = Scenario::add("Melotria", "Овощ", true);
            let r = s.record(&labels).unwrap();
            assert_eq!(r.category, crate::record::Category::Vegetable);
            assert!(Scenario::add("Melotria", "Meat", true).record(&labels).is_err());
            assert!(Scenario::add("  ", "Овощ", true).record(&labels).is_err());
        }

        #[test]
        fn test_yaml_defaults() {
            let yaml = "scenarios:\n  - name: Potato\n    category_label: Vegetable\n    exotic: false\n  - name: Grape\n    category_label: Fruit\n    exotic: false\n    kind: duplicate_seed\n    select_category: false\n";
            let set = ScenarioSet::from_yaml_str(yaml).unwrap();
            assert_eq!(set.scenarios[0].kind, ScenarioKind::Add);
            assert!(set.scenarios[0].select_category);
            assert_eq!(set.scenarios[1].kind, ScenarioKind::DuplicateSeed);
            assert!(!set.scenarios[1].select_category);
            set.validate(&CategoryLabels::default()).unwrap();
        }

        #[test]
        fn test_yaml_rejects_empty_and_duplicates() {
            assert!(ScenarioSet::from_yaml_str("scenarios: []").is_err());
            let set = ScenarioSet {
                scenarios: vec![
                    Scenario::add("Potato", "Vegetable", false),
                    Scenario::add("Potato", "Fruit", false),
                ],
            };
            assert!(set.validate(&CategoryLabels::default()).is_err());
        }
    }

    mod runner_tests {
        use super::*;
        use crate::storage::FoodStore;

        #[test]
        fn test_add_scenario_passes_and_cleans_up() {
            let (ctx, store) = context(SimulatedFaults::default());
            let report = ScenarioRunner::default().run(&Scenario::add("Melotria", "Vegetable", true), ctx);
            assert!(report.passed(), "{report:?}");
            assert_eq!(report.final_state, ScenarioState::CleanedUp);
            assert_eq!(
                report.transitions,
                vec![
                    ScenarioState::Init,
                    ScenarioState::PrecheckPassed,
                    ScenarioState::Submitted,
                    ScenarioState::EffectObserved,
                    ScenarioState::Verified,
                    ScenarioState::CleanedUp,
                ]
            );
            assert_eq!(report.verdict, Some(ConsistencyVerdict::Present));
            assert_eq!(report.deleted, Some(1));
            assert_eq!(store.count_by_name("Melotria").unwrap(), 0);
        }

        #[test]
        fn test_duplicate_scenario() {
            let (ctx, store) = context(SimulatedFaults::default());
            let report = ScenarioRunner::default().run(&Scenario::duplicate("Grape", "Fruit", false), ctx);
            assert!(report.passed(), "{report:?}");
            assert_eq!(report.verdict, Some(ConsistencyVerdict::Duplicated));
            assert_eq!(report.inserted, 2);
            assert_eq!(report.deleted, Some(2));
            assert_eq!(store.count_by_name("Grape").unwrap(), 0);
        }

        #[test]
        fn test_pollution_is_not_cleaned() {
            let (ctx, store) = context(SimulatedFaults::default());
            let report = ScenarioRunner::default().run(&Scenario::add("Apple", "Fruit", false), ctx);
            let failure = report.failure.as_ref().unwrap();
            assert_eq!(failure.kind, "fixture_pollution");
            assert_eq!(failure.state, ScenarioState::Init);
            assert_eq!(report.deleted, None);
            assert_eq!(store.count_by_name("Apple").unwrap(), 1);
        }

        #[test]
        fn test_storage_only_pollution_is_mismatch() {
            // The page renders other labels, so the stored row never shows as expected
            let store = SqliteFoodStore::open_in_memory().unwrap();
            store.seed_baseline().unwrap();
            store
                .insert(&FoodRecord::new("Potato", crate::record::Category::Vegetable, false))
                .unwrap();
            let driver = SimulatedPage::new(store.clone()).with_labels(CategoryLabels::russian());
            let ctx = ScenarioContext::new(FoodPage::new(driver), store.clone());
            let report = ScenarioRunner::default().run(&Scenario::add("Potato", "Vegetable", false), ctx);
            assert_eq!(report.failure.unwrap().kind, "consistency_mismatch");
            assert_eq!(store.count_by_name("Potato").unwrap(), 1);
        }

        #[test]
        fn test_dropped_save_times_out_and_reports_cleanup_mismatch() {
            let (ctx, _) = context(SimulatedFaults {
                drop_saves: true,
                ..SimulatedFaults::default()
            });
            let report = ScenarioRunner::default().run(&Scenario::add("Potato", "Vegetable", false), ctx);
            let failure = report.failure.as_ref().unwrap();
            assert_eq!(failure.kind, "timed_out");
            assert_eq!(failure.state, ScenarioState::Submitted);
            assert_eq!(report.cleanup_failures.len(), 1);
            assert_eq!(report.cleanup_failures[0].kind, "cleanup_mismatch");
            assert_eq!(report.final_state, ScenarioState::Failed);
        }

        #[test]
        fn test_reset_after() {
            let (ctx, store) = context(SimulatedFaults::default());
            let runner = ScenarioRunner::new(RunnerConfig {
                reset_after: true,
                ..RunnerConfig::default()
            });
            let report = runner.run(&Scenario::add("Potato", "Vegetable", false), ctx);
            assert!(report.passed(), "{report:?}");
            assert_eq!(store.select_all().unwrap().len(), 4);
        }

        #[test]
        fn test_fail_fast_stops_suite() {
            let runner = ScenarioRunner::new(RunnerConfig {
                fail_fast: true,
                ..RunnerConfig::default()
            });
            let suite = vec![
                Scenario::add("Apple", "Fruit", false),
                Scenario::add("Potato", "Vegetable", false),
            ];
            let report = run_suite(&runner, &suite, |_| Ok(context(SimulatedFaults::default()).0));
            assert_eq!(report.scenarios.len(), 1);
            assert!(!report.passed());
        }

        #[test]
        fn test_factory_failure_is_reported() {
            let suite = vec![Scenario::add("Potato", "Vegetable", false)];
            let report = run_suite::<SimulatedPage, SqliteFoodStore, _>(
                &ScenarioRunner::default(),
                &suite,
                |_| Err(HarnessError::driver("no browser")),
            );
            assert_eq!(report.failed_count(), 1);
            assert_eq!(report.scenarios[0].failure.as_ref().unwrap().kind, "driver");
        }
    }
}
