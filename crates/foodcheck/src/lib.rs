//! Foodcheck: add-item reconciliation harness for the food list page
//!
//! Drives the page's add form through a [`PageDriver`], waits for the table
//! to reflect the save, then compares the rendered table against the `FOOD`
//! relation read independently through a [`FoodStore`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      FOODCHECK Architecture                     │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │───►│ FoodPage   │───►│ PageDriver │            │
//! │   │ Runner     │    │ + Waiter   │    │ (sim/CDP)  │            │
//! │   └─────┬──────┘    └────────────┘    └────────────┘            │
//! │         │           ┌────────────┐    ┌────────────┐            │
//! │         └──────────►│Consistency │◄───│ FoodStore  │            │
//! │                     │ Checker    │    │ (rusqlite) │            │
//! │                     └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Harness configuration
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod config;

/// UI/storage verdicts and row checks
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod consistency;

/// Page driver seam and implementations
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
pub mod driver;

/// Element registry
pub mod locators;

/// Food list page model
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod page;

/// Records, categories and table rows
#[allow(clippy::missing_errors_doc)]
pub mod record;

/// Scenario and suite reports
#[allow(clippy::missing_errors_doc)]
pub mod report;

mod result;

/// Scenario lifecycle
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
pub mod scenario;

/// `FOOD` relation gateway
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod storage;

/// Wait Mechanisms
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
pub mod wait;

/// Widget capability traits
#[allow(clippy::missing_errors_doc)]
pub mod widgets;

pub use config::{BrowserSettings, HarnessConfig, DEFAULT_BASE_URL};
pub use consistency::{
    check_row_identity, check_stored_fields, expect_verdict, expected_row, reconcile, verify,
    verify_ui_contains_row, ConsistencyVerdict,
};
#[cfg(feature = "browser")]
pub use driver::CdpDriver;
pub use driver::{PageDriver, SimulatedFaults, SimulatedPage};
pub use locators::{Element, Selector};
pub use page::{CountPredicate, ElementClickable, FoodPage, RowCount, DEFAULT_BASELINE_ROWS};
pub use record::{exotic_code, exotic_label, Category, CategoryLabels, FoodRecord, TableRow};
pub use report::{FailureRecord, ScenarioReport, SuiteReport, SuiteSummary};
pub use result::{HarnessError, HarnessResult};
pub use scenario::{
    default_suite, run_suite, RunnerConfig, Scenario, ScenarioContext, ScenarioKind,
    ScenarioRunner, ScenarioSet, ScenarioState,
};
pub use storage::{FoodStore, SqliteFoodStore, StoredFood, BASELINE_FOODS};
pub use wait::{
    Evaluation, FnCondition, WaitCondition, WaitOptions, WaitResult, Waiter,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
pub use widgets::{Button, Checkbox, Clickable, Fillable, SelectField, Selectable, TextField, Toggleable, Widget};

/// Common imports for writing scenarios
pub mod prelude {
    pub use super::driver::*;
    pub use super::page::*;
    pub use super::record::*;
    pub use super::scenario::*;
    pub use super::storage::*;
    pub use super::wait::*;
    pub use super::{ConsistencyVerdict, HarnessConfig, HarnessError, HarnessResult};
}
