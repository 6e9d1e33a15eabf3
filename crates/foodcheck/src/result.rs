//! Result and error types for foodcheck.

use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while driving or checking a scenario
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A locator resolved to no element within the implicit find timeout
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator description
        locator: String,
    },

    /// An element was present but never became interactable
    #[error("Element not interactable: {locator} ({message})")]
    ElementNotInteractable {
        /// Locator description
        locator: String,
        /// Error message
        message: String,
    },

    /// A wait condition was never satisfied
    #[error("Timed out after {timeout_ms}ms waiting for {condition} (last observed: {last_observed})")]
    TimedOut {
        /// Condition description
        condition: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Last observed value, for diagnostics
        last_observed: String,
    },

    /// UI and storage disagree, or a field differs from the expected value
    #[error("Consistency mismatch on {subject}: expected {expected}, observed {observed}")]
    ConsistencyMismatch {
        /// What was compared
        subject: String,
        /// Expected value
        expected: String,
        /// Observed value
        observed: String,
    },

    /// The record under test already existed before the scenario started
    #[error("Record {name:?} already present before the scenario ({count} storage rows, shown in UI: {in_ui})")]
    FixturePollution {
        /// Record name
        name: String,
        /// Matching storage rows
        count: u64,
        /// Whether the table already showed the row
        in_ui: bool,
    },

    /// Cleanup deleted a different number of rows than the scenario inserted
    #[error("Cleanup of {name:?} deleted {actual} rows, expected {expected}")]
    CleanupMismatch {
        /// Record name
        name: String,
        /// Rows the scenario inserted
        expected: usize,
        /// Rows actually deleted
        actual: usize,
    },

    /// Storage connection or query error
    #[error("Storage operation failed: {0}")]
    StorageOperationFailed(#[from] rusqlite::Error),

    /// Browser driver error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Scenario input could not be interpreted
    #[error("Invalid scenario: {message}")]
    InvalidScenario {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an invalid scenario error
    #[must_use]
    pub fn invalid_scenario(message: impl Into<String>) -> Self {
        Self::InvalidScenario {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a consistency mismatch
    #[must_use]
    pub fn mismatch(
        subject: impl Into<String>,
        expected: impl std::fmt::Display,
        observed: impl std::fmt::Display,
    ) -> Self {
        Self::ConsistencyMismatch {
            subject: subject.into(),
            expected: expected.to_string(),
            observed: observed.to_string(),
        }
    }

    /// Stable snake_case label used in reports
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ElementNotFound { .. } => "element_not_found",
            Self::ElementNotInteractable { .. } => "element_not_interactable",
            Self::TimedOut { .. } => "timed_out",
            Self::ConsistencyMismatch { .. } => "consistency_mismatch",
            Self::FixturePollution { .. } => "fixture_pollution",
            Self::CleanupMismatch { .. } => "cleanup_mismatch",
            Self::StorageOperationFailed(_) => "storage_operation_failed",
            Self::Driver { .. } => "driver",
            Self::InvalidScenario { .. } => "invalid_scenario",
            Self::Config { .. } => "config",
            Self::Io(_) => "io",
            Self::Yaml(_) => "yaml",
            Self::Json(_) => "json",
        }
    }

    /// Whether this is a wait-engine timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}
