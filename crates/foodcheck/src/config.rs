//! Harness configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration.

use crate::page::DEFAULT_BASELINE_ROWS;
use crate::record::CategoryLabels;
use crate::result::{HarnessError, HarnessResult};
use crate::scenario::RunnerConfig;
use crate::wait::{WaitOptions, DEFAULT_WAIT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Page URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/food";

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a window
    pub headless: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<PathBuf>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            sandbox: true,
            viewport_width: 1280,
            viewport_height: 800,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// URL of the food list page
    pub base_url: String,
    /// Storage file the application writes to
    pub database: Option<PathBuf>,
    /// Options for row-count waits
    pub wait: WaitOptions,
    /// Timeout for resolving an element before acting on it
    pub implicit_timeout_ms: u64,
    /// Rows the table holds after a reset
    pub baseline_rows: usize,
    /// Reset the page data after each scenario
    pub reset_after: bool,
    /// Stop after the first failing scenario
    pub fail_fast: bool,
    /// Category labels the page renders
    pub labels: CategoryLabels,
    /// Browser launch settings
    pub browser: BrowserSettings,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            database: None,
            wait: WaitOptions::default(),
            implicit_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            baseline_rows: DEFAULT_BASELINE_ROWS,
            reset_after: false,
            fail_fast: false,
            labels: CategoryLabels::default(),
            browser: BrowserSettings::default(),
        }
    }
}

impl HarnessConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> HarnessResult<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> HarnessResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject values the harness cannot run with
    pub fn validate(&self) -> HarnessResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(HarnessError::config("base_url is empty"));
        }
        if self.wait.timeout_ms == 0 || self.implicit_timeout_ms == 0 {
            return Err(HarnessError::config("timeouts must be positive"));
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(HarnessError::config("wait.poll_interval_ms must be positive"));
        }
        if self.labels.vegetable == self.labels.fruit {
            return Err(HarnessError::config(format!(
                "category labels must differ, both are {:?}",
                self.labels.fruit
            )));
        }
        Ok(())
    }

    /// Options for element resolution
    #[must_use]
    pub const fn implicit_wait(&self) -> WaitOptions {
        self.wait.with_timeout(self.implicit_timeout_ms)
    }

    /// Settings for the scenario runner
    #[must_use]
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            base_url: self.base_url.clone(),
            labels: self.labels.clone(),
            reset_after: self.reset_after,
            fail_fast: self.fail_fast,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(HarnessConfig::from_yaml_str("").unwrap(), HarnessConfig::default());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = HarnessConfig::from_yaml_str(
            "base_url: http://app:9000/food\nwait:\n  timeout_ms: 2000\nlabels:\n  vegetable: Овощ\n  fruit: Фрукт\n",
        )
        .unwrap();
        assert_eq!(config.base_url, "http://app:9000/food");
        assert_eq!(config.wait.timeout_ms, 2000);
        assert_eq!(config.wait.poll_interval_ms, 50);
        assert_eq!(config.labels, CategoryLabels::russian());
        assert_eq!(config.baseline_rows, 4);
        assert!(config.browser.headless);
    }

    #[test]
    fn test_validation() {
        assert!(HarnessConfig::from_yaml_str("wait:\n  timeout_ms: 0\n").is_err());
        assert!(HarnessConfig::from_yaml_str("wait:\n  poll_interval_ms: 0\n").is_err());
        assert!(HarnessConfig::from_yaml_str("implicit_timeout_ms: 0\n").is_err());
        let err = HarnessConfig::from_yaml_str("labels:\n  vegetable: X\n  fruit: X\n").unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "reset_after: true\nimplicit_timeout_ms: 1500").unwrap();
        let config = HarnessConfig::load(file.path()).unwrap();
        assert!(config.reset_after);
        assert_eq!(config.implicit_wait().timeout_ms, 1500);
        assert!(config.runner_config().reset_after);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = HarnessConfig {
            database: Some(PathBuf::from("/tmp/food.db")),
            ..HarnessConfig::default()
        };
        let back = HarnessConfig::from_yaml_str(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
