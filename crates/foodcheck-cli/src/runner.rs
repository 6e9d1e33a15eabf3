//! Command execution

use crate::commands::{InitDbArgs, RunArgs, SimulateArgs, SuiteArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::Printer;
use foodcheck::{
    default_suite, run_suite, CategoryLabels, FoodPage, FoodStore, HarnessConfig, PageDriver, Scenario,
    ScenarioContext, ScenarioRunner, ScenarioSet, SimulatedPage, SqliteFoodStore, SuiteReport,
};
use std::time::Duration;
use tracing::info;

/// Effective harness configuration: file values, then flag overrides
pub fn load_config(args: &SuiteArgs) -> CliResult<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(url) = &args.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(path) = &args.database {
        config.database = Some(path.clone());
    }
    if let Some(timeout) = args.timeout_ms {
        config.wait.timeout_ms = timeout;
    }
    if args.russian {
        config.labels = CategoryLabels::russian();
    }
    config.validate()?;
    Ok(config)
}

/// Scenarios from `--scenarios`, or the built-in suite
pub fn load_scenarios(args: &SuiteArgs, config: &HarnessConfig) -> CliResult<Vec<Scenario>> {
    match &args.scenarios {
        Some(path) => {
            let set = ScenarioSet::load(path)?;
            set.validate(&config.labels)?;
            Ok(set.scenarios)
        }
        None => Ok(default_suite(&config.labels)),
    }
}

/// Wrap a driver in a page model configured from `config`
pub fn build_page<D: PageDriver>(driver: D, config: &HarnessConfig) -> FoodPage<D> {
    FoodPage::new(driver)
        .with_labels(config.labels.clone())
        .with_wait(config.wait)
        .with_implicit_timeout(config.implicit_timeout_ms)
        .with_baseline_rows(config.baseline_rows)
}

fn finish(cli: &CliConfig, json: bool, report: &SuiteReport) -> CliResult<()> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        let printer = Printer::new(cli.color.should_color(), cli.verbosity.is_quiet());
        println!("{}", printer.suite(report));
    }
    let summary = report.summary();
    if summary.failed > 0 {
        return Err(CliError::ScenariosFailed {
            failed: summary.failed,
            total: summary.total,
        });
    }
    Ok(())
}

/// `foodcheck simulate`
pub fn run_simulate(cli: &CliConfig, args: &SimulateArgs) -> CliResult<()> {
    let mut config = load_config(&args.suite)?;
    config.fail_fast |= args.fail_fast;
    config.reset_after |= args.reset_after;
    let scenarios = load_scenarios(&args.suite, &config)?;

    let store = SqliteFoodStore::open_in_memory()?;
    store.seed_baseline()?;
    let delay = Duration::from_millis(args.render_delay_ms);
    info!(scenarios = scenarios.len(), render_delay_ms = args.render_delay_ms, "simulating");

    let runner = ScenarioRunner::new(config.runner_config());
    let report = run_suite(&runner, &scenarios, |_| {
        let driver = SimulatedPage::new(store.clone())
            .with_labels(config.labels.clone())
            .with_render_delay(delay);
        Ok(ScenarioContext::new(build_page(driver, &config), store.clone()))
    });
    finish(cli, args.suite.json, &report)
}

/// `foodcheck run`
#[cfg(feature = "browser")]
pub fn run_live(cli: &CliConfig, args: &RunArgs) -> CliResult<()> {
    use foodcheck::CdpDriver;

    let mut config = load_config(&args.suite)?;
    config.fail_fast |= args.fail_fast;
    config.reset_after |= args.reset_after;
    if args.headed {
        config.browser.headless = false;
    }
    if args.no_sandbox {
        config.browser.sandbox = false;
    }
    let database = config
        .database
        .clone()
        .ok_or_else(|| CliError::config("live runs need a database path (--database or config)"))?;
    let scenarios = load_scenarios(&args.suite, &config)?;
    info!(url = %config.base_url, database = %database.display(), "running against live page");

    let runner = ScenarioRunner::new(config.runner_config());
    let report = run_suite(&runner, &scenarios, |_| {
        let store = SqliteFoodStore::open(&database)?;
        let driver = CdpDriver::launch(&config.browser)?;
        Ok(ScenarioContext::new(build_page(driver, &config), store))
    });
    finish(cli, args.suite.json, &report)
}

/// `foodcheck run` without the `browser` feature
#[cfg(not(feature = "browser"))]
pub fn run_live(_cli: &CliConfig, _args: &RunArgs) -> CliResult<()> {
    Err(CliError::config(
        "live runs need the browser feature; rebuild with --features browser or use `foodcheck simulate`",
    ))
}

/// `foodcheck scenarios`
pub fn run_list(cli: &CliConfig, args: &SuiteArgs) -> CliResult<()> {
    let config = load_config(args)?;
    let scenarios = load_scenarios(args, &config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&scenarios)?);
    } else {
        let printer = Printer::new(cli.color.should_color(), cli.verbosity.is_quiet());
        println!("{}", printer.scenarios(&scenarios));
    }
    Ok(())
}

/// `foodcheck config`
pub fn run_show_config(args: &SuiteArgs) -> CliResult<()> {
    let config = load_config(args)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", serde_yaml_ng::to_string(&config)?);
    }
    Ok(())
}

/// `foodcheck init-db`
pub fn run_init_db(args: &InitDbArgs) -> CliResult<()> {
    let existed = args.path.exists();
    let store = SqliteFoodStore::open(&args.path)?;
    if existed && !args.force {
        if !store.select_all()?.is_empty() {
            return Err(CliError::invalid_argument(format!(
                "{} already holds data; pass --force to reset it",
                args.path.display()
            )));
        }
        store.seed_baseline()?;
    } else {
        store.reset_to_baseline()?;
    }
    println!("Initialized {} with {} rows", args.path.display(), store.select_all()?.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flag_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: http://file/food\nwait:\n  timeout_ms: 900").unwrap();
        let args = SuiteArgs {
            config: Some(file.path().to_path_buf()),
            base_url: Some("http://flag/food".into()),
            russian: true,
            ..SuiteArgs::default()
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.base_url, "http://flag/food");
        assert_eq!(config.wait.timeout_ms, 900);
        assert_eq!(config.labels, CategoryLabels::russian());
    }

    #[test]
    fn test_zero_timeout_flag_is_rejected() {
        let args = SuiteArgs {
            timeout_ms: Some(0),
            ..SuiteArgs::default()
        };
        assert!(matches!(load_config(&args), Err(CliError::Harness(_))));
    }

    #[test]
    fn test_default_scenarios_follow_labels() {
        let args = SuiteArgs {
            russian: true,
            ..SuiteArgs::default()
        };
        let config = load_config(&args).unwrap();
        let scenarios = load_scenarios(&args, &config).unwrap();
        assert_eq!(scenarios.len(), 5);
        assert_eq!(scenarios[2].category_label, "Фрукт");
    }

    #[test]
    fn test_init_db_refuses_populated_file_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("food.db");
        run_init_db(&InitDbArgs {
            path: path.clone(),
            force: false,
        })
        .unwrap();
        assert!(run_init_db(&InitDbArgs {
            path: path.clone(),
            force: false,
        })
        .is_err());
        run_init_db(&InitDbArgs {
            path: path.clone(),
            force: true,
        })
        .unwrap();
        assert_eq!(SqliteFoodStore::open(&path).unwrap().count_by_name("Apple").unwrap(), 1);
    }
}
