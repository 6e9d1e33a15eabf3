//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// foodcheck: add-item reconciliation suite for the food list page
#[derive(Parser, Debug)]
#[command(name = "foodcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the suite against the live page in chromium
    Run(RunArgs),

    /// Run the suite against the in-process simulated page
    Simulate(SimulateArgs),

    /// List the scenarios that would run
    Scenarios(SuiteArgs),

    /// Create a food database with the baseline rows
    InitDb(InitDbArgs),

    /// Print the effective configuration as YAML
    Config(SuiteArgs),
}

/// Options shared by every command that builds a suite
#[derive(Args, Debug, Clone, Default)]
pub struct SuiteArgs {
    /// Configuration file (YAML)
    #[arg(short, long, env = "FOODCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Scenario file (YAML); the built-in suite is used otherwise
    #[arg(short, long)]
    pub scenarios: Option<PathBuf>,

    /// Override the page URL
    #[arg(long, env = "FOODCHECK_BASE_URL")]
    pub base_url: Option<String>,

    /// Override the database path
    #[arg(long, env = "FOODCHECK_DATABASE")]
    pub database: Option<PathBuf>,

    /// Override the wait timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Use the Russian category labels
    #[arg(long)]
    pub russian: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Suite options
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Stop after the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Reset the page data after each scenario
    #[arg(long)]
    pub reset_after: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Launch chromium without its sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,
}

/// Arguments for the simulate command
#[derive(Args, Debug, Clone, Default)]
pub struct SimulateArgs {
    /// Suite options
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Stop after the first failing scenario
    #[arg(long)]
    pub fail_fast: bool,

    /// Reset the page data after each scenario
    #[arg(long)]
    pub reset_after: bool,

    /// Delay between a save and the table showing it
    #[arg(long, default_value = "0")]
    pub render_delay_ms: u64,
}

/// Arguments for the init-db command
#[derive(Args, Debug, Clone)]
pub struct InitDbArgs {
    /// Database file to create
    pub path: PathBuf,

    /// Reset an existing database to the baseline rows
    #[arg(long)]
    pub force: bool,
}
