//! foodcheck CLI: run the food form reconciliation suite
//!
//! ## Usage
//!
//! ```bash
//! foodcheck simulate                       # Built-in suite, simulated page
//! foodcheck run --database food.db         # Live page in chromium
//! foodcheck scenarios --scenarios s.yaml   # List a scenario file
//! foodcheck init-db food.db                # Create the baseline database
//! ```

use clap::Parser;
use foodcheck_cli::{logging, runner, Cli, CliConfig, CliError, CliResult, Commands};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::ScenariosFailed { failed, total }) => {
            eprintln!("{failed} of {total} scenarios failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_cli(&cli);
    logging::init(&config);

    match &cli.command {
        Commands::Run(args) => runner::run_live(&config, args),
        Commands::Simulate(args) => runner::run_simulate(&config, args),
        Commands::Scenarios(args) => runner::run_list(&config, args),
        Commands::InitDb(args) => runner::run_init_db(args),
        Commands::Config(args) => runner::run_show_config(args),
    }
}
