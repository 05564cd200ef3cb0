// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr, quiet unless -v or RUST_LOG)
// 3. Load the checks file and run every target
// 4. Print the results
// 5. Exit with a code scripts can rely on:
//      0   = every check passed
//      101 = the config file is unreadable or wrong
//      102 = at least one check failed
//      2   = something else went wrong
// =============================================================================

mod checker;  // src/checker/ - the checks and the name -> check registry
mod cli;      // src/cli.rs - command-line parsing
mod config;   // src/config/ - reading the YAML checks file
mod report;   // src/report.rs - printing results
mod runner;   // src/runner/ - concurrency and result bookkeeping

#[cfg(test)]
mod test_server;

use std::io::IsTerminal;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::ConfigError;
use runner::SuiteOptions;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INTERNAL_ERROR: i32 = 2;
const EXIT_CONFIG_ERROR: i32 = 101;
const EXIT_CHECKS_FAILED: i32 = 102;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            if e.downcast_ref::<ConfigError>().is_some() {
                eprintln!("Error reading config: {:#}", e);
                EXIT_CONFIG_ERROR
            } else {
                eprintln!("Error: {:#}", e);
                EXIT_INTERNAL_ERROR
            }
        }
    };

    std::process::exit(exit_code);
}

// Loads, runs and prints
// Returns:
//   Ok(0)   = all checks passed
//   Ok(102) = some check failed
//   Err     = config problem or unexpected error
async fn run(cli: Cli) -> Result<i32> {
    let mut options = SuiteOptions::new(cli.hostname);
    options.concurrency = cli.concurrency;
    options.timeout = cli.timeout.map(Duration::from_secs);
    options.only_targets = cli.targets;

    let report = runner::run_file(&cli.config, &options).await?;
    tracing::info!(
        passed = report.passed(),
        total = report.total(),
        targets = report.targets.len(),
        "run finished"
    );

    let color = std::io::stdout().is_terminal();
    report::print_report(&report, cli.output, cli.json, color)?;

    if report.all_passed() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_CHECKS_FAILED)
    }
}

// Logs go to stderr so stdout stays clean for the report (and --json)
//
// RUST_LOG wins if set, otherwise -v / -vv pick the level.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "smoky=warn",
        1 => "smoky=info",
        _ => "smoky=debug",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
