// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Usage:
//   smoky [OPTIONS] <HOSTNAME> <CONFIG>
//
// HOSTNAME is the server every request connects to. The targets in CONFIG
// are the virtual hosts we pretend to be (via the Host header), so you can
// smoke-test a new server before DNS points at it.
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

use crate::report::OutputMode;
use crate::runner::DEFAULT_CONCURRENCY;

// The whole CLI is one command with two positional arguments and some flags
#[derive(Parser, Debug)]
#[command(
    name = "smoky",
    version,
    about = "Smoke-test the virtual hosts on a web server",
    long_about = "smoky connects to one server and runs the HTTP checks from a YAML file \
                  against each virtual host listed in it, sending the target's name in \
                  the Host header. It exits non-zero if the config is broken (101) or if \
                  any check fails (102), which makes it handy after a deploy."
)]
pub struct Cli {
    /// Server to connect to (host or host:port)
    pub hostname: String,

    /// YAML file mapping targets -> checks -> arguments
    pub config: PathBuf,

    /// How many checks to run at once for each target
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Only run this target (may be given more than once)
    #[arg(short, long = "target", value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Per-request timeout in seconds (default: no timeout)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Which checks to list before the summary
    #[arg(short, long, value_enum, default_value_t = OutputMode::Failed)]
    pub output: OutputMode,

    /// Output results in JSON format instead of text
    #[arg(long)]
    pub json: bool,

    /// Log what the runner is doing to stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
