// src/report.rs
// =============================================================================
// Turns a RunReport into something a person (or a script) can read.
//
// Three text modes:
// - summary: just "N/M passed for <target>" lines
// - failed:  failed checks, then the summary (the default)
// - all:     every check, then the summary
//
// Or --json, which prints the whole RunReport as JSON.
//
// Everything here works on the report it is given. Rendering is separate
// from printing so tests can look at the text.
// =============================================================================

use std::fmt::Write as _;

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;

use crate::runner::{InvocationRecord, RunReport, TargetOutcome};

/// Which checks to list before the summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputMode {
    /// Only the per-target pass counts
    Summary,
    /// Failed checks and the pass counts
    #[default]
    Failed,
    /// Every check and the pass counts
    All,
}

impl OutputMode {
    fn shows(self, record: &InvocationRecord) -> bool {
        match self {
            OutputMode::Summary => false,
            OutputMode::Failed => !record.passed(),
            OutputMode::All => true,
        }
    }
}

// Prints the report to stdout
pub fn print_report(report: &RunReport, mode: OutputMode, json: bool, color: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print!("{}", render(report, mode, color));
    }
    Ok(())
}

// Renders the text form of the report
//
// Each shown check looks like:
//
//   www.example.com:    checkStatus:    [ FAIL ]
//       /missing
//   Got 404
pub fn render(report: &RunReport, mode: OutputMode, color: bool) -> String {
    let mut out = String::new();

    for outcome in &report.targets {
        for record in outcome.records.iter().filter(|r| mode.shows(r)) {
            let _ = writeln!(
                out,
                "{}:\t{}:\t{}",
                outcome.target,
                record.check,
                status_tag(record.passed(), color)
            );
            let _ = writeln!(out, "\t{}", record.args.join(", "));
            if !record.result.message.is_empty() {
                let _ = writeln!(out, "{}", record.result.message);
            }
            out.push('\n');
        }
    }

    for outcome in &report.targets {
        let _ = writeln!(out, "{}", summary_line(outcome));
    }

    out
}

fn summary_line(outcome: &TargetOutcome) -> String {
    format!("{}/{} passed for {}", outcome.passed, outcome.total, outcome.target)
}

fn status_tag(passed: bool, color: bool) -> String {
    match (passed, color) {
        (true, true) => "[ OK ]".green().bold().to_string(),
        (false, true) => "[ FAIL ]".red().bold().to_string(),
        (true, false) => "[ OK ]".to_string(),
        (false, false) => "[ FAIL ]".to_string(),
    }
}
