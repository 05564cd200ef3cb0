// src/runner/mod.rs
// =============================================================================
// This module runs checks and collects their results.
//
// Submodules:
// - target: TargetRunner, the per-target counters and ordered results
// - scheduler: Runs one target's invocations with bounded concurrency
// - suite: Drives every target in the config and builds the RunReport
//
// Rust concepts:
// - Mutex: The one piece of shared state (a target's results)
// - Streams: buffer_unordered as the concurrency limit
// =============================================================================

mod scheduler;
mod suite;
mod target;

pub use scheduler::DEFAULT_CONCURRENCY;
pub use suite::{run_file, RunReport, SuiteOptions};
pub use target::{InvocationRecord, TargetOutcome};
