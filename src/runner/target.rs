// src/runner/target.rs
// =============================================================================
// Per-target bookkeeping: how many checks ran, how many passed, and what each
// one said.
//
// Checks finish in whatever order the network decides, but the report has to
// list them in the order they were written in the config file. So:
// 1. Before anything runs, every invocation reserves a slot (in file order)
// 2. When an invocation finishes, its result goes into its own slot
//
// All updates go through one Mutex. Each update is a couple of additions and
// a store, so there's nothing to gain from finer locking.
// =============================================================================

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::checker::CheckResult;

/// A reserved place in the result list
///
/// Not Clone/Copy: completing an invocation consumes its reservation, so a
/// slot can only be filled once.
#[derive(Debug)]
pub struct Reservation(usize);

/// One finished invocation as it appears in the report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationRecord {
    pub check: String,
    pub args: Vec<String>,
    pub result: CheckResult,
}

impl InvocationRecord {
    pub fn passed(&self) -> bool {
        self.result.passed
    }
}

/// Everything we know about one target once its checks have run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetOutcome {
    pub target: String,
    pub total: usize,
    pub passed: usize,
    pub records: Vec<InvocationRecord>,
}

impl TargetOutcome {
    pub fn failed(&self) -> usize {
        self.total - self.passed
    }

    pub fn all_passed(&self) -> bool {
        self.total == self.passed
    }
}

#[derive(Debug)]
struct Slot {
    check: String,
    args: Vec<String>,
    result: Option<CheckResult>,
}

#[derive(Debug, Default)]
struct RunnerState {
    total: usize,
    passed: usize,
    slots: Vec<Slot>,
}

/// Collects results for one target while its checks run concurrently
#[derive(Debug)]
pub struct TargetRunner {
    target: String,
    state: Mutex<RunnerState>,
}

impl TargetRunner {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            state: Mutex::new(RunnerState::default()),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    // Reserves the next slot in the result list
    //
    // Call these in declaration order; the report follows reservation order.
    pub fn record_invocation(&self, check: &str, args: &[String]) -> Reservation {
        let mut state = self.lock();
        state.slots.push(Slot {
            check: check.to_string(),
            args: args.to_vec(),
            result: None,
        });
        Reservation(state.slots.len() - 1)
    }

    // Stores a result and updates the counters, all under one lock
    pub fn complete_invocation(&self, reservation: Reservation, result: CheckResult) {
        let mut state = self.lock();
        state.total += 1;
        if result.passed {
            state.passed += 1;
        }
        state.slots[reservation.0].result = Some(result);
    }

    pub fn total(&self) -> usize {
        self.lock().total
    }

    pub fn passed(&self) -> usize {
        self.lock().passed
    }

    // Freezes the results into a TargetOutcome
    //
    // Every reservation should have been completed by now. If one wasn't, it
    // is reported (and counted) as a failure rather than silently dropped.
    pub fn finish(self) -> TargetOutcome {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut total = state.total;
        let records = state
            .slots
            .into_iter()
            .map(|slot| {
                let result = slot.result.unwrap_or_else(|| {
                    total += 1;
                    CheckResult::fail("invocation did not complete")
                });
                InvocationRecord {
                    check: slot.check,
                    args: slot.args,
                    result,
                }
            })
            .collect();

        TargetOutcome {
            target: self.target,
            total,
            passed: state.passed,
            records,
        }
    }

    // A panic while holding the lock can't leave the counters half-updated,
    // so a poisoned lock is still safe to use
    fn lock(&self) -> MutexGuard<'_, RunnerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
