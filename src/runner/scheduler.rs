// src/runner/scheduler.rs
// =============================================================================
// Runs all invocations for one target with at most K of them in flight.
//
// How it works:
// 1. Reserve a result slot for every invocation, in declaration order
// 2. Turn each invocation into a future
// 3. Feed the futures through buffer_unordered(K): K run at once, and as soon
//    as one finishes the next one starts
// 4. Each future records its own result in the TargetRunner when done
// 5. Return only when every future has finished
//
// A failed check is just a result with passed = false, it never stops the
// other invocations.
// =============================================================================

use std::future::Future;

use futures::future;
use futures::stream::{self, StreamExt}; // StreamExt gives us .buffer_unordered()
use tracing::debug;

use super::target::TargetRunner;
use crate::checker::CheckResult;
use crate::config::Invocation;

/// Default number of invocations in flight per target
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Bounded fan-out of one target's invocations
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    concurrency: usize,
}

impl Scheduler {
    // A limit of 0 would never run anything, so it's treated as 1
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    // Runs every invocation through `execute` and records the results
    //
    // `execute` is usually a Checker call; tests pass in fakes to control
    // timing. When this returns, every invocation has completed.
    pub async fn run<F, Fut>(&self, runner: &TargetRunner, invocations: Vec<Invocation>, execute: F)
    where
        F: Fn(Invocation) -> Fut,
        Fut: Future<Output = CheckResult>,
    {
        let count = invocations.len();

        // Reserve up front so the report order is the config order
        let queued: Vec<_> = invocations
            .into_iter()
            .map(|invocation| {
                let reservation = runner.record_invocation(&invocation.check, &invocation.args);
                (reservation, invocation)
            })
            .collect();

        debug!(
            target_id = runner.target(),
            invocations = count,
            concurrency = self.concurrency(),
            "scheduling checks"
        );

        stream::iter(queued)
            .map(|(reservation, invocation)| {
                let check = execute(invocation);
                async move {
                    let result = check.await;
                    runner.complete_invocation(reservation, result);
                }
            })
            .buffer_unordered(self.concurrency)
            .for_each(|()| future::ready(()))
            .await;

        debug!(
            target_id = runner.target(),
            passed = runner.passed(),
            total = runner.total(),
            "all checks completed"
        );
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why buffer_unordered instead of spawning tasks?
//    - It polls at most K futures at a time, which is exactly the admission gate
//    - Network waits don't block the thread, so K slow requests still let the
//      rest of the program (and the next invocation) make progress
//    - The futures can borrow the runner, no Arc needed
//
// 2. Why is `execute` called inside .map()?
//    - The stream is lazy: .map() runs only when buffer_unordered pulls the
//      next item, i.e. when a slot frees up
//    - So no request is even built until it is allowed to run
//
// 3. What does for_each(|()| future::ready(())) do?
//    - Drives the stream to the end and throws the () outputs away
//    - It's the "wait for all of them" barrier
// -----------------------------------------------------------------------------
