// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed delay constants for the launcher framework and engine dispatch
//! kernel.

use std::time::Duration;

/// Default delay before a hard kill follows an interrupt for a single
/// locally-launched process (spec.md §3 `interrupt_then_kill`).
pub const INTERRUPT_THEN_KILL_SINGLE: Duration = Duration::from_millis(2000);

/// Default delay before a hard kill follows an interrupt when broadcast
/// through a `LauncherSet` — shorter than the single-process default in the
/// source this spec was distilled from.
pub const INTERRUPT_THEN_KILL_SET: Duration = Duration::from_millis(1000);

/// Default poll interval for `LocalProcessLauncher` liveness checks
/// (spec.md §4.1.1).
pub const LOCAL_POLL_FREQUENCY: Duration = Duration::from_millis(100);

/// Grace period between sending `shutdown_reply` and exiting the engine
/// process, so the reply has time to flush (spec.md §4.2.6).
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(1000);

/// Pause between drain batches in `abort_queues`, giving in-flight messages
/// time to arrive on the socket before the next non-blocking pull
/// (spec.md §4.2.8).
pub const ABORT_DRAIN_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
