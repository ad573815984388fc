// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared across the launcher and kernel crates.

use thiserror::Error;

/// Errors surfaced by the launcher framework (spec.md §7).
#[derive(Debug, Error)]
pub enum LauncherError {
    /// Batch submission, job-id parsing, or job-file writing failed.
    #[error("{0}")]
    Batch(String),

    /// `start`/`stop` invoked in a lifecycle state that does not permit it.
    #[error(transparent)]
    ProcessState(#[from] ProcessStateError),

    /// A batch-status query returned a status this core does not model.
    #[error("unknown status: {0}")]
    UnknownStatus(String),

    /// Spawning or signalling the underlying OS process failed.
    #[error("process io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A `start`/`stop` operation was attempted outside the lifecycle state that
/// permits it (spec.md §4.3: `before -> running -> after`, forward-only).
#[derive(Debug, Error)]
#[error("process in state {state:?} cannot {attempted}")]
pub struct ProcessStateError {
    pub state: crate::launcher_state::LauncherState,
    pub attempted: &'static str,
}
