// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lifecycle states shared by every `Launcher` implementation
//! (spec.md §3, §4.3): `before -> running -> after`, forward-only.

use std::fmt;

/// A launcher's position in its forward-only lifecycle.
///
/// Transitions only ever move right: `Before -> Running -> After`. No
/// launcher variant is permitted to move backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LauncherState {
    /// Constructed, not yet started.
    Before,
    /// `start()` has returned successfully; the process is live.
    Running,
    /// The process has exited (cleanly, killed, or never started and
    /// abandoned) and `stop_data` is available.
    After,
}

impl LauncherState {
    /// Whether `start` is permitted from this state.
    pub fn can_start(self) -> bool {
        matches!(self, LauncherState::Before)
    }

    /// Whether `stop`/`signal` is permitted from this state.
    pub fn can_stop(self) -> bool {
        matches!(self, LauncherState::Running)
    }
}

impl fmt::Display for LauncherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LauncherState::Before => "before",
            LauncherState::Running => "running",
            LauncherState::After => "after",
        };
        f.write_str(s)
    }
}
