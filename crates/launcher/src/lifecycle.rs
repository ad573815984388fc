// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared lifecycle bookkeeping every `Launcher` variant is built on
//! (spec.md §3 `Launcher`, §4.1 abstract contract, §4.3 state machine).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use pf_core::LauncherState;

/// What a launcher's `start()` produced (spec.md §3 `start_data`).
#[derive(Debug, Clone)]
pub enum StartData {
    /// A single local or SSH'd process pid.
    Pid(u32),
    /// A batch-system or WinHPC job id.
    JobId(String),
    /// One entry per child of a `LauncherSet`.
    Many(HashMap<String, StartData>),
}

/// What a launcher's `stop()` produced (spec.md §3 `stop_data`, §6 "Exit
/// signalling").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopData {
    /// Local/MPI/SSH launchers surface `{exit_code, pid}`.
    Local {
        exit_code: Option<i32>,
        pid: Option<u32>,
    },
    /// Batch and WinHPC launchers surface `{job_id, output}`.
    Batch { job_id: String, output: String },
    /// One entry per child of a `LauncherSet`, keyed by index.
    Many(Vec<(String, Box<StopData>)>),
}

pub type StopCallback = Box<dyn FnOnce(&StopData) + Send>;

/// The `{before, running, after}` state machine plus `stop_data`/
/// `stop_callbacks` bookkeeping shared by every concrete launcher.
///
/// Held behind an `Arc<Mutex<_>>` so a launcher's background monitor task
/// (which observes process exit) and its public handle can both drive
/// transitions.
pub struct LauncherCore {
    state: LauncherState,
    start_data: Option<StartData>,
    stop_data: Option<StopData>,
    stop_callbacks: Vec<StopCallback>,
}

impl Default for LauncherCore {
    fn default() -> Self {
        Self::new()
    }
}

impl LauncherCore {
    pub fn new() -> Self {
        Self {
            state: LauncherState::Before,
            start_data: None,
            stop_data: None,
            stop_callbacks: Vec::new(),
        }
    }

    pub fn state(&self) -> LauncherState {
        self.state
    }

    pub fn start_data(&self) -> Option<&StartData> {
        self.start_data.as_ref()
    }

    pub fn stop_data(&self) -> Option<&StopData> {
        self.stop_data.as_ref()
    }

    /// `before -> running`. Invalid outside `before` (spec.md §4.3).
    pub fn notify_start(&mut self, data: StartData) -> bool {
        if !self.state.can_start() {
            return false;
        }
        self.start_data = Some(data);
        self.state = LauncherState::Running;
        true
    }

    /// `running -> after`, draining `stop_callbacks` in registration order,
    /// each exactly once (spec.md §8 invariant 2). A no-op if already
    /// `after` — `notify_stop` must never fire callbacks a second time.
    pub fn notify_stop(&mut self, data: StopData) {
        if self.state == LauncherState::After {
            return;
        }
        self.state = LauncherState::After;
        self.stop_data = Some(data);
        let callbacks = std::mem::take(&mut self.stop_callbacks);
        let data_ref = self.stop_data.as_ref().expect("just set");
        for cb in callbacks {
            cb(data_ref);
        }
    }

    /// Register a stop callback. If already `after`, invoke it immediately
    /// and inline with `stop_data` (spec.md §4.1 `on_stop`).
    pub fn on_stop(&mut self, cb: StopCallback) {
        if self.state == LauncherState::After {
            if let Some(data) = &self.stop_data {
                cb(data);
            }
        } else {
            self.stop_callbacks.push(cb);
        }
    }
}

/// A shared handle to a `LauncherCore`, cloned between a launcher's public
/// struct and its background monitor task.
pub type SharedCore = Arc<Mutex<LauncherCore>>;

pub fn new_shared_core() -> SharedCore {
    Arc::new(Mutex::new(LauncherCore::new()))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
