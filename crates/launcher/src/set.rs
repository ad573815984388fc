// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `LauncherSet` (spec.md §4.1.6): fan-out aggregator composing N child
//! launchers into one lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use nix::sys::signal::Signal;
use parking_lot::Mutex;
use pf_core::{LauncherError, LauncherState};

use crate::launcher::Launcher;
use crate::lifecycle::{new_shared_core, SharedCore, StartData, StopCallback, StopData};
use crate::ssh::SSHLauncher;

/// Default delay between interrupt and hard-kill when broadcast through a
/// `LauncherSet` — shorter than a single launcher's default (spec.md §9).
pub const DEFAULT_SET_INTERRUPT_THEN_KILL_DELAY: std::time::Duration =
    pf_core::clock::INTERRUPT_THEN_KILL_SET;

pub struct LauncherSet {
    children: HashMap<String, Box<dyn Launcher>>,
    stop_data: Arc<Mutex<HashMap<String, StopData>>>,
    total: usize,
    core: SharedCore,
}

impl LauncherSet {
    /// Build a set from a mapping of `index -> Launcher`
    /// (spec.md §4.1.6, §8 invariant 9). Registers an `on_stop` callback on
    /// every child so the set transitions to `after` on its own, the moment
    /// the last child reports stopped — callers never have to drain child
    /// stops themselves.
    pub fn new(mut children: HashMap<String, Box<dyn Launcher>>) -> Self {
        let core = new_shared_core();
        let total = children.len();
        let stop_data: Arc<Mutex<HashMap<String, StopData>>> = Arc::new(Mutex::new(HashMap::new()));

        for (index, child) in children.iter_mut() {
            let index = index.clone();
            let stop_data = stop_data.clone();
            let core = core.clone();
            child.on_stop(Box::new(move |data: &StopData| {
                complete_child_stop(&stop_data, &core, total, index, data.clone());
            }));
        }

        Self {
            children,
            stop_data,
            total,
            core,
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Start every child. The set transitions `before -> running` once all
    /// children have started successfully.
    pub async fn start_all(&mut self) -> Result<(), LauncherError> {
        if !self.core.lock().state().can_start() {
            return Err(LauncherError::ProcessState(pf_core::error::ProcessStateError {
                state: self.core.lock().state(),
                attempted: "start",
            }));
        }
        for child in self.children.values_mut() {
            child.start().await?;
        }
        self.core
            .lock()
            .notify_start(StartData::Many(HashMap::new()));
        Ok(())
    }

    /// Record that child `index` stopped, as if its `on_stop` callback had
    /// fired. Exposed for callers that reconcile child exits out of band
    /// (e.g. a poll loop) rather than relying on the automatic wiring done
    /// in `new`. When every child has reported stopped, the set transitions
    /// to `after` with one `stop_data` entry per child (spec.md §8
    /// invariant 9).
    pub fn record_child_stop(&mut self, index: &str, data: StopData) {
        self.children.remove(index);
        complete_child_stop(&self.stop_data, &self.core, self.total, index.to_string(), data);
    }

    pub fn children(&self) -> impl Iterator<Item = (&String, &Box<dyn Launcher>)> {
        self.children.iter()
    }
}

/// Shared bookkeeping for both the automatic per-child `on_stop` callbacks
/// registered in `new` and the manual `record_child_stop` path: insert this
/// child's `stop_data`, and fire the set's own `notify_stop` once every
/// child has reported in.
fn complete_child_stop(
    stop_data: &Arc<Mutex<HashMap<String, StopData>>>,
    core: &SharedCore,
    total: usize,
    index: String,
    data: StopData,
) {
    let mut map = stop_data.lock();
    map.insert(index, data);
    if map.len() == total {
        let entries = map.iter().map(|(k, v)| (k.clone(), Box::new(v.clone()))).collect();
        core.lock().notify_stop(StopData::Many(entries));
    }
}

#[async_trait]
impl Launcher for LauncherSet {
    async fn start(&mut self) -> Result<(), LauncherError> {
        self.start_all().await
    }

    /// Broadcast `stop` to every current child (spec.md §4.1.6).
    fn stop(&mut self) {
        for child in self.children.values_mut() {
            child.stop();
        }
    }

    /// Broadcast `sig` to every current child.
    fn signal(&mut self, sig: Signal) {
        for child in self.children.values_mut() {
            child.signal(sig);
        }
    }

    fn on_stop(&mut self, cb: StopCallback) {
        self.core.lock().on_stop(cb);
    }

    fn state(&self) -> LauncherState {
        self.core.lock().state()
    }

    fn stop_data(&self) -> Option<StopData> {
        self.core.lock().stop_data().cloned()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Fan out an `SSHEngineSetLauncher` spec: `engines` maps `host -> n` or
/// `host -> (n, args_override)`; host strings may carry a `user@` prefix
/// which is split off. Total engines launched is `Σ n` over hosts; each
/// child index is `host+str(i)` (spec.md §4.1.6 special case, S6).
pub fn ssh_engine_set_indices(engines: &[(String, u32, Option<Vec<String>>)]) -> Vec<String> {
    let mut indices = Vec::new();
    for (host, n, _args) in engines {
        let bare_host = host.rsplit_once('@').map(|(_, h)| h).unwrap_or(host);
        for i in 0..*n {
            indices.push(format!("{bare_host}{i}"));
        }
    }
    indices
}

/// Build the `LauncherSet` the S6 scenario actually runs: one `SSHLauncher`
/// per entry of `ssh_engine_set_indices`, using `args_override` in place of
/// `program_args` when an entry carries one (spec.md §4.1.6 special case).
pub fn ssh_engine_set(
    engines: &[(String, u32, Option<Vec<String>>)],
    ssh_cmd: Vec<String>,
    ssh_args: Vec<String>,
    program: &str,
    program_args: &[String],
) -> LauncherSet {
    let mut children: HashMap<String, Box<dyn Launcher>> = HashMap::new();
    for (host, n, args_override) in engines {
        let (user, bare_host) = split_user_host(host);
        let args = args_override.clone().unwrap_or_else(|| program_args.to_vec());
        for i in 0..*n {
            let index = format!("{bare_host}{i}");
            let launcher = SSHLauncher::new(
                ssh_cmd.clone(),
                ssh_args.clone(),
                user.clone(),
                bare_host.clone(),
                program.to_string(),
                args.clone(),
            );
            children.insert(index, Box::new(launcher));
        }
    }
    LauncherSet::new(children)
}

/// Split a `user@host` (or bare `host`) string into `(user, host)`.
pub fn split_user_host(location: &str) -> (String, String) {
    match location.split_once('@') {
        Some((user, host)) => (user.to_string(), host.to_string()),
        None => (String::new(), location.to_string()),
    }
}

#[cfg(test)]
#[path = "set_tests.rs"]
mod tests;
