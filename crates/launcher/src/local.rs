// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `LocalProcessLauncher` (spec.md §4.1.1): spawns a child with captured
//! stdout/stderr, logs output lines, and reports exit through `on_stop`.
//!
//! The source polls process liveness on a 100 ms periodic callback. Since
//! `tokio::process::Child::wait()` is already a non-blocking, non-polling
//! future, this core awaits exit directly instead of spinning a timer;
//! [`pf_core::clock::LOCAL_POLL_FREQUENCY`] is kept only as a documented
//! constant for callers that want to emulate the original cadence.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use nix::sys::signal::Signal;
use pf_core::error::ProcessStateError;
use pf_core::{LauncherError, LauncherState};
use pf_proc::{EventLoop, LoopEvent, ProcessHandle};
use tokio::process::ChildStdin;
use tracing::{error, info};

use crate::launcher::Launcher;
use crate::lifecycle::{new_shared_core, SharedCore, StartData, StopCallback, StopData};

/// Default delay between interrupt and hard-kill for a single local
/// process (spec.md §9, §3 `interrupt_then_kill`).
pub const DEFAULT_INTERRUPT_THEN_KILL_DELAY: Duration = pf_core::clock::INTERRUPT_THEN_KILL_SINGLE;

pub struct LocalProcessLauncher {
    program: String,
    args: Vec<String>,
    work_dir: PathBuf,
    env: Vec<(String, String)>,
    interrupt_delay: Duration,
    core: SharedCore,
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
}

impl LocalProcessLauncher {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            work_dir: PathBuf::from("."),
            env: Vec::new(),
            interrupt_delay: DEFAULT_INTERRUPT_THEN_KILL_DELAY,
            core: new_shared_core(),
            pid: None,
            stdin: None,
        }
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }

    pub fn with_interrupt_delay(mut self, delay: Duration) -> Self {
        self.interrupt_delay = delay;
        self
    }

    /// Append `profile_dir=<path>` to the argument list exactly once per
    /// start (spec.md §6).
    pub fn with_profile_dir(mut self, profile_dir: impl AsRef<std::path::Path>) -> Self {
        self.args
            .push(format!("profile_dir={}", profile_dir.as_ref().display()));
        self
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// The resolved `(program, args)` command line, for inspection by
    /// variants built on top of this launcher (e.g. `SSHLauncher`) and by
    /// tests.
    pub fn command(&self) -> (&str, &[String]) {
        (&self.program, &self.args)
    }

    /// Take ownership of the captured stdin pipe (used by `SSHLauncher`).
    /// Returned at most once.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }
}

#[async_trait]
impl Launcher for LocalProcessLauncher {
    async fn start(&mut self) -> Result<(), LauncherError> {
        if !self.core.lock().state().can_start() {
            return Err(LauncherError::ProcessState(ProcessStateError {
                state: self.core.lock().state(),
                attempted: "start",
            }));
        }

        let mut handle =
            ProcessHandle::spawn(&self.program, &self.args, Some(&self.work_dir), &self.env)?;
        self.pid = handle.pid();
        self.stdin = handle.take_stdin();
        self.core
            .lock()
            .notify_start(StartData::Pid(self.pid.unwrap_or(0)));

        spawn_monitor(handle, self.core.clone());
        Ok(())
    }

    fn stop(&mut self) {
        if self.core.lock().state() != LauncherState::Running {
            return;
        }
        if let Some(pid) = self.pid {
            pf_proc::interrupt_then_kill_pid(pid, self.interrupt_delay);
        }
    }

    fn signal(&mut self, sig: Signal) {
        if self.core.lock().state() != LauncherState::Running {
            return;
        }
        if let Some(pid) = self.pid {
            let _ = pf_proc::signal_pid(pid, sig);
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

fn spawn_monitor(mut handle: ProcessHandle, core: SharedCore) {
    let pid = handle.pid();
    let (stdout, stderr) = handle.take_pipes();

    tokio::spawn(async move {
        let mut loop_ = EventLoop::new();
        if let Some(stdout) = stdout {
            loop_.watch_reader("stdout", stdout);
        }
        if let Some(stderr) = stderr {
            loop_.watch_reader("stderr", stderr);
        }

        let mut pipes_open = 2;
        let wait_fut = handle.wait();
        tokio::pin!(wait_fut);

        let exit = loop {
            tokio::select! {
                exit = &mut wait_fut => {
                    break exit;
                }
                event = loop_.next_event(), if pipes_open > 0 => {
                    match event {
                        Some(LoopEvent::Line { tag, line }) if tag == "stdout" => info!(pid, "{line}"),
                        Some(LoopEvent::Line { tag, line }) => {
                            debug_assert_eq!(tag, "stderr");
                            error!(pid, "{line}");
                        }
                        Some(LoopEvent::Eof { .. }) => pipes_open -= 1,
                        _ => {}
                    }
                }
            }
        };

        let exit = exit.unwrap_or(pf_proc::ExitRecord {
            exit_code: None,
            signal: None,
        });
        core.lock().notify_stop(StopData::Local {
            exit_code: exit.exit_code,
            pid,
        });
    });
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
