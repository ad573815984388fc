// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ProcessHandle`: spawns and signals a single OS process. Every
//! `Launcher` variant that manages a real subprocess (Local, MPIExec, SSH)
//! is built on top of this (spec.md §4.1).

use std::path::Path;
use std::time::Duration;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::error::ProcError;

/// What became of a process once it stopped running
/// (spec.md §3 `stop_data`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitRecord {
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitRecord {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

pub struct ProcessHandle {
    child: Child,
    pid: Option<u32>,
}

impl ProcessHandle {
    /// Spawn `program` with `args` in `cwd` (defaulting to the current
    /// directory, per `Launcher::work_dir` defaulting to `"."`), with the
    /// given environment variables layered on top of the inherited
    /// environment.
    pub fn spawn(
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
        env: &[(String, String)],
    ) -> Result<Self, ProcError> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in env {
            cmd.env(k, v);
        }
        cmd.kill_on_drop(true);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd.spawn().map_err(ProcError::Spawn)?;
        let pid = child.id();
        Ok(Self { child, pid })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Take ownership of the child's captured stdout/stderr pipes, for a
    /// caller to forward to the log (spec.md §4.1.1). Each pipe is
    /// returned at most once.
    pub fn take_pipes(&mut self) -> (Option<ChildStdout>, Option<ChildStderr>) {
        (self.child.stdout.take(), self.child.stderr.take())
    }

    /// Take ownership of the child's stdin pipe (used by `SSHLauncher` to
    /// write the connection-closer escape sequence). Returned at most once.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.child.stdin.take()
    }

    /// Deliver a POSIX signal to the process (spec.md §6 "exit
    /// signalling"). Best-effort: a process that has already exited yields
    /// `Err(ProcError::Signal)`, which callers are expected to swallow
    /// (spec.md §7).
    pub fn signal(&self, sig: Signal) -> Result<(), ProcError> {
        let pid = self.pid.ok_or(ProcError::NoPid)?;
        signal_pid(pid, sig)
    }

    /// Block until the process exits, producing its `ExitRecord`.
    pub async fn wait(&mut self) -> Result<ExitRecord, ProcError> {
        let status = self.child.wait().await.map_err(ProcError::Wait)?;
        Ok(ExitRecord {
            exit_code: status.code(),
            signal: unix_signal(&status),
        })
    }

    /// Send `SIGINT`, then unconditionally schedule a `SIGKILL` after
    /// `delay`. The scheduled kill is never cancelled even if the process
    /// exits cleanly before `delay` elapses (spec.md §9 design note); it
    /// simply becomes a no-op signal-to-a-dead-pid at that point.
    pub fn interrupt_then_kill(&self, delay: Duration) {
        if let Some(pid) = self.pid {
            interrupt_then_kill_pid(pid, delay);
        }
    }
}

/// Deliver `sig` to a raw pid. Used by launchers that keep only the pid
/// (not the owning `ProcessHandle`, which may have moved into a monitor
/// task) around for signalling.
pub fn signal_pid(pid: u32, sig: Signal) -> Result<(), ProcError> {
    signal::kill(Pid::from_raw(pid as i32), sig).map_err(ProcError::Signal)
}

/// Send `SIGINT` to `pid`, then unconditionally schedule a `SIGKILL` after
/// `delay` (spec.md §9 design note: the scheduled kill is never cancelled).
pub fn interrupt_then_kill_pid(pid: u32, delay: Duration) {
    let _ = signal_pid(pid, Signal::SIGINT);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = signal_pid(pid, Signal::SIGKILL);
    });
}

#[cfg(unix)]
fn unix_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn unix_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
