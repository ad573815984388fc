// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SSHLauncher` (spec.md §4.1.3): runs the program over `ssh`, keeps
//! `location` in sync with `user`/`hostname`, and signals by writing the
//! escaped SSH connection-closer sequence to the child's stdin rather than
//! delivering an OS signal.

use async_trait::async_trait;
use nix::sys::signal::Signal;
use pf_core::{LauncherError, LauncherState};

use crate::launcher::Launcher;
use crate::lifecycle::{StopCallback, StopData};
use crate::local::LocalProcessLauncher;

/// The escape sequence an SSH client traps on its controlling stdin to
/// terminate the remote session: a newline, the escape character, and
/// `.`, followed by a newline.
const SSH_ESCAPE_TERMINATE: &[u8] = b"\n~.\n";

pub struct SSHLauncher {
    inner: LocalProcessLauncher,
    user: String,
    hostname: String,
    location: String,
    program_args: Vec<String>,
}

impl SSHLauncher {
    pub fn new(
        ssh_cmd: Vec<String>,
        ssh_args: Vec<String>,
        user: impl Into<String>,
        hostname: impl Into<String>,
        program: String,
        program_args: Vec<String>,
    ) -> Self {
        let user = user.into();
        let hostname = hostname.into();
        let location = Self::compute_location(&user, &hostname);

        let mut args = Vec::new();
        args.extend(ssh_cmd[1..].iter().cloned());
        args.extend(ssh_args);
        args.push(location.clone());
        args.push(program);
        args.extend(program_args.iter().cloned());

        Self {
            inner: LocalProcessLauncher::new(ssh_cmd[0].clone(), args),
            user,
            hostname,
            location,
            program_args,
        }
    }

    fn compute_location(user: &str, hostname: &str) -> String {
        if user.is_empty() {
            hostname.to_string()
        } else {
            format!("{user}@{hostname}")
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn program_args(&self) -> &[String] {
        &self.program_args
    }

    pub fn with_profile_dir(mut self, profile_dir: impl AsRef<std::path::Path>) -> Self {
        self.inner = self.inner.with_profile_dir(profile_dir);
        self
    }
}

#[async_trait]
impl Launcher for SSHLauncher {
    async fn start(&mut self) -> Result<(), LauncherError> {
        self.inner.start().await
    }

    fn stop(&mut self) {
        self.inner.stop()
    }

    /// Writes the SSH escape sequence to the child's stdin instead of
    /// delivering an OS signal; failures are swallowed (spec.md §7 "SSH
    /// signal failure — best-effort; no error is propagated").
    fn signal(&mut self, _sig: Signal) {
        if self.inner.state() != LauncherState::Running {
            return;
        }
        if let Some(mut stdin) = self.inner.take_stdin() {
            tokio::spawn(async move {
                use tokio::io::AsyncWriteExt;
                let _ = stdin.write_all(SSH_ESCAPE_TERMINATE).await;
            });
        }
    }

    fn on_stop(&mut self, cb: StopCallback) {
        self.inner.on_stop(cb)
    }

    fn state(&self) -> LauncherState {
        self.inner.state()
    }

    fn stop_data(&self) -> Option<StopData> {
        self.inner.stop_data()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
