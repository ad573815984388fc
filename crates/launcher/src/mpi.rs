// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MPIExecLauncher` (spec.md §4.1.2): builds the `mpiexec`/`mpirun`
//! command line, then delegates to `LocalProcessLauncher` for the actual
//! spawn/monitor/signal machinery.

use async_trait::async_trait;
use nix::sys::signal::Signal;
use pf_core::{LauncherError, LauncherState};

use crate::launcher::Launcher;
use crate::lifecycle::{StopCallback, StopData};
use crate::local::LocalProcessLauncher;

/// Build the `mpi_cmd + ["-n", str(n)] + mpi_args + program + program_args`
/// argument list (spec.md §4.1.2 `find_args`).
pub fn mpi_args(
    mpi_cmd: &[String],
    n: u32,
    mpi_args: &[String],
    program: &str,
    program_args: &[String],
) -> (String, Vec<String>) {
    let mut args = Vec::new();
    args.extend(mpi_cmd[1..].iter().cloned());
    args.push("-n".to_string());
    args.push(n.to_string());
    args.extend(mpi_args.iter().cloned());
    args.push(program.to_string());
    args.extend(program_args.iter().cloned());
    (mpi_cmd[0].clone(), args)
}

pub struct MPIExecLauncher {
    inner: LocalProcessLauncher,
}

impl MPIExecLauncher {
    /// Build a controller variant: `n` is fixed at 1.
    pub fn controller(
        mpi_cmd: Vec<String>,
        mpi_args_: Vec<String>,
        program: String,
        program_args: Vec<String>,
    ) -> Self {
        Self::with_n(mpi_cmd, 1, mpi_args_, program, program_args)
    }

    /// Build an engine-set variant: the caller chooses `n`.
    pub fn with_n(
        mpi_cmd: Vec<String>,
        n: u32,
        mpi_args_: Vec<String>,
        program: String,
        program_args: Vec<String>,
    ) -> Self {
        let (exe, args) = mpi_args(&mpi_cmd, n, &mpi_args_, &program, &program_args);
        Self {
            inner: LocalProcessLauncher::new(exe, args),
        }
    }

    pub fn with_profile_dir(mut self, profile_dir: impl AsRef<std::path::Path>) -> Self {
        self.inner = self.inner.with_profile_dir(profile_dir);
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.inner = self.inner.with_work_dir(dir);
        self
    }
}

#[async_trait]
impl Launcher for MPIExecLauncher {
    async fn start(&mut self) -> Result<(), LauncherError> {
        self.inner.start().await
    }

    fn stop(&mut self) {
        self.inner.stop()
    }

    fn signal(&mut self, sig: Signal) {
        self.inner.signal(sig)
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
#[path = "mpi_tests.rs"]
mod tests;
