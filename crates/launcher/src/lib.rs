// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pf-launcher: the polymorphic process-lifecycle layer (spec.md §4.1) —
//! local, MPI, SSH, batch (PBS/SGE), Windows HPC, and fan-out launchers,
//! all built on the shared `{before,running,after}` lifecycle core.

pub mod batch;
pub mod launcher;
pub mod lifecycle;
pub mod local;
pub mod mpi;
pub mod set;
pub mod ssh;
pub mod winhpc;

pub use batch::{BatchContext, BatchFlavor, BatchSystemLauncher, TemplateSource};
pub use launcher::Launcher;
pub use lifecycle::{LauncherCore, SharedCore, StartData, StopCallback, StopData};
pub use local::LocalProcessLauncher;
pub use mpi::MPIExecLauncher;
pub use set::{split_user_host, ssh_engine_set, ssh_engine_set_indices, LauncherSet};
pub use ssh::SSHLauncher;
pub use winhpc::WindowsHPCLauncher;
