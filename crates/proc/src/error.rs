// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcError {
    #[error("spawn failed: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("wait failed: {0}")]
    Wait(#[source] std::io::Error),

    #[error("signal delivery failed: {0}")]
    Signal(#[source] nix::Error),

    #[error("process has no pid (already reaped or never started)")]
    NoPid,
}
