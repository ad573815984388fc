// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors surfaced by the engine dispatch kernel (spec.md §7).
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("stream error: {0}")]
    Stream(#[from] pf_stream::StreamError),

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A user-code failure raised while executing `execute_request` or
/// `apply_request` (spec.md §7 "User-code exceptions").
///
/// `UnmetDependency` is a distinguished `ename`: when raised during
/// `apply_request` it sets the reply subheader's `dependencies_met` to
/// `false` instead of treating the call as a hard failure, so the
/// scheduler can reroute the task (spec.md §4.2.9, §7).
#[derive(Debug, Error, Clone)]
#[error("{evalue}")]
pub struct ExecError {
    pub ename: String,
    pub evalue: String,
}

impl ExecError {
    pub fn new(ename: impl Into<String>, evalue: impl Into<String>) -> Self {
        Self {
            ename: ename.into(),
            evalue: evalue.into(),
        }
    }

    pub fn is_unmet_dependency(&self) -> bool {
        self.ename == "UnmetDependency"
    }
}
