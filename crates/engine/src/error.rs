// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum EngineAppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("kernel error: {0}")]
    Kernel(#[from] pf_kernel::KernelError),
}
