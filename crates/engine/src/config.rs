// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine process configuration: paths and connection addresses resolved
//! from environment variables and the `profile_dir=<path>` argument every
//! Launcher variant appends to its child's command line (spec.md §6).

use std::path::PathBuf;

use thiserror::Error;

use crate::env;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a state directory: set PF_STATE_DIR or HOME")]
    NoStateDir,
}

/// Resolved engine configuration for one process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory shared with the launcher and controller, passed on the
    /// command line as `profile_dir=<path>`.
    pub profile_dir: PathBuf,
    /// This engine process's own log file.
    pub log_path: PathBuf,
    /// Opaque engine identity (spec.md §3 `EngineKernel::ident`).
    pub ident: String,
    pub shell_addr: String,
    pub control_addr: String,
    pub iopub_addr: String,
}

impl Config {
    /// Load configuration: `profile_dir` from the command line,
    /// connection addresses and identity from the environment, with
    /// `localhost` defaults so a lone engine can be started for
    /// inspection without a controller.
    pub fn load(profile_dir: PathBuf) -> Result<Self, ConfigError> {
        let state_dir = env::state_dir()?;
        let ident = env::ident().unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        Ok(Self {
            log_path: state_dir.join(format!("engine-{ident}.log")),
            shell_addr: env::shell_addr().unwrap_or_else(|| "127.0.0.1:8090".to_string()),
            control_addr: env::control_addr().unwrap_or_else(|| "127.0.0.1:8091".to_string()),
            iopub_addr: env::iopub_addr().unwrap_or_else(|| "127.0.0.1:8092".to_string()),
            ident,
            profile_dir,
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
