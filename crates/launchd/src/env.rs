// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the launchd driver.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Resolve state directory: PF_STATE_DIR > XDG_STATE_HOME/pf > ~/.local/state/pf
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("PF_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("pf"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/pf"))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
