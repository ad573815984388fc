// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument parsing for the launchd driver.
//!
//! Usage: `pf-launchd --engines N [--profile-dir PATH] -- <controller
//! program> [args...] -- <engine program> [args...]`. The controller and
//! engine programs are external to this core (spec.md §1 Non-goals); this
//! driver only knows how to start, monitor, and stop whatever is named
//! here.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("missing '--' separated controller command")]
    MissingController,
    #[error("missing second '--' separated engine command")]
    MissingEngine,
    #[error("--engines requires a positive integer, got '{0}'")]
    BadEngineCount(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub n_engines: u32,
    pub profile_dir: PathBuf,
    pub controller_program: String,
    pub controller_args: Vec<String>,
    pub engine_program: String,
    pub engine_args: Vec<String>,
}

pub fn parse(args: &[String]) -> Result<Cli, CliError> {
    let mut n_engines = 1u32;
    let mut profile_dir = PathBuf::from(".");
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--engines" => {
                let val = args.get(i + 1).cloned().unwrap_or_default();
                n_engines = val
                    .parse()
                    .map_err(|_| CliError::BadEngineCount(val.clone()))?;
                if n_engines == 0 {
                    return Err(CliError::BadEngineCount(val));
                }
                i += 2;
            }
            "--profile-dir" => {
                profile_dir = PathBuf::from(args.get(i + 1).cloned().unwrap_or_default());
                i += 2;
            }
            "--" => break,
            _ => i += 1,
        }
    }

    let rest = &args[i.min(args.len())..];
    let rest = match rest.first() {
        Some(tok) if tok == "--" => &rest[1..],
        _ => rest,
    };

    let mut groups = rest.split(|a| a == "--");
    let controller: Vec<String> = groups.next().unwrap_or_default().to_vec();
    let engine: Vec<String> = groups.next().ok_or(CliError::MissingEngine)?.to_vec();

    let (controller_program, controller_args) = controller
        .split_first()
        .map(|(p, rest)| (p.clone(), rest.to_vec()))
        .ok_or(CliError::MissingController)?;
    let (engine_program, engine_args) = engine
        .split_first()
        .map(|(p, rest)| (p.clone(), rest.to_vec()))
        .ok_or(CliError::MissingEngine)?;

    Ok(Cli {
        n_engines,
        profile_dir,
        controller_program,
        controller_args,
        engine_program,
        engine_args,
    })
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
