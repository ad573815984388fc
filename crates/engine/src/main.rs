// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pf-engine: the engine process. Dials the shell/control/iopub addresses
//! handed to it by the launcher, wires an `EngineKernel` onto them, and
//! runs the single-threaded dispatch loop until a stream closes
//! (spec.md §4.2, §5).

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod env;
mod error;

use std::path::PathBuf;

use pf_kernel::{EngineKernel, NamespaceCompleter, ScriptExecutor};
use pf_stream::framed::FramedStream;
use tokio::net::TcpStream;
use tracing::info;

use crate::config::Config;
use crate::error::EngineAppError;

fn parse_profile_dir(args: &[String]) -> PathBuf {
    args.iter()
        .find_map(|arg| arg.strip_prefix("profile_dir="))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn setup_logging(config: &Config) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        config.log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("engine.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

async fn dial(addr: &str) -> std::io::Result<FramedStream<tokio::io::ReadHalf<TcpStream>, tokio::io::WriteHalf<TcpStream>>> {
    let stream = TcpStream::connect(addr).await?;
    let (r, w) = tokio::io::split(stream);
    Ok(FramedStream::new(r, w))
}

#[tokio::main]
async fn main() -> Result<(), EngineAppError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let profile_dir = parse_profile_dir(&args);

    let config = Config::load(profile_dir)?;
    let _log_guard = setup_logging(&config)?;

    info!(ident = %config.ident, profile_dir = %config.profile_dir.display(), "starting engine");

    let shell = dial(&config.shell_addr).await?;
    let control = dial(&config.control_addr).await?;
    let iopub = dial(&config.iopub_addr).await?;

    let mut kernel = EngineKernel::new(
        vec![Box::new(shell)],
        Box::new(control),
        Box::new(iopub),
        config.ident.clone(),
        Box::new(ScriptExecutor::new()),
        Box::new(NamespaceCompleter),
    );

    let local = tokio::task::LocalSet::new();
    local.run_until(async move { kernel.run().await }).await?;

    info!("engine exiting");
    Ok(())
}

#[cfg(test)]
mod main_tests {
    use super::*;

    #[test]
    fn parse_profile_dir_extracts_the_conventional_argument() {
        let args = vec!["--log-to-file".to_string(), "profile_dir=/p".to_string()];
        assert_eq!(parse_profile_dir(&args), PathBuf::from("/p"));
    }

    #[test]
    fn parse_profile_dir_defaults_to_current_directory() {
        let args = vec!["--log-to-file".to_string()];
        assert_eq!(parse_profile_dir(&args), PathBuf::from("."));
    }
}
