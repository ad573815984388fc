// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pf-launchd: a driver exercising the Launcher Framework. Starts one
//! controller process and a `LauncherSet` of N engine processes, appends
//! `profile_dir=<path>` to each (spec.md §6), and stops everything on
//! SIGINT/SIGTERM.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod cli;
mod config;
mod env;

use std::collections::HashMap;
use std::sync::Arc;

use pf_launcher::lifecycle::StopData;
use pf_launcher::{LauncherSet, LocalProcessLauncher};
use pf_launcher::Launcher;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::info;

use crate::cli::Cli;
use crate::config::Config;

fn setup_logging(config: &Config) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        config.log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("launchd.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

fn build_engine_set(cli: &Cli) -> LauncherSet {
    let mut children: HashMap<String, Box<dyn Launcher>> = HashMap::new();
    for i in 0..cli.n_engines {
        let launcher = LocalProcessLauncher::new(cli.engine_program.clone(), cli.engine_args.clone())
            .with_profile_dir(&cli.profile_dir)
            .with_interrupt_delay(pf_launcher::set::DEFAULT_SET_INTERRUPT_THEN_KILL_DELAY);
        children.insert(i.to_string(), Box::new(launcher));
    }
    LauncherSet::new(children)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = cli::parse(&args)?;

    let config = Config::load()?;
    let _log_guard = setup_logging(&config)?;

    info!(n_engines = cli.n_engines, "starting controller and engine set");

    let mut controller = LocalProcessLauncher::new(cli.controller_program.clone(), cli.controller_args.clone())
        .with_profile_dir(&cli.profile_dir);
    controller.start().await?;

    let controller_stopped = Arc::new(Notify::new());
    let notify = controller_stopped.clone();
    controller.on_stop(Box::new(move |_: &StopData| {
        notify.notify_one();
    }));

    let mut engines = build_engine_set(&cli);
    engines.start_all().await?;

    let engines_stopped = Arc::new(Notify::new());
    let notify = engines_stopped.clone();
    engines.on_stop(Box::new(move |_: &StopData| {
        notify.notify_one();
    }));

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }

    info!("stopping controller and engine set");
    controller.stop();
    engines.stop();

    controller_stopped.notified().await;
    engines_stopped.notified().await;

    info!("launchd exiting");
    Ok(())
}
