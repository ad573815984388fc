// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WindowsHPCLauncher` (spec.md §4.1.5): writes an XML job description,
//! submits it to the Windows HPC Server job scheduler, parses the job id
//! from `job submit` stdout, and cancels it on stop.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use nix::sys::signal::Signal;
use pf_core::{LauncherError, LauncherState};
use regex::Regex;
use tokio::process::Command;
use tracing::info;

use crate::launcher::Launcher;
use crate::lifecycle::{new_shared_core, SharedCore, StartData, StopCallback, StopData};

/// One `<Task>` entry in a Win HPC job description: a single controller or
/// engine process, with stdout/stderr redirected under `work_directory`.
pub struct JobTask {
    pub command_line: String,
    pub work_directory: String,
}

/// Render a minimal Win HPC job XML containing `tasks` (spec.md §4.1.5).
/// Grounded on the original `IPControllerJob`/`IPEngineSetJob` templates,
/// reduced to the fields this crate actually emits.
pub fn render_job_xml(tasks: &[JobTask]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Job>\n");
    for task in tasks {
        xml.push_str(&format!(
            "  <Task CommandLine=\"{}\" WorkDirectory=\"{}\" />\n",
            task.command_line, task.work_directory
        ));
    }
    xml.push_str("</Job>\n");
    xml
}

pub fn job_id_regexp() -> Regex {
    #[allow(clippy::expect_used)] // compile-time constant pattern
    Regex::new(r"\d+").expect("valid regex")
}

pub fn parse_job_id(output: &str) -> Result<String, LauncherError> {
    job_id_regexp()
        .find(output)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| LauncherError::Batch(format!("Job id couldn't be determined: {output}")))
}

/// Which task set to render: one controller task, or `n` engine tasks.
pub enum JobKind {
    Controller,
    EngineSet,
}

pub struct WindowsHPCLauncher {
    kind: JobKind,
    job_file_name: String,
    program: String,
    scheduler: String,
    job_cmd: String,
    work_dir: PathBuf,
    core: SharedCore,
    job_id: Option<String>,
}

impl WindowsHPCLauncher {
    pub fn controller(program: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self::new(JobKind::Controller, "ipcontroller_job.xml", program, work_dir)
    }

    pub fn engine_set(program: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self::new(JobKind::EngineSet, "ipengineset_job.xml", program, work_dir)
    }

    fn new(
        kind: JobKind,
        job_file_name: impl Into<String>,
        program: impl Into<String>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            kind,
            job_file_name: job_file_name.into(),
            program: program.into(),
            scheduler: String::new(),
            job_cmd: "job".into(),
            work_dir: work_dir.into(),
            core: new_shared_core(),
            job_id: None,
        }
    }

    pub fn with_scheduler(mut self, scheduler: impl Into<String>) -> Self {
        self.scheduler = scheduler.into();
        self
    }

    pub fn job_file(&self, profile_dir: impl AsRef<std::path::Path>) -> PathBuf {
        profile_dir.as_ref().join(&self.job_file_name)
    }

    fn write_job_file(
        &self,
        n: u32,
        profile_dir: impl AsRef<std::path::Path>,
    ) -> Result<(), LauncherError> {
        let profile_dir_str = profile_dir.as_ref().display().to_string();
        let extra_arg = format!("profile_dir={profile_dir_str}");
        let task_count = match self.kind {
            JobKind::Controller => 1,
            JobKind::EngineSet => n,
        };
        let tasks: Vec<JobTask> = (0..task_count)
            .map(|_| JobTask {
                command_line: format!("{} {}", self.program, extra_arg),
                work_directory: profile_dir_str.clone(),
            })
            .collect();
        let xml = render_job_xml(&tasks);
        let path = self.job_file(&profile_dir);
        std::fs::write(&path, xml)
            .map_err(|e| LauncherError::Batch(format!("writing job file: {e}")))?;
        info!(path = %path.display(), "wrote Win HPC job description");
        Ok(())
    }

    /// Start `n` copies (1 for a controller, `n` for an engine set) under
    /// `profile_dir` (spec.md §4.1.5).
    pub async fn start_n(
        &mut self,
        n: u32,
        profile_dir: impl AsRef<std::path::Path>,
    ) -> Result<String, LauncherError> {
        if !self.core.lock().state().can_start() {
            return Err(LauncherError::ProcessState(pf_core::error::ProcessStateError {
                state: self.core.lock().state(),
                attempted: "start",
            }));
        }

        self.write_job_file(n, &profile_dir)?;

        let mut cmd = Command::new(&self.job_cmd);
        cmd.arg("submit")
            .arg(format!(
                "/jobfile:{}",
                self.job_file(&profile_dir).display()
            ))
            .arg(format!("/scheduler:{}", self.scheduler));
        cmd.current_dir(&self.work_dir);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        let output = cmd
            .output()
            .await
            .map_err(|e| LauncherError::Batch(format!("job submit failed: {e}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        let job_id = parse_job_id(&stdout)?;
        info!(job_id = %job_id, "Win HPC job started");
        self.job_id = Some(job_id.clone());
        self.core.lock().notify_start(StartData::JobId(job_id.clone()));
        Ok(job_id)
    }
}

#[async_trait]
impl Launcher for WindowsHPCLauncher {
    async fn start(&mut self) -> Result<(), LauncherError> {
        Err(LauncherError::Batch(
            "WindowsHPCLauncher requires (n, profile_dir); use start_n".into(),
        ))
    }

    /// Cancel the job. Cancel failure is treated as "already stopped":
    /// `notify_stop` still fires either way (spec.md §4.1.5).
    fn stop(&mut self) {
        let Some(job_id) = self.job_id.clone() else {
            return;
        };
        let job_cmd = self.job_cmd.clone();
        let scheduler = self.scheduler.clone();
        let work_dir = self.work_dir.clone();
        let core = self.core.clone();
        tokio::spawn(async move {
            let mut cmd = Command::new(&job_cmd);
            cmd.arg("cancel")
                .arg(&job_id)
                .arg(format!("/scheduler:{scheduler}"));
            cmd.current_dir(&work_dir);
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
            let output = cmd.output().await.ok();
            let output_str = match output {
                Some(o) if o.status.success() => {
                    String::from_utf8_lossy(&o.stdout).into_owned()
                }
                _ => format!("The job already appears to be stopped: {job_id:?}"),
            };
            core.lock().notify_stop(StopData::Batch {
                job_id,
                output: output_str,
            });
        });
    }

    fn signal(&mut self, _sig: Signal) {
        // Win HPC jobs have no direct signal delivery; `stop()` (job
        // cancellation) is the only lifecycle transition they support.
    }

    fn on_stop(&mut self, cb: StopCallback) {
        self.core.lock().on_stop(cb);
    }

    fn state(&self) -> LauncherState {
        self.core.lock().state()
    }

    fn stop_data(&self) -> Option<StopData> {
        self.core.lock().stop_data().cloned()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[cfg(test)]
#[path = "winhpc_tests.rs"]
mod tests;
