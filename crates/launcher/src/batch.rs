// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `BatchSystemLauncher` (spec.md §4.1.4): renders a batch script, submits
//! it, parses the job id from submit output, and deletes it on stop.
//! PBS and SGE variants differ only in their commands/regexes/templates.

use std::collections::BTreeMap;
use std::os::unix::fs::PermissionsExt;
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

/// A mapping `name -> value` used to render a batch script
/// (spec.md §3 `BatchContext`). Mandatory keys `n`, `profile_dir`, `queue`
/// are set by [`BatchSystemLauncher::start`]; additional keys may be set
/// with [`BatchSystemLauncher::with_context`].
pub type BatchContext = BTreeMap<String, String>;

/// Where the batch script template comes from, in priority order
/// (spec.md §4.1.4 "Script rendering policy").
pub enum TemplateSource {
    /// (a) an in-memory template, highest priority.
    Inline(String),
    /// (b) a template file, read when no inline template is set.
    File(PathBuf),
    /// (c) the subclass's compiled-in default, lowest priority.
    Default(String),
}

/// The regex/template pair and submit/delete commands that distinguish one
/// batch backend (PBS, SGE, ...) from another.
pub struct BatchFlavor {
    pub submit_command: Vec<String>,
    pub delete_command: Vec<String>,
    pub job_id_regexp: Regex,
    pub job_array_regexp: Regex,
    pub job_array_template: String,
    pub queue_regexp: Regex,
    pub queue_template: String,
}

impl BatchFlavor {
    /// PBS: `qsub`/`qdel`, numeric job ids, `#PBS -t`/`#PBS -q` directives.
    #[allow(clippy::expect_used)] // patterns are compile-time constants
    pub fn pbs() -> Self {
        Self {
            submit_command: vec!["qsub".into()],
            delete_command: vec!["qdel".into()],
            job_id_regexp: Regex::new(r"\d+").expect("valid regex"),
            job_array_regexp: Regex::new(r"#PBS\W+-t\W+[\w\d\-\$]+").expect("valid regex"),
            job_array_template: "#PBS -t 1-{n}".into(),
            queue_regexp: Regex::new(r"#PBS\W+-q\W+\$?\w+").expect("valid regex"),
            queue_template: "#PBS -q {queue}".into(),
        }
    }

    /// SGE: PBS's commands and job-id regex, `#$ -t`/`#$ -q` directives.
    #[allow(clippy::expect_used)] // patterns are compile-time constants
    pub fn sge() -> Self {
        Self {
            job_array_regexp: Regex::new(r"#\$\W+-t").expect("valid regex"),
            job_array_template: "#$ -t 1-{n}".into(),
            queue_regexp: Regex::new(r"#\$\W+-q\W+\$?\w+").expect("valid regex"),
            queue_template: "#$ -q {queue}".into(),
            ..Self::pbs()
        }
    }
}

/// Render `template` against `context`'s `{name}` placeholders
/// (spec.md §6 "Batch-script templates"). Unknown placeholders are left
/// untouched.
#[allow(clippy::expect_used)] // `i` is always a valid char boundary here
pub fn render(template: &str, context: &BatchContext) -> String {
    let mut out = String::with_capacity(template.len());
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = template[i..].find('}') {
                let name = &template[i + 1..i + end];
                if let Some(value) = context.get(name) {
                    out.push_str(value);
                    i += end + 1;
                    continue;
                }
            }
        }
        let ch = template[i..].chars().next().expect("i within bounds");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Inject `job_array_template` (if `job_array_regexp` doesn't already
/// match) and then `queue_template` (if `queue` is non-empty and
/// `queue_regexp` doesn't already match), each immediately after the
/// template's first line.
///
/// Injection order is job-array first, then queue — the queue insertion,
/// running second, pushes the job-array line down by one, so the final
/// order is `shebang, queue_template, job_array_template, ...rest`
/// (spec.md §9 design note, resolved).
pub fn inject_directives(template: &str, flavor: &BatchFlavor, queue: &str) -> String {
    let mut template = template.to_string();

    if !flavor.job_array_regexp.is_match(&template) {
        template = insert_after_first_line(&template, &flavor.job_array_template);
    }

    if !queue.is_empty() && !flavor.queue_regexp.is_match(&template) {
        template = insert_after_first_line(&template, &flavor.queue_template);
    }

    template
}

fn insert_after_first_line(template: &str, line: &str) -> String {
    match template.split_once('\n') {
        Some((first, rest)) => format!("{first}\n{line}\n{rest}"),
        None => format!("{template}\n{line}"),
    }
}

/// Extract a job id from submit-command stdout (spec.md §6 "Batch job
/// id"). Fails with `LauncherError::Batch` if no match.
pub fn parse_job_id(flavor: &BatchFlavor, output: &str) -> Result<String, LauncherError> {
    flavor
        .job_id_regexp
        .find(output)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| LauncherError::Batch(format!("Job id couldn't be determined: {output}")))
}

pub struct BatchSystemLauncher {
    flavor: BatchFlavor,
    template_source: TemplateSource,
    work_dir: PathBuf,
    batch_file_name: String,
    queue: String,
    context: BatchContext,
    core: SharedCore,
    job_id: Option<String>,
}

impl BatchSystemLauncher {
    pub fn new(
        flavor: BatchFlavor,
        template_source: TemplateSource,
        work_dir: impl Into<PathBuf>,
        batch_file_name: impl Into<String>,
    ) -> Self {
        Self {
            flavor,
            template_source,
            work_dir: work_dir.into(),
            batch_file_name: batch_file_name.into(),
            queue: String::new(),
            context: BatchContext::new(),
            core: new_shared_core(),
            job_id: None,
        }
    }

    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn batch_file(&self) -> PathBuf {
        self.work_dir.join(&self.batch_file_name)
    }

    fn resolve_template(&self) -> Result<String, LauncherError> {
        match &self.template_source {
            TemplateSource::Inline(s) => Ok(s.clone()),
            TemplateSource::File(path) => std::fs::read_to_string(path)
                .map_err(|e| LauncherError::Batch(format!("reading batch template file: {e}"))),
            TemplateSource::Default(s) => Ok(s.clone()),
        }
    }

    /// Render and write the batch script to `work_dir/batch_file_name`,
    /// chmod'd to owner rwx (spec.md §4.1.4, §8 invariant 8 idempotence).
    pub fn write_batch_script(&mut self, n: u32, profile_dir: impl AsRef<std::path::Path>) -> Result<(), LauncherError> {
        self.context.insert("n".into(), n.to_string());
        self.context.insert("queue".into(), self.queue.clone());
        self.context.insert(
            "profile_dir".into(),
            profile_dir.as_ref().display().to_string(),
        );

        let template = self.resolve_template()?;
        let template = inject_directives(&template, &self.flavor, &self.queue);
        let script = render(&template, &self.context);

        let path = self.batch_file();
        std::fs::write(&path, &script)
            .map_err(|e| LauncherError::Batch(format!("writing batch script: {e}")))?;
        let mut perms = std::fs::metadata(&path)
            .map_err(|e| LauncherError::Batch(format!("stat batch script: {e}")))?
            .permissions();
        perms.set_mode(0o700);
        std::fs::set_permissions(&path, perms)
            .map_err(|e| LauncherError::Batch(format!("chmod batch script: {e}")))?;

        info!(path = %path.display(), "wrote batch script");
        Ok(())
    }

    /// Start `n` copies of the process for `profile_dir` (spec.md §4.1.4
    /// `start`). Controller variants call this with `n = 1`.
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

        self.write_batch_script(n, &profile_dir)?;

        let mut cmd = Command::new(&self.flavor.submit_command[0]);
        cmd.args(&self.flavor.submit_command[1..]);
        cmd.arg(self.batch_file());
        cmd.current_dir(&self.work_dir);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        let output = cmd
            .output()
            .await
            .map_err(|e| LauncherError::Batch(format!("submit command failed: {e}")))?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        let job_id = parse_job_id(&self.flavor, &stdout)?;
        info!(job_id = %job_id, "job submitted");
        self.job_id = Some(job_id.clone());
        self.core.lock().notify_start(StartData::JobId(job_id.clone()));
        Ok(job_id)
    }
}

#[async_trait]
impl Launcher for BatchSystemLauncher {
    /// Not used directly: batch launchers start with `(n, profile_dir)`
    /// via [`Self::start_n`]; this trait method exists only to satisfy
    /// `dyn Launcher` composition inside a `LauncherSet` where `n` was
    /// already fixed by the caller through [`Self::with_context`].
    async fn start(&mut self) -> Result<(), LauncherError> {
        let n: u32 = self
            .context
            .get("n")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);
        let profile_dir = self
            .context
            .get("profile_dir")
            .cloned()
            .unwrap_or_else(|| ".".into());
        self.start_n(n, profile_dir).await.map(|_| ())
    }

    fn stop(&mut self) {
        let Some(job_id) = self.job_id.clone() else {
            return;
        };
        let flavor_cmd = self.flavor.delete_command.clone();
        let work_dir = self.work_dir.clone();
        let core = self.core.clone();
        tokio::spawn(async move {
            let mut cmd = Command::new(&flavor_cmd[0]);
            cmd.args(&flavor_cmd[1..]);
            cmd.arg(&job_id);
            cmd.current_dir(&work_dir);
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
            // Batch stop failure is swallowed: notify_stop fires either way
            // so observers are not starved (spec.md §7).
            let output = cmd.output().await.ok();
            let output_str = output
                .map(|o| String::from_utf8_lossy(&o.stdout).into_owned())
                .unwrap_or_default();
            core.lock().notify_stop(StopData::Batch {
                job_id,
                output: output_str,
            });
        });
    }

    fn signal(&mut self, _sig: Signal) {
        // Batch systems have no direct signal delivery; `stop()` (job
        // deletion) is the only lifecycle transition they support.
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
#[path = "batch_tests.rs"]
mod tests;
