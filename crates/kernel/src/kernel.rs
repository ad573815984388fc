// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `EngineKernel` (spec.md §4.2): handler table, abort set, execute/apply
//! loop, result packing, iopub broadcasting, control-plane shutdown/abort.
//!
//! Handler dispatch is an explicit `HashMap<String, HandlerKind>` built at
//! construction (spec.md §9 "Handler tables built by reflection") rather
//! than the source's dynamic method-name binding, so the shell-vs-control
//! split is a plain, inspectable table instead of runtime reflection.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::select_all;
use pf_core::message::{Header, Message};
use pf_core::timestamp::now_iso8601;
use pf_core::AbortSet;
use pf_stream::{Frames, MessageSession, Stream};
use serde_json::{json, Value};
use tracing::error;

use crate::content::{AbortRequestContent, CompleteRequestContent, ExceptionContent, ExecuteRequestContent};
use crate::error::KernelError;
use crate::executor::{Executor, UserNamespace};
use crate::Completer;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum HandlerKind {
    Execute,
    Complete,
    Apply,
    Clear,
    Shutdown,
    Abort,
}

fn shell_table() -> HashMap<String, HandlerKind> {
    HashMap::from([
        ("execute_request".to_string(), HandlerKind::Execute),
        ("complete_request".to_string(), HandlerKind::Complete),
        ("apply_request".to_string(), HandlerKind::Apply),
        ("clear_request".to_string(), HandlerKind::Clear),
    ])
}

fn control_table() -> HashMap<String, HandlerKind> {
    let mut table = shell_table();
    table.insert("shutdown_request".to_string(), HandlerKind::Shutdown);
    table.insert("abort_request".to_string(), HandlerKind::Abort);
    table
}

/// Derive a reply's `msg_type` from a request's: the segment before the
/// first `_` plus `_reply` (spec.md §4.2.1 step 4).
fn reply_type_for(msg_type: &str) -> String {
    let prefix = msg_type.split('_').next().unwrap_or(msg_type);
    format!("{prefix}_reply")
}

fn decode_apply_buffers(buffers: &[Vec<u8>]) -> Result<(Value, Vec<Value>, HashMap<String, Value>), KernelError> {
    let buf = buffers
        .first()
        .ok_or_else(|| KernelError::Protocol("apply_request missing f/args/kwargs buffer".into()))?;
    let tuple = serde_json::from_slice(buf)?;
    Ok(tuple)
}

fn flush_host_stdio() {
    use std::io::Write;
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}

pub struct EngineKernel {
    user_ns: UserNamespace,
    shell_streams: Vec<Box<dyn Stream>>,
    control_stream: Box<dyn Stream>,
    iopub_stream: Box<dyn Stream>,
    ident: String,
    int_id: i64,
    shell_table: HashMap<String, HandlerKind>,
    control_table: HashMap<String, HandlerKind>,
    aborted: AbortSet,
    exec_lines: Vec<String>,
    executor: Box<dyn Executor>,
    completer: Box<dyn Completer>,
    session: MessageSession,
}

impl EngineKernel {
    pub fn new(
        shell_streams: Vec<Box<dyn Stream>>,
        control_stream: Box<dyn Stream>,
        iopub_stream: Box<dyn Stream>,
        ident: impl Into<String>,
        executor: Box<dyn Executor>,
        completer: Box<dyn Completer>,
    ) -> Self {
        Self {
            user_ns: UserNamespace::new(),
            shell_streams,
            control_stream,
            iopub_stream,
            ident: ident.into(),
            int_id: -1,
            shell_table: shell_table(),
            control_table: control_table(),
            aborted: AbortSet::new(),
            exec_lines: Vec::new(),
            executor,
            completer,
            session: MessageSession::default(),
        }
    }

    pub fn with_exec_lines(mut self, lines: Vec<String>) -> Self {
        self.exec_lines = lines;
        self
    }

    pub fn set_int_id(&mut self, int_id: i64) {
        self.int_id = int_id;
    }

    pub fn int_id(&self) -> i64 {
        self.int_id
    }

    pub fn prefix(&self) -> String {
        format!("engine.{}", self.int_id)
    }

    pub fn user_ns(&self) -> &UserNamespace {
        &self.user_ns
    }

    pub fn abort_set(&self) -> &AbortSet {
        &self.aborted
    }

    pub fn mark_aborted(&mut self, msg_id: impl Into<String>) {
        self.aborted.insert(msg_id);
    }

    /// Handle one frame set received on shell stream `stream_idx`
    /// (spec.md §4.2.1). Control is flushed first so control always wins
    /// ordering priority over a later-arriving shell message.
    pub async fn dispatch_queue(&mut self, stream_idx: usize, frames: Frames) -> Result<(), KernelError> {
        self.control_stream.flush().await?;
        self.dispatch(Some(stream_idx), frames, true).await
    }

    /// Handle one frame set received on the control stream. Skips the
    /// abort check — control messages bypass the abort set
    /// (spec.md §4.2.1, §4.3).
    pub async fn dispatch_control(&mut self, frames: Frames) -> Result<(), KernelError> {
        self.dispatch(None, frames, false).await
    }

    /// Drive the kernel until a stream closes (spec.md §5 single-threaded
    /// cooperative loop; intended to run inside a `tokio::task::LocalSet`).
    /// Control is raced against every shell stream each iteration and wins
    /// ties, matching `dispatch_queue`'s control-first flush.
    pub async fn run(&mut self) -> Result<(), KernelError> {
        loop {
            if self.shell_streams.is_empty() {
                return match self.control_stream.recv().await {
                    Ok(frames) => self.dispatch_control(frames).await,
                    Err(_) => Ok(()),
                };
            }

            let control_fut = self.control_stream.recv();
            let shell_select = select_all(self.shell_streams.iter_mut().map(|s| s.recv()));

            tokio::select! {
                biased;
                res = control_fut => match res {
                    Ok(frames) => self.dispatch_control(frames).await?,
                    Err(_) => return Ok(()),
                },
                (res, idx, _rest) = shell_select => match res {
                    Ok(frames) => self.dispatch_queue(idx, frames).await?,
                    Err(_) => return Ok(()),
                },
            }
        }
    }

    async fn dispatch(
        &mut self,
        stream_idx: Option<usize>,
        frames: Frames,
        check_abort: bool,
    ) -> Result<(), KernelError> {
        let msg = match self.session.unpack(frames) {
            Ok(msg) => msg,
            Err(e) => {
                error!(error = %e, "failed to decode message frames");
                return Ok(());
            }
        };

        if check_abort && self.aborted.take(&msg.header.msg_id) {
            let reply_type = reply_type_for(&msg.header.msg_type);
            return self
                .reply(stream_idx, &msg, &reply_type, json!({"status": "aborted"}), None)
                .await;
        }

        let table = if check_abort { &self.shell_table } else { &self.control_table };
        let Some(kind) = table.get(&msg.header.msg_type).copied() else {
            error!(msg_type = %msg.header.msg_type, "unknown message type, dropping");
            return Ok(());
        };

        match kind {
            HandlerKind::Execute => self.execute_request(stream_idx, &msg).await,
            HandlerKind::Complete => self.complete_request(stream_idx, &msg).await,
            HandlerKind::Apply => self.apply_request(stream_idx, &msg).await,
            HandlerKind::Clear => self.clear_request(stream_idx, &msg).await,
            HandlerKind::Shutdown => self.shutdown_request(&msg).await,
            HandlerKind::Abort => self.abort_request(&msg).await,
        }
    }

    async fn reply(
        &mut self,
        stream_idx: Option<usize>,
        request: &Message,
        reply_type: &str,
        content: Value,
        metadata: Option<Value>,
    ) -> Result<(), KernelError> {
        let mut reply = request.reply(reply_type, content);
        if let Some(metadata) = metadata {
            reply.metadata = metadata;
        }
        let frames = self.session.pack(&reply)?;
        match stream_idx {
            Some(idx) => self.shell_streams[idx].send(frames).await?,
            None => self.control_stream.send(frames).await?,
        }
        Ok(())
    }

    async fn broadcast_iopub(&mut self, msg_type: &str, content: Value) -> Result<(), KernelError> {
        let identity = format!("{}.{msg_type}", self.prefix()).into_bytes();
        let msg = Message {
            header: Header::new(msg_type, String::new()),
            parent_header: None,
            metadata: json!({}),
            content,
            buffers: Vec::new(),
            identities: vec![identity],
        };
        let frames = self.session.pack(&msg)?;
        self.iopub_stream.send(frames).await?;
        Ok(())
    }

    /// `execute_request` (spec.md §4.2.2).
    async fn execute_request(&mut self, stream_idx: Option<usize>, msg: &Message) -> Result<(), KernelError> {
        let content: ExecuteRequestContent = serde_json::from_value(msg.content.clone())?;
        self.broadcast_iopub("pyin", json!({"code": content.code})).await?;

        let started = now_iso8601();
        let result = self.executor.exec(&content.code, &mut self.user_ns);

        let (reply_content, is_error) = match result {
            Ok(()) => (json!({"status": "ok"}), false),
            Err(err) => {
                let exc = ExceptionContent::from_exec_error(&err, &self.ident, self.int_id, "execute_request");
                self.broadcast_iopub("pyerr", serde_json::to_value(&exc)?).await?;
                let mut content = serde_json::to_value(&exc)?;
                if let Some(obj) = content.as_object_mut() {
                    obj.insert("status".into(), json!("error"));
                }
                (content, true)
            }
        };

        self.reply(
            stream_idx,
            msg,
            "execute_reply",
            reply_content,
            Some(json!({"started": started})),
        )
        .await?;

        if is_error {
            self.abort_queues().await?;
        }
        Ok(())
    }

    /// `apply_request` (spec.md §4.2.3).
    async fn apply_request(&mut self, stream_idx: Option<usize>, msg: &Message) -> Result<(), KernelError> {
        match stream_idx {
            Some(idx) => self.shell_streams[idx].flush().await?,
            None => self.control_stream.flush().await?,
        }

        let synthetic = msg.header.msg_id.replace('-', "");
        let f_name = format!("_{synthetic}_f");
        let args_name = format!("_{synthetic}_args");
        let kwargs_name = format!("_{synthetic}_kwargs");
        let result_name = format!("_{synthetic}_result");

        let (f, args, kwargs) = decode_apply_buffers(&msg.buffers)?;

        self.user_ns.insert(f_name.clone(), f.clone());
        self.user_ns.insert(args_name.clone(), Value::Array(args.clone()));
        self.user_ns
            .insert(kwargs_name.clone(), Value::Object(kwargs.clone().into_iter().collect()));

        let call_result = self.executor.call(&f, &args, &kwargs);

        // Guaranteed cleanup on both success and failure paths (spec.md §8
        // invariant 7).
        self.user_ns.remove(&f_name);
        self.user_ns.remove(&args_name);
        self.user_ns.remove(&kwargs_name);
        self.user_ns.remove(&result_name);

        let (reply_buffers, dependencies_met, status) = match call_result {
            Ok(value) => (vec![serde_json::to_vec(&value)?], true, "ok"),
            Err(err) => {
                let dependencies_met = !err.is_unmet_dependency();
                let exc = ExceptionContent::from_exec_error(&err, &self.ident, self.int_id, "apply_request");
                self.broadcast_iopub("pyerr", serde_json::to_value(&exc)?).await?;
                (Vec::new(), dependencies_met, "error")
            }
        };

        let started = now_iso8601();
        let metadata = json!({
            "dependencies_met": dependencies_met,
            "engine": self.ident,
            "started": started,
            "status": status,
        });

        let mut reply = msg.reply("apply_reply", Value::Null);
        reply.metadata = metadata;
        reply.buffers = reply_buffers;
        let frames = self.session.pack(&reply)?;
        match stream_idx {
            Some(idx) => self.shell_streams[idx].send(frames).await?,
            None => self.control_stream.send(frames).await?,
        }

        // Flush the host process's own stdout/stderr to avoid one
        // request's output bleeding into the next (spec.md §4.2.3 step 9).
        flush_host_stdio();
        Ok(())
    }

    /// `complete_request` (spec.md §4.2.4).
    async fn complete_request(&mut self, stream_idx: Option<usize>, msg: &Message) -> Result<(), KernelError> {
        let content: CompleteRequestContent = serde_json::from_value(msg.content.clone())?;
        let matches = self.completer.complete(&self.user_ns, &content.line, &content.text);
        self.reply(
            stream_idx,
            msg,
            "complete_reply",
            json!({"matches": matches, "status": "ok"}),
            None,
        )
        .await
    }

    /// `clear_request` (spec.md §4.2.5).
    async fn clear_request(&mut self, stream_idx: Option<usize>, msg: &Message) -> Result<(), KernelError> {
        self.user_ns.clear();
        self.reply(stream_idx, msg, "clear_reply", json!({"status": "ok"}), None)
            .await?;
        for line in self.exec_lines.clone() {
            let _ = self.executor.exec(&line, &mut self.user_ns);
        }
        Ok(())
    }

    /// `shutdown_request` (spec.md §4.2.6). Always arrives on the control
    /// stream.
    async fn shutdown_request(&mut self, msg: &Message) -> Result<(), KernelError> {
        let content = match self.abort_queues().await {
            Ok(()) => {
                let mut content = msg.content.clone();
                match content.as_object_mut() {
                    Some(obj) => {
                        obj.insert("status".into(), json!("ok"));
                        content
                    }
                    None => json!({"status": "ok"}),
                }
            }
            Err(e) => serde_json::to_value(ExceptionContent {
                ename: "ShutdownError".into(),
                evalue: e.to_string(),
                traceback: Vec::new(),
                engine_uuid: self.ident.clone(),
                engine_id: self.int_id,
                method: "shutdown_request".into(),
            })?,
        };
        self.reply(None, msg, "shutdown_reply", content, None).await?;

        tokio::spawn(async move {
            tokio::time::sleep(pf_core::clock::SHUTDOWN_GRACE).await;
            std::process::exit(0);
        });
        Ok(())
    }

    /// `abort_request` (spec.md §4.2.7).
    async fn abort_request(&mut self, msg: &Message) -> Result<(), KernelError> {
        let content: AbortRequestContent = serde_json::from_value(msg.content.clone()).unwrap_or_default();
        if content.msg_ids.is_empty() {
            self.abort_queues().await?;
        } else {
            for id in content.msg_ids {
                self.aborted.insert(id);
            }
        }
        self.reply(None, msg, "abort_reply", json!({"status": "ok"}), None).await
    }

    /// Drain every shell stream's pending frames, replying `aborted` to
    /// each, without interrupting any in-flight handler (spec.md §4.2.8,
    /// §9 "do not interrupt in-flight handlers").
    pub async fn abort_queues(&mut self) -> Result<(), KernelError> {
        for idx in 0..self.shell_streams.len() {
            loop {
                let frames = match tokio::time::timeout(Duration::from_millis(0), self.shell_streams[idx].recv()).await
                {
                    Ok(Ok(frames)) => frames,
                    _ => break,
                };
                if let Ok(msg) = self.session.unpack(frames) {
                    let reply_type = reply_type_for(&msg.header.msg_type);
                    let reply = msg.reply(reply_type, json!({"status": "aborted"}));
                    if let Ok(out) = self.session.pack(&reply) {
                        let _ = self.shell_streams[idx].send(out).await;
                    }
                }
                tokio::time::sleep(pf_core::clock::ABORT_DRAIN_INTERVAL).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "kernel_tests.rs"]
mod tests;
