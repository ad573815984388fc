// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::Arc;

use pf_core::message::{Header, Message};
use pf_stream::channel::ChannelStream;
use pf_stream::{Frames, MessageSession};
use serde_json::{json, Value};

use super::*;
use crate::completer::NamespaceCompleter;
use crate::executor::ScriptExecutor;

fn request(msg_type: &str, content: Value, identities: Vec<Vec<u8>>) -> Message {
    Message {
        header: Header::new(msg_type, "test-session"),
        parent_header: None,
        metadata: json!({}),
        content,
        buffers: Vec::new(),
        identities,
    }
}

fn unpack(frames: Frames) -> Message {
    MessageSession::default().unpack(frames).unwrap()
}

struct Harness {
    kernel: EngineKernel,
    test_shell: ChannelStream,
    test_control: ChannelStream,
    test_iopub: ChannelStream,
    session: MessageSession,
}

impl Harness {
    fn new() -> Self {
        Self::with_kernel(ScriptExecutor::new(), Vec::new())
    }

    fn with_kernel(executor: ScriptExecutor, exec_lines: Vec<String>) -> Self {
        let (kernel_shell, test_shell) = ChannelStream::pair();
        let (kernel_control, test_control) = ChannelStream::pair();
        let (kernel_iopub, test_iopub) = ChannelStream::pair();

        let mut kernel = EngineKernel::new(
            vec![Box::new(kernel_shell)],
            Box::new(kernel_control),
            Box::new(kernel_iopub),
            "engine-uuid-1",
            Box::new(executor),
            Box::new(NamespaceCompleter),
        )
        .with_exec_lines(exec_lines);
        kernel.set_int_id(0);

        Self {
            kernel,
            test_shell,
            test_control,
            test_iopub,
            session: MessageSession::default(),
        }
    }

    async fn dispatch(&mut self, msg: &Message) {
        let frames = self.session.pack(msg).unwrap();
        self.kernel.dispatch_queue(0, frames).await.unwrap();
    }

    async fn dispatch_control(&mut self, msg: &Message) {
        let frames = self.session.pack(msg).unwrap();
        self.kernel.dispatch_control(frames).await.unwrap();
    }

    async fn recv_shell(&mut self) -> Message {
        unpack(self.test_shell.recv().await.unwrap())
    }

    async fn recv_control(&mut self) -> Message {
        unpack(self.test_control.recv().await.unwrap())
    }

    async fn recv_iopub(&mut self) -> Message {
        unpack(self.test_iopub.recv().await.unwrap())
    }
}

#[tokio::test]
async fn s1_execute_ok() {
    let mut h = Harness::new();
    let req = request("execute_request", json!({"code": "x=2+3"}), vec![b"ident-a".to_vec()]);

    h.dispatch(&req).await;

    let pyin = h.recv_iopub().await;
    assert_eq!(pyin.header.msg_type, "pyin");
    assert_eq!(pyin.content, json!({"code": "x=2+3"}));

    let reply = h.recv_shell().await;
    assert_eq!(reply.header.msg_type, "execute_reply");
    assert_eq!(reply.parent_header, Some(req.header.clone()));
    assert_eq!(reply.identities, req.identities);
    assert_eq!(reply.content, json!({"status": "ok"}));
    assert!(reply.metadata.get("started").is_some());

    assert_eq!(h.kernel.user_ns().get("x"), Some(&Value::from(5)));
}

#[tokio::test]
async fn s2_execute_error_broadcasts_pyerr_and_aborts_pending_queue() {
    let mut h = Harness::new();

    let pending = request("execute_request", json!({"code": "y=1"}), vec![b"pending".to_vec()]);
    let pending_frames = h.session.pack(&pending).unwrap();
    h.test_shell.send(pending_frames).await.unwrap();

    let req = request(
        "execute_request",
        json!({"code": "raise ValueError('bad')"}),
        vec![b"ident-b".to_vec()],
    );
    h.dispatch(&req).await;

    let pyin = h.recv_iopub().await;
    assert_eq!(pyin.header.msg_type, "pyin");

    let pyerr = h.recv_iopub().await;
    assert_eq!(pyerr.header.msg_type, "pyerr");
    assert_eq!(pyerr.content["ename"], "ValueError");
    assert_eq!(pyerr.content["evalue"], "bad");

    let reply = h.recv_shell().await;
    assert_eq!(reply.header.msg_type, "execute_reply");
    assert_eq!(reply.content["status"], "error");
    assert_eq!(reply.content["ename"], "ValueError");

    let aborted_reply = h.recv_shell().await;
    assert_eq!(aborted_reply.header.msg_type, "execute_reply");
    assert_eq!(aborted_reply.content, json!({"status": "aborted"}));
    assert_eq!(aborted_reply.identities, vec![b"pending".to_vec()]);
}

#[tokio::test]
async fn s3_abort_by_id_skips_execution_other_message_runs_normally() {
    let mut h = Harness::new();

    let req_a = request("execute_request", json!({"code": "a=1"}), vec![b"id-a".to_vec()]);
    h.kernel.mark_aborted(req_a.header.msg_id.clone());
    h.dispatch(&req_a).await;

    let reply_a = h.recv_shell().await;
    assert_eq!(reply_a.header.msg_type, "execute_reply");
    assert_eq!(reply_a.content, json!({"status": "aborted"}));
    assert_eq!(reply_a.identities, vec![b"id-a".to_vec()]);

    let req_b = request("execute_request", json!({"code": "b=2"}), vec![b"id-b".to_vec()]);
    h.dispatch(&req_b).await;

    let pyin_b = h.recv_iopub().await;
    assert_eq!(pyin_b.content, json!({"code": "b=2"}));

    assert!(h.kernel.user_ns().get("a").is_none());
    assert_eq!(h.kernel.user_ns().get("b"), Some(&Value::from(2)));
}

#[tokio::test]
async fn s4_clear_resets_namespace_and_reruns_exec_lines() {
    let mut h = Harness::with_kernel(ScriptExecutor::new(), vec!["z=9".to_string()]);

    let req = request("execute_request", json!({"code": "x=2+3"}), vec![b"id-c".to_vec()]);
    h.dispatch(&req).await;
    let _pyin = h.recv_iopub().await;
    let _reply = h.recv_shell().await;
    assert_eq!(h.kernel.user_ns().get("x"), Some(&Value::from(5)));

    let clear_req = request("clear_request", json!({}), vec![b"id-d".to_vec()]);
    h.dispatch(&clear_req).await;

    let reply = h.recv_shell().await;
    assert_eq!(reply.header.msg_type, "clear_reply");
    assert_eq!(reply.content, json!({"status": "ok"}));

    assert!(h.kernel.user_ns().get("x").is_none());
    assert_eq!(h.kernel.user_ns().get("z"), Some(&Value::from(9)));
}

#[tokio::test]
async fn invariant_identities_and_parent_header_round_trip() {
    let mut h = Harness::new();
    let req = request(
        "complete_request",
        json!({"line": "", "text": ""}),
        vec![b"routing-id".to_vec()],
    );
    h.dispatch(&req).await;
    let reply = h.recv_shell().await;
    assert_eq!(reply.identities, req.identities);
    assert_eq!(reply.parent_header, Some(req.header));
}

#[tokio::test]
async fn invariant_apply_request_cleans_up_synthetic_names() {
    let mut executor = ScriptExecutor::new();
    executor.register(
        "identity",
        Arc::new(|args: &[Value], _kwargs: &HashMap<String, Value>| {
            Ok(args.first().cloned().unwrap_or(Value::Null))
        }),
    );
    let mut h = Harness::with_kernel(executor, Vec::new());

    let mut req = request("apply_request", json!({}), vec![b"id-e".to_vec()]);
    req.buffers = vec![serde_json::to_vec(&(
        Value::from("identity"),
        vec![Value::from(41)],
        HashMap::<String, Value>::new(),
    ))
    .unwrap()];

    h.dispatch(&req).await;
    let reply = h.recv_shell().await;
    assert_eq!(reply.header.msg_type, "apply_reply");
    assert_eq!(reply.metadata["status"], "ok");
    assert_eq!(reply.buffers.len(), 1);
    let result: Value = serde_json::from_slice(&reply.buffers[0]).unwrap();
    assert_eq!(result, Value::from(41));

    for name in h.kernel.user_ns().keys() {
        assert!(!name.starts_with('_'), "synthetic binding {name} leaked into user_ns");
    }
}

#[tokio::test]
async fn apply_request_with_unmet_dependency_reports_dependencies_not_met() {
    let mut executor = ScriptExecutor::new();
    executor.register(
        "needs_dep",
        Arc::new(|_args: &[Value], _kwargs: &HashMap<String, Value>| {
            Err(ExecError::new("UnmetDependency", "dependency not ready"))
        }),
    );
    let mut h = Harness::with_kernel(executor, Vec::new());

    let mut req = request("apply_request", json!({}), vec![b"id-f".to_vec()]);
    req.buffers = vec![serde_json::to_vec(&(
        Value::from("needs_dep"),
        Vec::<Value>::new(),
        HashMap::<String, Value>::new(),
    ))
    .unwrap()];

    h.dispatch(&req).await;
    let _pyerr = h.recv_iopub().await;
    let reply = h.recv_shell().await;
    assert_eq!(reply.metadata["dependencies_met"], false);
    assert_eq!(reply.metadata["status"], "error");
    assert!(reply.buffers.is_empty());
}

#[tokio::test]
async fn shutdown_request_replies_ok_echoing_request_content() {
    let mut h = Harness::new();
    let req = request("shutdown_request", json!({"restart": false}), vec![b"id-g".to_vec()]);

    // `shutdown_request` schedules `std::process::exit` after
    // `SHUTDOWN_GRACE` (1s); as long as this test doesn't await past that
    // window, the current-thread test runtime drops the spawned task
    // (and with it the pending exit) before it ever fires.
    h.dispatch_control(&req).await;

    let reply = h.recv_control().await;
    assert_eq!(reply.header.msg_type, "shutdown_reply");
    assert_eq!(reply.parent_header, Some(req.header));
    assert_eq!(reply.content, json!({"restart": false, "status": "ok"}));
}

#[tokio::test]
async fn abort_request_with_msg_ids_marks_ids_without_draining_queue() {
    let mut h = Harness::new();

    let pending = request("execute_request", json!({"code": "y=1"}), vec![b"pending".to_vec()]);
    let pending_frames = h.session.pack(&pending).unwrap();
    h.test_shell.send(pending_frames).await.unwrap();

    let req = request("abort_request", json!({"msg_ids": [pending.header.msg_id]}), vec![]);
    h.dispatch_control(&req).await;

    let reply = h.recv_control().await;
    assert_eq!(reply.header.msg_type, "abort_reply");
    assert_eq!(reply.content, json!({"status": "ok"}));

    assert!(h.kernel.abort_set().len() == 1);

    // The pending execute_request was never drained; it is still queued
    // and now gets skipped by the abort set when it is dispatched.
    h.dispatch(&pending).await;
    let aborted_reply = h.recv_shell().await;
    assert_eq!(aborted_reply.content, json!({"status": "aborted"}));
}

#[tokio::test]
async fn abort_request_without_msg_ids_drains_pending_shell_queue() {
    let mut h = Harness::new();

    let pending = request("execute_request", json!({"code": "y=1"}), vec![b"pending".to_vec()]);
    let pending_frames = h.session.pack(&pending).unwrap();
    h.test_shell.send(pending_frames).await.unwrap();

    let req = request("abort_request", json!({"msg_ids": []}), vec![]);
    h.dispatch_control(&req).await;

    let drained = h.recv_shell().await;
    assert_eq!(drained.header.msg_type, "execute_reply");
    assert_eq!(drained.content, json!({"status": "aborted"}));
    assert_eq!(drained.identities, vec![b"pending".to_vec()]);

    let reply = h.recv_control().await;
    assert_eq!(reply.header.msg_type, "abort_reply");
    assert!(h.kernel.abort_set().is_empty());
}

#[tokio::test]
async fn run_prioritizes_control_over_shell_on_simultaneous_readiness() {
    let mut h = Harness::new();

    // Queue a shell execute_request and a control abort_request (with no
    // msg_ids) before `run()` ever polls either stream, so both are ready
    // on the very first iteration.
    let shell_req = request("execute_request", json!({"code": "x=1"}), vec![b"id-race".to_vec()]);
    let shell_frames = h.session.pack(&shell_req).unwrap();
    h.test_shell.send(shell_frames).await.unwrap();

    let control_req = request("abort_request", json!({"msg_ids": []}), vec![]);
    let control_frames = h.session.pack(&control_req).unwrap();
    h.test_control.send(control_frames).await.unwrap();

    let Harness {
        mut kernel,
        mut test_shell,
        mut test_control,
        ..
    } = h;
    let handle = tokio::spawn(async move {
        let _ = kernel.run().await;
    });

    // If control loses the race, the execute_request runs normally and
    // produces a `pyin`/`execute_reply` pair instead of being drained by
    // `abort_queues`. If control wins, as biased priority demands, the
    // still-pending shell frame is drained and replied `aborted` before
    // it is ever executed.
    let drained = unpack(test_shell.recv().await.unwrap());
    assert_eq!(drained.header.msg_type, "execute_reply");
    assert_eq!(drained.content, json!({"status": "aborted"}));
    assert_eq!(drained.identities, vec![b"id-race".to_vec()]);

    let control_reply = unpack(test_control.recv().await.unwrap());
    assert_eq!(control_reply.header.msg_type, "abort_reply");

    handle.abort();
}
