// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed `content` payloads for the `msg_type`s the kernel handles
//! (spec.md §6 "Message envelope"). Replies are assembled with `serde_json`'s
//! `json!` macro directly at the call site rather than through dedicated
//! reply structs, since their shape varies by status; requests are typed so
//! malformed input is rejected by `serde_json::from_value` up front.

use serde::Deserialize;

use crate::error::ExecError;

#[derive(Debug, Deserialize)]
pub struct ExecuteRequestContent {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequestContent {
    pub line: String,
    pub text: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct AbortRequestContent {
    #[serde(default)]
    pub msg_ids: Vec<String>,
}

/// The structured exception body broadcast on `pyerr` and returned as
/// reply content on failure (spec.md §7).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExceptionContent {
    pub ename: String,
    pub evalue: String,
    pub traceback: Vec<String>,
    pub engine_uuid: String,
    pub engine_id: i64,
    pub method: String,
}

impl ExceptionContent {
    pub fn from_exec_error(
        err: &ExecError,
        engine_uuid: &str,
        engine_id: i64,
        method: &str,
    ) -> Self {
        Self {
            ename: err.ename.clone(),
            evalue: err.evalue.clone(),
            traceback: vec![err.evalue.clone()],
            engine_uuid: engine_uuid.to_string(),
            engine_id,
            method: method.to_string(),
        }
    }
}
