// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The message envelope and abort bookkeeping shared by every stream and
//! kernel component (spec.md §3 `Message`, `AbortSet`).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::UuidIdGen;
use crate::timestamp::now_iso8601;
use crate::IdGen;

/// A message header: identifies who sent what, and when (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub msg_id: String,
    pub msg_type: String,
    #[serde(default)]
    pub session: String,
    pub date: String,
}

impl Header {
    /// Build a fresh header for a new outgoing message, stamping `date` with
    /// the current time and generating a new `msg_id`.
    pub fn new(msg_type: impl Into<String>, session: impl Into<String>) -> Self {
        Self {
            msg_id: UuidIdGen.next(),
            msg_type: msg_type.into(),
            session: session.into(),
            date: now_iso8601(),
        }
    }
}

/// A decoded request/reply envelope (spec.md §3 `Message`, §6 "Message
/// envelope").
///
/// Invariants upheld by callers that build replies (spec.md §8 invariants
/// 3-4): a reply's `parent_header` equals the request's `header`; a reply's
/// `msg_id` is fresh; a reply's `identities` equal the request's
/// `identities`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub header: Header,
    pub parent_header: Option<Header>,
    #[serde(default)]
    pub metadata: Value,
    pub content: Value,
    #[serde(default)]
    pub buffers: Vec<Vec<u8>>,
    #[serde(skip)]
    pub identities: Vec<Vec<u8>>,
}

impl Message {
    /// Build a reply to `self`: fresh header of `reply_type`, `parent_header`
    /// set to this message's header, identities copied through unchanged.
    pub fn reply(&self, reply_type: impl Into<String>, content: Value) -> Message {
        Message {
            header: Header::new(reply_type, self.header.session.clone()),
            parent_header: Some(self.header.clone()),
            metadata: Value::Object(Default::default()),
            content,
            buffers: Vec::new(),
            identities: self.identities.clone(),
        }
    }
}

/// A set of message ids that must not be executed (spec.md §3 `AbortSet`,
/// §8 invariant 5 "Abort wins").
///
/// On encountering a message whose id is a member, the kernel replies
/// `status: "aborted"` and removes the id — abort is one-shot, not sticky.
#[derive(Debug, Clone, Default)]
pub struct AbortSet {
    ids: HashSet<String>,
}

impl AbortSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a message id for refusal.
    pub fn insert(&mut self, msg_id: impl Into<String>) {
        self.ids.insert(msg_id.into());
    }

    /// Check whether `msg_id` is marked, removing it if present. Returns
    /// `true` exactly once per inserted id.
    pub fn take(&mut self, msg_id: &str) -> bool {
        self.ids.remove(msg_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
