// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the transport, codec, and session layers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("framing error: {0}")]
    Framing(String),

    #[error("message too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("stream closed")]
    Closed,

    #[error("timeout")]
    Timeout,
}
