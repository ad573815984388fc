// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Stream` abstraction (spec.md §2 "message-frame receive/send
//! abstraction over a non-blocking transport, with `on_recv`, `on_err`, and
//! `flush` operations").
//!
//! The original's callback-registration API (`on_recv`/`on_err`) collapses
//! here into a single async `recv()`: Rust's `Future` already models
//! "call me back when a frame is ready, or with an error", so a pull-style
//! method is the idiomatic rendition rather than a second callback-storage
//! mechanism layered on top of it. `EngineKernel`'s dispatch loop awaits
//! `recv()` on each of its streams concurrently via `tokio::select!`.

use async_trait::async_trait;

use crate::error::StreamError;

/// A multipart frame: an ordered sequence of opaque byte blobs
/// (spec.md §6 "Message envelope").
pub type Frames = Vec<Vec<u8>>;

#[async_trait]
pub trait Stream: Send {
    /// Send a multipart frame.
    async fn send(&mut self, frames: Frames) -> Result<(), StreamError>;

    /// Wait for the next multipart frame, or an error if the transport
    /// failed or was closed.
    async fn recv(&mut self) -> Result<Frames, StreamError>;

    /// Ensure any buffered output has been handed to the underlying
    /// transport.
    async fn flush(&mut self) -> Result<(), StreamError>;
}
