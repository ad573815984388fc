// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Launcher` abstract contract (spec.md §4.1).
//!
//! The source expresses launcher variants via deep subclassing; here each
//! variant is a distinct type implementing this trait, with the shared
//! bookkeeping (`{before,running,after}`, `stop_callbacks`) factored into
//! [`crate::lifecycle::LauncherCore`] rather than inherited.

use async_trait::async_trait;
use nix::sys::signal::Signal;
use pf_core::{LauncherError, LauncherState};

use crate::lifecycle::{StopCallback, StopData};

#[async_trait]
pub trait Launcher: Send {
    /// Transition `before -> running`. Fails with `ProcessStateError` if
    /// called outside `before`.
    async fn start(&mut self) -> Result<(), LauncherError>;

    /// Request termination; returns promptly without waiting for actual
    /// exit (actual exit is observed via `on_stop`). The default
    /// implementation is `interrupt_then_kill` with the variant's default
    /// delay.
    fn stop(&mut self);

    /// Send `sig` if `state() == Running`; a no-op otherwise.
    fn signal(&mut self, sig: Signal);

    /// Register a callback invoked exactly once, on the transition to
    /// `after` (or immediately, inline, if already `after`).
    fn on_stop(&mut self, cb: StopCallback);

    fn state(&self) -> LauncherState;

    fn stop_data(&self) -> Option<StopData>;

    /// Downcast support for tests that need to inspect a concrete variant
    /// behind a `Box<dyn Launcher>` (e.g. an `SSHLauncher`'s `location`).
    fn as_any(&self) -> &dyn std::any::Any;
}
