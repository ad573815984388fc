// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `EventLoop`: periodic callbacks, delayed callbacks, and line-readiness
//! notification for child-process pipes (spec.md §9 design note on
//! blocking vs async stdio).
//!
//! The original schedules a platform-specific reactor callback per
//! readable fd. Rust has no portable raw-fd readiness API across Unix
//! pipes and Windows named pipes either, so this core generalizes the
//! note to every platform: each watched reader gets its own spawned task
//! that posts line events back to the loop over an `mpsc` channel, and the
//! loop's `next_event()` is simply "await the channel" rather than a
//! poll/select over raw fds.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// An event posted back to the loop by a watched reader or a timer.
#[derive(Debug, Clone)]
pub enum LoopEvent {
    /// A line was read from a watched reader, identified by `tag`.
    Line { tag: String, line: String },
    /// A watched reader reached EOF.
    Eof { tag: String },
    /// A periodic or delayed callback's tick, identified by `tag`.
    Tick { tag: String },
}

/// A single-threaded event loop driving an engine or launcher process.
pub struct EventLoop {
    tx: mpsc::UnboundedSender<LoopEvent>,
    rx: mpsc::UnboundedReceiver<LoopEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            tasks: Vec::new(),
        }
    }

    /// Watch `reader` for newline-delimited output, tagging every line and
    /// the terminal EOF with `tag` (e.g. `"stdout"`/`"stderr"`).
    pub fn watch_reader<R>(&mut self, tag: impl Into<String>, reader: R)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let tag = tag.into();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(LoopEvent::Line { tag: tag.clone(), line }).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        let _ = tx.send(LoopEvent::Eof { tag: tag.clone() });
                        break;
                    }
                    Err(_) => {
                        let _ = tx.send(LoopEvent::Eof { tag: tag.clone() });
                        break;
                    }
                }
            }
        });
        self.tasks.push(handle);
    }

    /// Schedule a callback tagged `tag` to fire once after `delay`.
    pub fn spawn_delayed(&mut self, tag: impl Into<String>, delay: Duration) {
        let tag = tag.into();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(LoopEvent::Tick { tag });
        });
        self.tasks.push(handle);
    }

    /// Schedule a callback tagged `tag` to fire every `period`, forever
    /// (until the loop is dropped).
    pub fn spawn_periodic(&mut self, tag: impl Into<String>, period: Duration) {
        let tag = tag.into();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if tx.send(LoopEvent::Tick { tag: tag.clone() }).is_err() {
                    break;
                }
            }
        });
        self.tasks.push(handle);
    }

    /// Await the next event posted by any watched reader or timer.
    pub async fn next_event(&mut self) -> Option<LoopEvent> {
        self.rx.recv().await
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "event_loop_tests.rs"]
mod tests;
