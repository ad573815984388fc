// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-process `Stream` backed by `tokio::sync::mpsc`, used by tests and
//! single-process wiring (e.g. the kernel's iopub broadcast fan-out to an
//! in-process test subscriber).

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::StreamError;
use crate::transport::{Frames, Stream};

/// One half of an in-process duplex channel pair.
pub struct ChannelStream {
    tx: mpsc::UnboundedSender<Frames>,
    rx: mpsc::UnboundedReceiver<Frames>,
}

impl ChannelStream {
    /// Build a connected pair: frames sent on one end arrive as `recv()` on
    /// the other.
    pub fn pair() -> (ChannelStream, ChannelStream) {
        let (tx_a, rx_b) = mpsc::unbounded_channel();
        let (tx_b, rx_a) = mpsc::unbounded_channel();
        (
            ChannelStream { tx: tx_a, rx: rx_a },
            ChannelStream { tx: tx_b, rx: rx_b },
        )
    }
}

#[async_trait]
impl Stream for ChannelStream {
    async fn send(&mut self, frames: Frames) -> Result<(), StreamError> {
        self.tx.send(frames).map_err(|_| StreamError::Closed)
    }

    async fn recv(&mut self) -> Result<Frames, StreamError> {
        self.rx.recv().await.ok_or(StreamError::Closed)
    }

    async fn flush(&mut self) -> Result<(), StreamError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pair_delivers_frames_in_order() {
        let (mut a, mut b) = ChannelStream::pair();
        a.send(vec![b"one".to_vec()]).await.unwrap();
        a.send(vec![b"two".to_vec()]).await.unwrap();
        assert_eq!(b.recv().await.unwrap(), vec![b"one".to_vec()]);
        assert_eq!(b.recv().await.unwrap(), vec![b"two".to_vec()]);
    }

    #[tokio::test]
    async fn recv_errors_with_closed_after_drop() {
        let (a, mut b) = ChannelStream::pair();
        drop(a);
        assert!(matches!(b.recv().await, Err(StreamError::Closed)));
    }

    #[tokio::test]
    async fn is_bidirectional() {
        let (mut a, mut b) = ChannelStream::pair();
        b.send(vec![b"reply".to_vec()]).await.unwrap();
        assert_eq!(a.recv().await.unwrap(), vec![b"reply".to_vec()]);
    }
}
