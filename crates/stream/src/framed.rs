// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A length-prefixed multipart `Stream` over any `AsyncRead + AsyncWrite`
//! pair: the real controller↔engine transport.
//!
//! Wire format per frame set: `u32` frame count, then for each frame a
//! `u32` big-endian length prefix followed by the frame bytes. This
//! generalizes the daemon's single-frame length-prefixed JSON framing to
//! multipart frames with an identity-prefix list, since this core must
//! support ZeroMQ-ROUTER-style routing that a 1:1 protocol does not need.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::StreamError;
use crate::transport::{Frames, Stream};

/// Maximum size of a single frame (200 MiB, matching the daemon's transport
/// limit).
pub const MAX_FRAME_SIZE: usize = 200 * 1024 * 1024;

/// Maximum number of frames in one multipart message.
pub const MAX_FRAME_COUNT: u32 = 4096;

pub struct FramedStream<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> FramedStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

#[async_trait]
impl<R, W> Stream for FramedStream<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frames: Frames) -> Result<(), StreamError> {
        if frames.len() as u64 > MAX_FRAME_COUNT as u64 {
            return Err(StreamError::Framing(format!(
                "too many frames: {} (max {})",
                frames.len(),
                MAX_FRAME_COUNT
            )));
        }
        self.writer
            .write_all(&(frames.len() as u32).to_be_bytes())
            .await?;
        for frame in &frames {
            if frame.len() > MAX_FRAME_SIZE {
                return Err(StreamError::TooLarge {
                    size: frame.len(),
                    max: MAX_FRAME_SIZE,
                });
            }
            self.writer
                .write_all(&(frame.len() as u32).to_be_bytes())
                .await?;
            self.writer.write_all(frame).await?;
        }
        self.writer.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Frames, StreamError> {
        let mut count_buf = [0u8; 4];
        match self.reader.read_exact(&mut count_buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Err(StreamError::Closed)
            }
            Err(e) => return Err(e.into()),
        }
        let count = u32::from_be_bytes(count_buf);
        if count > MAX_FRAME_COUNT {
            return Err(StreamError::Framing(format!(
                "too many frames: {} (max {})",
                count, MAX_FRAME_COUNT
            )));
        }

        let mut frames = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut len_buf = [0u8; 4];
            self.reader.read_exact(&mut len_buf).await?;
            let len = u32::from_be_bytes(len_buf) as usize;
            if len > MAX_FRAME_SIZE {
                return Err(StreamError::TooLarge {
                    size: len,
                    max: MAX_FRAME_SIZE,
                });
            }
            let mut buf = vec![0u8; len];
            self.reader.read_exact(&mut buf).await?;
            frames.push(buf);
        }
        Ok(frames)
    }

    async fn flush(&mut self) -> Result<(), StreamError> {
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn round_trips_a_multipart_frame() {
        let (client, server) = duplex(4096);
        let (client_r, client_w) = tokio::io::split(client);
        let (server_r, server_w) = tokio::io::split(server);
        let mut a = FramedStream::new(client_r, client_w);
        let mut b = FramedStream::new(server_r, server_w);

        let frames = vec![b"identity".to_vec(), b"<IDS|MSG>".to_vec(), b"{}".to_vec()];
        a.send(frames.clone()).await.unwrap();
        let received = b.recv().await.unwrap();
        assert_eq!(received, frames);
    }

    #[tokio::test]
    async fn recv_reports_closed_on_eof() {
        let (client, server) = duplex(4096);
        drop(client);
        let (server_r, server_w) = tokio::io::split(server);
        let mut b = FramedStream::new(server_r, server_w);
        assert!(matches!(b.recv().await, Err(StreamError::Closed)));
    }

    #[tokio::test]
    async fn rejects_frames_over_the_size_limit() {
        let (client, server) = duplex(8);
        let (client_r, client_w) = tokio::io::split(client);
        let (_server_r, server_w) = tokio::io::split(server);
        let mut a = FramedStream::new(client_r, client_w);
        drop(server_w);
        let oversized = vec![vec![0u8; MAX_FRAME_SIZE + 1]];
        let err = a.send(oversized).await.unwrap_err();
        assert!(matches!(err, StreamError::TooLarge { .. }));
    }
}
