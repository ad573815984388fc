// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Cursor;

#[tokio::test]
async fn watch_reader_emits_lines_then_eof() {
    let mut loop_ = EventLoop::new();
    loop_.watch_reader("stdout", Cursor::new(b"one\ntwo\n".to_vec()));

    let mut lines = Vec::new();
    loop {
        match loop_.next_event().await.unwrap() {
            LoopEvent::Line { line, .. } => lines.push(line),
            LoopEvent::Eof { .. } => break,
            LoopEvent::Tick { .. } => unreachable!(),
        }
    }
    assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
}

#[tokio::test]
async fn spawn_delayed_fires_once() {
    let mut loop_ = EventLoop::new();
    loop_.spawn_delayed("kill", Duration::from_millis(10));
    match loop_.next_event().await.unwrap() {
        LoopEvent::Tick { tag } => assert_eq!(tag, "kill"),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn spawn_periodic_fires_repeatedly() {
    let mut loop_ = EventLoop::new();
    loop_.spawn_periodic("poll", Duration::from_millis(5));
    for _ in 0..3 {
        match loop_.next_event().await.unwrap() {
            LoopEvent::Tick { tag } => assert_eq!(tag, "poll"),
            _ => unreachable!(),
        }
    }
}
