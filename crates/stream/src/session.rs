// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `MessageSession`: frames and unframes multipart messages with identity
//! prefixing (spec.md §2 `MessageSession`, §6 "Message envelope").
//!
//! Wire shape: `[...identities, delimiter, header_json, parent_header_json,
//! metadata_json, content_json, ...buffers]`.

use pf_core::message::{Header, Message};
use serde_json::Value;

use crate::codec::{Codec, JsonCodec};
use crate::error::StreamError;
use crate::transport::Frames;

/// The delimiter separating routing identities from the message body.
pub const DELIMITER: &[u8] = b"<IDS|MSG>";

pub struct MessageSession<C: Codec = JsonCodec> {
    codec: C,
}

impl Default for MessageSession<JsonCodec> {
    fn default() -> Self {
        Self { codec: JsonCodec }
    }
}

impl<C: Codec> MessageSession<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Frame a `Message` into wire frames, preserving its `identities`
    /// prefix verbatim (spec.md §8 invariant 3, identities round-trip).
    pub fn pack(&self, msg: &Message) -> Result<Frames, StreamError> {
        let mut frames: Frames = msg.identities.clone();
        frames.push(DELIMITER.to_vec());
        frames.push(self.codec.encode(&msg.header)?);
        frames.push(match &msg.parent_header {
            Some(h) => self.codec.encode(h)?,
            None => self.codec.encode(&Value::Object(Default::default()))?,
        });
        frames.push(self.codec.encode(&msg.metadata)?);
        frames.push(self.codec.encode(&msg.content)?);
        frames.extend(msg.buffers.iter().cloned());
        Ok(frames)
    }

    /// Unframe wire frames into a `Message`, splitting off the identity
    /// prefix at the delimiter.
    pub fn unpack(&self, frames: Frames) -> Result<Message, StreamError> {
        let delim_pos = frames
            .iter()
            .position(|f| f.as_slice() == DELIMITER)
            .ok_or_else(|| StreamError::Framing("missing <IDS|MSG> delimiter".into()))?;
        let identities = frames[..delim_pos].to_vec();
        let body = &frames[delim_pos + 1..];
        if body.len() < 4 {
            return Err(StreamError::Framing(format!(
                "expected at least 4 body frames, got {}",
                body.len()
            )));
        }

        let header: Header = self.codec.decode(&body[0])?;
        let parent_value: Value = self.codec.decode(&body[1])?;
        let parent_header = if parent_value.as_object().is_some_and(|o| o.is_empty()) {
            None
        } else {
            Some(self.codec.decode(&body[1])?)
        };
        let metadata: Value = self.codec.decode(&body[2])?;
        let content: Value = self.codec.decode(&body[3])?;
        let buffers = body[4..].to_vec();

        Ok(Message {
            header,
            parent_header,
            metadata,
            content,
            buffers,
            identities,
        })
    }
}
