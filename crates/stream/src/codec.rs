// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The wire-serialization boundary this core consumes rather than defines
//! (spec.md §1 Non-goals). `JsonCodec` is the default implementation used
//! by tests and by `MessageSession`.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::StreamError;

pub trait Codec: Send + Sync {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, StreamError>;
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, StreamError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, StreamError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, StreamError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_codec_round_trips() {
        let codec = JsonCodec;
        let value = json!({"a": 1, "b": "two"});
        let bytes = codec.encode(&value).unwrap();
        let decoded: serde_json::Value = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, value);
    }
}
