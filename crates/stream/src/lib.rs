// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pf-stream: the non-blocking multipart transport substrate (`Stream`,
//! `Codec`, `MessageSession`) the launcher/kernel crates build on.

pub mod channel;
pub mod codec;
pub mod error;
pub mod framed;
pub mod session;
pub mod transport;

pub use codec::{Codec, JsonCodec};
pub use error::StreamError;
pub use session::MessageSession;
pub use transport::{Frames, Stream};
