// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! JSON-RPC transport over byte streams.
//!
//! `MessageReader` pulls whole JSON values off an `AsyncRead`, and
//! `MessageWriter` pushes them onto an `AsyncWrite`, flushing after every
//! message. Both are tagged with the `Side` they face so I/O and decode
//! failures map onto the right `GuardError` variant.

use bytes::BytesMut;
use futures_util::SinkExt;
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio_util::codec::{Decoder, FramedWrite};
use tracing::debug;

use crate::engine_core::errors::{GuardError, Side};
use crate::mcp::codec::McpCodec;

const READ_CHUNK: usize = 8 * 1024;

fn io_error(side: Side, e: std::io::Error) -> GuardError {
    match side {
        Side::Client => GuardError::Io(e),
        Side::Child => GuardError::ChildUnavailable(e.to_string()),
    }
}

fn codec_error(side: Side, e: anyhow::Error) -> GuardError {
    match e.downcast::<std::io::Error>() {
        Ok(io) => io_error(side, io),
        Err(other) => GuardError::ProtocolDecode {
            side,
            reason: other.to_string(),
        },
    }
}

pub struct MessageReader<R> {
    inner: R,
    codec: McpCodec,
    buf: BytesMut,
    eof: bool,
    side: Side,
}

impl<R: AsyncRead + Unpin> MessageReader<R> {
    pub fn new(inner: R, side: Side) -> Self {
        Self {
            inner,
            codec: McpCodec::new(),
            buf: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
            side,
        }
    }

    /// Next JSON value, or `None` on a clean end of stream.
    pub async fn read_message(&mut self) -> Result<Option<Value>, GuardError> {
        loop {
            if self.eof {
                return self
                    .codec
                    .decode_eof(&mut self.buf)
                    .map_err(|e| codec_error(self.side, e));
            }
            if let Some(val) = self
                .codec
                .decode(&mut self.buf)
                .map_err(|e| codec_error(self.side, e))?
            {
                debug!("Received from {}: {}", self.side, val);
                return Ok(Some(val));
            }

            self.buf.reserve(READ_CHUNK);
            let n = self
                .inner
                .read_buf(&mut self.buf)
                .await
                .map_err(|e| io_error(self.side, e))?;
            if n == 0 {
                self.eof = true;
            }
        }
    }
}

pub struct MessageWriter<W> {
    framed: FramedWrite<W, McpCodec>,
    side: Side,
}

impl<W: AsyncWrite + Unpin> MessageWriter<W> {
    pub fn new(inner: W, side: Side) -> Self {
        Self {
            framed: FramedWrite::new(inner, McpCodec::new()),
            side,
        }
    }

    /// Write one message as a single line and flush.
    pub async fn write_message<T: Serialize>(&mut self, message: &T) -> Result<(), GuardError> {
        let side = self.side;
        self.framed
            .send(message)
            .await
            .map_err(|e| codec_error(side, e))?;
        debug!("Sent message to {}", side);
        Ok(())
    }
}
