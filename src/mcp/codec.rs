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

//! MCP Transport Codec.
//!
//! Handles the low-level framing of JSON-RPC messages on stdio.
//! Incoming bytes are a stream of back-to-back JSON values; newlines are
//! accepted but not required between them. Outgoing messages are written as
//! one compact JSON value per line.
//!
//! A malformed value costs exactly one error: the decoder drops the rest of
//! the offending line, including any part of it that has not arrived yet.

use crate::engine_core::constants::limits;
use anyhow::{anyhow, Result};
use bytes::{Buf, BytesMut};
use serde::Serialize;
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

/// Progress through an object or array whose end has not been seen yet.
#[derive(Debug, Default)]
struct ContainerScan {
    offset: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl ContainerScan {
    /// Resume over `buf[self.offset..]`. True once the container opened at
    /// `buf[0]` is closed.
    fn advance(&mut self, buf: &[u8]) -> bool {
        while let Some(&b) = buf.get(self.offset) {
            self.offset += 1;
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                }
                continue;
            }
            match b {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }
}

#[derive(Debug, Default)]
pub struct McpCodec {
    scan: ContainerScan,
    /// Parse error of a line whose newline has not arrived yet.
    skipping_line: Option<String>,
}

impl McpCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.scan = ContainerScan::default();
    }

    fn check_limit(&mut self, src: &mut BytesMut) -> Result<()> {
        if src.len() as u64 > limits::MAX_MESSAGE_SIZE_BYTES {
            src.clear();
            self.reset();
            return Err(anyhow!(
                "Message exceeded size limit of {} bytes",
                limits::MAX_MESSAGE_SIZE_BYTES
            ));
        }
        Ok(())
    }

    /// Drop the rest of the current line. Returns false when its newline is
    /// still to come; the remainder is then dropped as it arrives.
    fn discard_line(&mut self, src: &mut BytesMut) -> bool {
        self.reset();
        match src.iter().position(|b| *b == b'\n') {
            Some(i) => {
                src.advance(i + 1);
                true
            }
            None => {
                src.clear();
                false
            }
        }
    }
}

impl Decoder for McpCodec {
    type Item = Value;
    type Error = anyhow::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        trace!("Decoder attempting to read from {} bytes buffer", src.len());

        if let Some(reason) = self.skipping_line.take() {
            if !self.discard_line(src) {
                self.skipping_line = Some(reason);
                return Ok(None);
            }
            return Err(anyhow!("Invalid JSON: {}", reason));
        }

        if self.scan.offset == 0 {
            let Some(start) = src.iter().position(|b| !b.is_ascii_whitespace()) else {
                src.clear();
                return Ok(None);
            };
            src.advance(start);
        }

        // Only re-parse an unfinished container once it closes or a new line
        // arrives; the latter surfaces garbage that never closes.
        let scanned = self.scan.offset;
        if matches!(src.first(), Some(b'{' | b'['))
            && !self.scan.advance(src)
            && !src[scanned..].contains(&b'\n')
        {
            self.check_limit(src)?;
            return Ok(None);
        }

        let mut stream = serde_json::Deserializer::from_slice(src).into_iter::<Value>();
        match stream.next() {
            Some(Ok(val)) => {
                let consumed = stream.byte_offset();
                src.advance(consumed);
                self.reset();
                trace!("Decoded message: {:?}", val);
                Ok(Some(val))
            }
            Some(Err(e)) if e.is_eof() => {
                self.check_limit(src)?;
                Ok(None)
            }
            Some(Err(e)) => {
                if self.discard_line(src) {
                    Err(anyhow!("Invalid JSON: {}", e))
                } else {
                    self.skipping_line = Some(e.to_string());
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(val) = self.decode(src)? {
            return Ok(Some(val));
        }
        if let Some(reason) = self.skipping_line.take() {
            src.clear();
            return Err(anyhow!("Invalid JSON: {}", reason));
        }
        if src.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let pending = src.len();
        src.clear();
        self.reset();
        Err(anyhow!(
            "Stream ended inside a message ({} bytes pending)",
            pending
        ))
    }
}

impl<'a, T: Serialize> Encoder<&'a T> for McpCodec {
    type Error = anyhow::Error;

    fn encode(&mut self, item: &'a T, dst: &mut BytesMut) -> Result<()> {
        let body = serde_json::to_vec(item)?;
        dst.reserve(body.len() + 1);
        dst.extend_from_slice(&body);
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}
