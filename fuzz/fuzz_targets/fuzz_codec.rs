// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use mcp_guard::mcp::codec::McpCodec;
use tokio_util::codec::Decoder;

fuzz_target!(|data: &[u8]| {
    // No byte sequence may panic the decoder, and every call must make
    // progress or stop.
    let mut codec = McpCodec::new();
    let mut buffer = BytesMut::from(data);

    loop {
        let before = buffer.len();
        match codec.decode(&mut buffer) {
            Ok(Some(_)) | Err(_) => assert!(buffer.len() < before || buffer.is_empty()),
            Ok(None) => break,
        }
    }
    let _ = codec.decode_eof(&mut buffer);
});
