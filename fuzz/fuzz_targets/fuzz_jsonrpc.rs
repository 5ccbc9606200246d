// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use libfuzzer_sys::fuzz_target;
use mcp_guard::engine::filter::ResponseFilter;
use mcp_guard::engine::gate::RequestGate;
use mcp_guard::engine::policy::Policy;
use mcp_guard::engine_core::models::{GuardedRequest, JsonRpcRequest, JsonRpcResponse};

fuzz_target!(|data: &[u8]| {
    // Arbitrary JSON must classify, gate and filter without panicking.
    if let Ok(request) = serde_json::from_slice::<JsonRpcRequest>(data) {
        let guarded = GuardedRequest::classify(&request);
        let _ = RequestGate::check(&Policy::allow_all(), &guarded);
    }

    let _ = serde_json::from_slice::<JsonRpcResponse>(data);

    if let Ok(mut value) = serde_json::from_slice::<serde_json::Value>(data) {
        for method in ["tools/list", "prompts/list", "resources/list", "resources/templates/list"] {
            let _ = ResponseFilter::apply(&Policy::allow_all(), method, &mut value);
        }
    }
});
