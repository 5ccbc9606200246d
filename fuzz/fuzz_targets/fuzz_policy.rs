// Copyright 2026 BadCompany
// Licensed under the Apache License, Version 2.0

#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use mcp_guard::engine::gate::resource_name;
use mcp_guard::engine::policy::Policy;
use mcp_guard::engine_core::models::EntityType;
use std::collections::HashMap;

/// Structured input: arbitrary patterns (often malformed) and names.
#[derive(Debug, Arbitrary)]
struct FuzzPolicyInput {
    allow: Vec<String>,
    deny: Vec<String>,
    names: Vec<String>,
    uri: String,
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);
    let Ok(input) = FuzzPolicyInput::arbitrary(&mut unstructured) else {
        return;
    };

    let allow = HashMap::from([(EntityType::Tool, input.allow.clone())]);
    let deny = HashMap::from([(EntityType::Tool, input.deny.clone())]);
    let policy = Policy::new(&allow, &deny);

    for name in &input.names {
        let _ = policy.is_allowed(EntityType::Tool, name);
        // Tool rules never reach other entity types.
        assert!(policy.is_allowed(EntityType::Prompt, name));
    }

    let _ = policy.is_allowed(EntityType::Resource, resource_name(&input.uri));
});
