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

//! Request gate: call/read/get requests are checked before they reach the child.

use crate::engine::policy::Policy;
use crate::engine_core::errors::GuardError;
use crate::engine_core::models::{EntityType, GuardedRequest};

/// Bare resource name: everything after the last `:` or `/`.
pub fn resource_name(uri: &str) -> &str {
    match uri.rfind([':', '/']) {
        Some(idx) => &uri[idx + 1..],
        None => uri,
    }
}

pub struct RequestGate;

impl RequestGate {
    /// `Ok(())` to forward, `Err(PolicyViolation)` to answer locally.
    pub fn check(policy: &Policy, request: &GuardedRequest) -> Result<(), GuardError> {
        let (kind, name) = match request {
            GuardedRequest::ToolCall { name } => (EntityType::Tool, name.as_str()),
            GuardedRequest::ResourceRead { uri } => (EntityType::Resource, resource_name(uri)),
            GuardedRequest::PromptGet { name } => (EntityType::Prompt, name.as_str()),
            GuardedRequest::Notification | GuardedRequest::Opaque => return Ok(()),
        };

        if policy.is_allowed(kind, name) {
            Ok(())
        } else {
            Err(GuardError::PolicyViolation {
                kind,
                name: name.to_string(),
            })
        }
    }
}
