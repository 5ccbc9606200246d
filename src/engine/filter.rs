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

//! Response filter for list methods.
//!
//! Rewrites `result.<entities>` in place, keeping only entries whose `name`
//! passes the policy. Entries without a string `name` are dropped as well.
//! Everything else in the envelope is left untouched.

use crate::engine::policy::Policy;
use crate::engine_core::models::{list_target, EntityType};
use serde_json::Value;

/// An entry removed from a list result.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedEntity {
    pub kind: EntityType,
    /// `None` when the entry had no usable name.
    pub name: Option<String>,
}

impl std::fmt::Display for DroppedEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} '{}' denied by policy", self.kind, name),
            None => write!(f, "{} entry without a name", self.kind),
        }
    }
}

pub struct ResponseFilter;

impl ResponseFilter {
    /// Filter `response` if `method` is a list method. Returns the dropped
    /// entries in their original order; non-list methods, error responses and
    /// results without the expected array are left as they are.
    pub fn apply(policy: &Policy, method: &str, response: &mut Value) -> Vec<DroppedEntity> {
        let Some((kind, field)) = list_target(method) else {
            return Vec::new();
        };
        let Some(entries) = response
            .get_mut("result")
            .and_then(|r| r.get_mut(field))
            .and_then(Value::as_array_mut)
        else {
            return Vec::new();
        };

        let mut dropped = Vec::new();
        entries.retain(|entry| match entry.get("name").and_then(Value::as_str) {
            Some(name) if policy.is_allowed(kind, name) => true,
            Some(name) => {
                dropped.push(DroppedEntity {
                    kind,
                    name: Some(name.to_string()),
                });
                false
            }
            None => {
                dropped.push(DroppedEntity { kind, name: None });
                false
            }
        });
        dropped
    }
}
