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

//! Domain models for the guard proxy.
//!
//! This module contains pure data structures representing entity kinds,
//! JSON-RPC envelopes and classified requests. It is free of I/O side effects.

use crate::engine_core::constants::{jsonrpc, methods};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Kind of entity an MCP server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Tool,
    Prompt,
    Resource,
}

impl EntityType {
    pub const ALL: [EntityType; 3] = [EntityType::Tool, EntityType::Prompt, EntityType::Resource];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Tool => "tool",
            EntityType::Prompt => "prompt",
            EntityType::Resource => "resource",
        }
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tool" | "tools" => Ok(EntityType::Tool),
            "prompt" | "prompts" => Ok(EntityType::Prompt),
            "resource" | "resources" => Ok(EntityType::Resource),
            other => Err(format!("unknown entity type '{}'", other)),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

fn default_version() -> String {
    jsonrpc::VERSION.to_string()
}

impl JsonRpcRequest {
    /// String field from `params`, empty when absent or not a string.
    pub fn param_str(&self, key: &str) -> &str {
        self.params
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Value,
}

impl JsonRpcResponse {
    /// Locally synthesized error reply.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: jsonrpc::VERSION.to_string(),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
            id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A client request, classified by `method` into the shapes the guard inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardedRequest {
    /// `tools/call`
    ToolCall { name: String },
    /// `resources/read`
    ResourceRead { uri: String },
    /// `prompts/get`
    PromptGet { name: String },
    /// One-way message under `notifications/`
    Notification,
    /// Anything else; relayed without inspection
    Opaque,
}

impl GuardedRequest {
    pub fn classify(req: &JsonRpcRequest) -> Self {
        match req.method.as_str() {
            methods::TOOLS_CALL => GuardedRequest::ToolCall {
                name: req.param_str("name").to_string(),
            },
            methods::RESOURCES_READ => GuardedRequest::ResourceRead {
                uri: req.param_str("uri").to_string(),
            },
            methods::PROMPTS_GET => GuardedRequest::PromptGet {
                name: req.param_str("name").to_string(),
            },
            m if m.starts_with(methods::NOTIFICATION_PREFIX) => GuardedRequest::Notification,
            _ => GuardedRequest::Opaque,
        }
    }
}

/// List methods and the result field holding their entity array.
pub fn list_target(method: &str) -> Option<(EntityType, &'static str)> {
    match method {
        methods::TOOLS_LIST => Some((EntityType::Tool, "tools")),
        methods::PROMPTS_LIST => Some((EntityType::Prompt, "prompts")),
        methods::RESOURCES_LIST => Some((EntityType::Resource, "resources")),
        methods::RESOURCE_TEMPLATES_LIST => Some((EntityType::Resource, "resourceTemplates")),
        _ => None,
    }
}
