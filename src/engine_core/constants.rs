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

//! mcp-guard Constants - Single source of truth for all configuration values.
//!
//! This module centralizes error codes, protocol method names, log labels
//! and configuration keys so every component agrees on them.

/// JSON-RPC 2.0 Error Codes
pub mod jsonrpc {
    /// Protocol version stamped on locally synthesized responses
    pub const VERSION: &str = "2.0";
    /// Generic server error, used for entities hidden by policy
    pub const ERROR_SERVER: i32 = -32000;
    /// Internal error (standard JSON-RPC)
    pub const ERROR_INTERNAL: i32 = -32603;
}

/// MCP Protocol Methods
pub mod methods {
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const PROMPTS_LIST: &str = "prompts/list";
    pub const PROMPTS_GET: &str = "prompts/get";
    pub const RESOURCES_LIST: &str = "resources/list";
    pub const RESOURCES_READ: &str = "resources/read";
    pub const RESOURCE_TEMPLATES_LIST: &str = "resources/templates/list";
    /// Prefix shared by all one-way notifications
    pub const NOTIFICATION_PREFIX: &str = "notifications/";
}

/// Labels written into the guard log
pub mod labels {
    pub const REQUEST: &str = "Request";
    pub const RESPONSE: &str = "Response";
    pub const ERROR: &str = "Error";
    pub const NOTIFICATION: &str = "Notification";
    pub const BLOCKED: &str = "Blocked";
    pub const FILTERED: &str = "Filtered";
    pub const SESSION: &str = "Session";
}

/// Configuration Environment Variables
pub mod config {
    pub const ENV_LOG_LEVEL: &str = "MCP_GUARD_LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "MCP_GUARD_LOG_FORMAT";
    pub const ENV_LOG_FILE: &str = "MCP_GUARD_LOG_FILE";
    pub const ENV_POLICY: &str = "MCP_GUARD_POLICY";
    /// Directory under the user's home that holds guard state
    pub const STATE_DIR_NAME: &str = ".mcp-guard";
    pub const LOG_DIR_NAME: &str = "logs";
    pub const LOG_FILE_NAME: &str = "guard.log";
}

/// Transport Limits (DoS Protection)
pub mod limits {
    /// Maximum allowed JSON-RPC message size (10 MB)
    pub const MAX_MESSAGE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
}
