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

//! mcp-guard: a policy-enforcing MCP stdio proxy.
//!
//! This library sits between an MCP client and a tool-server child process,
//! hiding tools, prompts and resources that the configured allow/deny glob
//! patterns do not permit, and forwarding everything else unchanged.

pub mod config;
pub mod engine;
pub mod engine_core;
pub mod mcp;
pub mod utils;
