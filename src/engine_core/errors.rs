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

// Domain error types - no information about hidden entities leaks to the client

use crate::engine_core::models::EntityType;
use thiserror::Error;

/// Which end of the proxy produced a malformed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Child,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Client => write!(f, "client"),
            Side::Child => write!(f, "child"),
        }
    }
}

/// Main error type for the guard proxy
#[derive(Error, Debug)]
pub enum GuardError {
    /// Entity hidden by allow/deny rules. Rendered as "not found" on the wire.
    #[error("{kind} not found: {name}")]
    PolicyViolation { kind: EntityType, name: String },

    /// Malformed message on one of the two byte streams
    #[error("failed to decode {side} message: {reason}")]
    ProtocolDecode { side: Side, reason: String },

    /// Spawn/pipe failure, or the child went away with a request outstanding
    #[error("child process unavailable: {0}")]
    ChildUnavailable(String),

    /// Bad policy or configuration input
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O Error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GuardError {
    /// Whether the error ends the session instead of a single request.
    pub fn is_fatal(&self) -> bool {
        match self {
            GuardError::PolicyViolation { .. } => false,
            GuardError::ProtocolDecode { side, .. } => *side == Side::Client,
            GuardError::ChildUnavailable(_) | GuardError::Config(_) | GuardError::Io(_) => true,
        }
    }
}
