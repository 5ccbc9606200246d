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

//! Guard proxy session.
//!
//! - `GuardSession`: the request loop. Reads one client message, gates it,
//!   forwards it, reads exactly one child reply, filters it and relays it.
//!   At most one request is outstanding to the child; replies are correlated
//!   by position, not by `id`.
//! - `McpGuard`: binds a session to a spawned child and the process's own
//!   stdin/stdout, and owns the child's lifecycle.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::engine::filter::ResponseFilter;
use crate::engine::gate::RequestGate;
use crate::engine::policy::Policy;
use crate::engine_core::audit::AuditLogger;
use crate::engine_core::constants::{jsonrpc, labels};
use crate::engine_core::errors::{GuardError, Side};
use crate::engine_core::models::{GuardedRequest, JsonRpcRequest, JsonRpcResponse};
use crate::mcp::process::ProcessSupervisor;
use crate::mcp::transport::{MessageReader, MessageWriter};

/// How a session ended when it ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Client closed its stream with no request outstanding.
    ClientDisconnected,
}

pub struct GuardSession {
    session_id: Uuid,
    policy: Policy,
    audit: AuditLogger,
    /// `id` of the most recent client request; echoed on synthesized errors.
    last_id: Option<Value>,
}

impl GuardSession {
    pub fn new(policy: Policy, audit: AuditLogger) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            policy,
            audit,
            last_id: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn last_request_id(&self) -> Option<&Value> {
        self.last_id.as_ref()
    }

    pub fn audit_mut(&mut self) -> &mut AuditLogger {
        &mut self.audit
    }

    /// Drive the session until the client disconnects or a fatal error occurs.
    pub async fn run<CR, CW, PR, PW>(
        &mut self,
        client_in: CR,
        client_out: CW,
        child_out: PR,
        child_in: PW,
    ) -> Result<SessionOutcome, GuardError>
    where
        CR: AsyncRead + Unpin,
        CW: AsyncWrite + Unpin,
        PR: AsyncRead + Unpin,
        PW: AsyncWrite + Unpin,
    {
        let mut client_reader = MessageReader::new(client_in, Side::Client);
        let mut client_writer = MessageWriter::new(client_out, Side::Client);
        let mut child_reader = MessageReader::new(child_out, Side::Child);
        let mut child_writer = MessageWriter::new(child_in, Side::Child);

        info!("Guard session {} started", self.session_id);

        loop {
            // AwaitingRequest
            let raw = match client_reader.read_message().await {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    info!("Client disconnected. Shutting down.");
                    self.audit.log(labels::SESSION, "client disconnected");
                    return Ok(SessionOutcome::ClientDisconnected);
                }
                Err(e) => return Err(self.fail(e)),
            };

            let request: JsonRpcRequest = match serde_json::from_value(raw.clone()) {
                Ok(req) => req,
                Err(e) => {
                    return Err(self.fail(GuardError::ProtocolDecode {
                        side: Side::Client,
                        reason: format!("not a JSON-RPC request: {}", e),
                    }))
                }
            };

            self.last_id = request.id.clone();
            self.audit.log_json(labels::REQUEST, &raw);

            let guarded = GuardedRequest::classify(&request);
            if guarded == GuardedRequest::Notification {
                debug!("Consumed notification '{}'", request.method);
                self.audit.log(labels::NOTIFICATION, &request.method);
                continue;
            }

            if let Err(violation) = RequestGate::check(&self.policy, &guarded) {
                warn!("Blocked request '{}': {}", request.method, violation);
                self.audit.log(labels::BLOCKED, &violation.to_string());
                let reply = JsonRpcResponse::error(
                    self.reply_id(),
                    jsonrpc::ERROR_SERVER,
                    violation.to_string(),
                );
                self.respond(&mut client_writer, &reply).await?;
                continue;
            }

            // Forwarding
            if let Err(e) = child_writer.write_message(&raw).await {
                return Err(self.fail(e));
            }

            // AwaitingChildResponse
            let mut response = match child_reader.read_message().await {
                Ok(Some(response)) => response,
                Ok(None) => {
                    return Err(self.fail(GuardError::ChildUnavailable(format!(
                        "child closed its output while '{}' was outstanding",
                        request.method
                    ))))
                }
                Err(e) if !e.is_fatal() => {
                    self.record(&e);
                    let reply = JsonRpcResponse::error(
                        self.reply_id(),
                        jsonrpc::ERROR_INTERNAL,
                        format!("error decoding response from server: {}", e),
                    );
                    self.respond(&mut client_writer, &reply).await?;
                    continue;
                }
                Err(e) => return Err(self.fail(e)),
            };

            if let Some(reply_id) = response.get("id") {
                if request.id.as_ref() != Some(reply_id) {
                    warn!(
                        "Child reply id {} does not match request id {:?}; relaying by position",
                        reply_id, request.id
                    );
                }
            }

            // Responding
            for dropped in ResponseFilter::apply(&self.policy, &request.method, &mut response) {
                debug!("Filtered from '{}': {}", request.method, dropped);
                self.audit.log(labels::FILTERED, &dropped.to_string());
            }

            self.respond(&mut client_writer, &response).await?;
        }
    }

    fn reply_id(&self) -> Value {
        self.last_id.clone().unwrap_or(Value::Null)
    }

    /// Write a reply to the client and record it.
    async fn respond<W, T>(
        &mut self,
        writer: &mut MessageWriter<W>,
        reply: &T,
    ) -> Result<(), GuardError>
    where
        W: AsyncWrite + Unpin,
        T: serde::Serialize,
    {
        if let Err(e) = writer.write_message(reply).await {
            return Err(self.fail(e));
        }
        self.audit.log_json(labels::RESPONSE, reply);
        Ok(())
    }

    fn record(&mut self, err: &GuardError) {
        if err.is_fatal() {
            error!("{}", err);
        } else {
            warn!("{}", err);
        }
        self.audit.log(labels::ERROR, &err.to_string());
    }

    fn fail(&mut self, err: GuardError) -> GuardError {
        self.record(&err);
        err
    }
}

/// A guard bound to a child command and this process's stdio.
pub struct McpGuard {
    argv: Vec<String>,
    session: GuardSession,
}

impl McpGuard {
    pub fn new(argv: Vec<String>, policy: Policy, audit: AuditLogger) -> Self {
        Self {
            argv,
            session: GuardSession::new(policy, audit),
        }
    }

    /// Spawn the child and proxy stdin/stdout through it until the session ends.
    pub async fn run(mut self) -> Result<SessionOutcome, GuardError> {
        info!("Upstream: {:?}", self.argv);
        let started = format!(
            "started {} command={:?}",
            self.session.session_id(),
            self.argv
        );
        self.session.audit_mut().log(labels::SESSION, &started);

        let (mut supervisor, child_in, child_out) = match ProcessSupervisor::spawn(&self.argv) {
            Ok(spawned) => spawned,
            Err(e) => return Err(self.session.fail(e)),
        };

        let outcome = self
            .session
            .run(tokio::io::stdin(), tokio::io::stdout(), child_out, child_in)
            .await;

        if let Err(GuardError::ChildUnavailable(_)) = &outcome {
            if let Some(status) = supervisor.try_exit_status() {
                self.session
                    .audit_mut()
                    .log(labels::SESSION, &format!("child exited with {}", status));
            }
        }

        supervisor.close().await;
        outcome
    }
}
