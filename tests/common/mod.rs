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

// Shared harness: a guard session wired to an in-memory client and a scripted child.
#![allow(dead_code)]

use mcp_guard::config::PolicyConfig;
use mcp_guard::engine::policy::Policy;
use mcp_guard::engine_core::audit::AuditLogger;
use mcp_guard::engine_core::errors::{GuardError, Side};
use mcp_guard::mcp::server::{GuardSession, SessionOutcome};
use mcp_guard::mcp::transport::MessageReader;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{duplex, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

const PIPE_CAPACITY: usize = 64 * 1024;

/// What the scripted child does with one forwarded request.
pub enum ChildReply {
    Json(Value),
    Raw(String),
    /// Separate writes with a pause between them, so the guard sees each
    /// piece in its own read.
    Chunks(Vec<String>),
    /// Close stdout without answering.
    Hangup,
}

pub fn policy(allow: &[&str], deny: &[&str]) -> Policy {
    let mut cfg = PolicyConfig::default();
    for rule in allow {
        cfg.add_allow(rule).unwrap();
    }
    for rule in deny {
        cfg.add_deny(rule).unwrap();
    }
    cfg.build().unwrap()
}

pub struct Harness {
    client: DuplexStream,
    replies: MessageReader<DuplexStream>,
    child_seen: Arc<Mutex<Vec<Value>>>,
    session: JoinHandle<(GuardSession, Result<SessionOutcome, GuardError>)>,
    log_path: PathBuf,
    _dir: TempDir,
}

impl Harness {
    pub fn start<F>(policy: Policy, responder: F) -> Self
    where
        F: FnMut(&Value) -> ChildReply + Send + 'static,
    {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("logs").join("guard.log");
        let audit = AuditLogger::open(&log_path).unwrap();
        let mut session = GuardSession::new(policy, audit);

        let (client, guard_in) = duplex(PIPE_CAPACITY);
        let (guard_out, client_replies) = duplex(PIPE_CAPACITY);
        let (guard_to_child, child_in) = duplex(PIPE_CAPACITY);
        let (child_out, guard_from_child) = duplex(PIPE_CAPACITY);

        let child_seen = Arc::new(Mutex::new(Vec::new()));
        let seen = child_seen.clone();
        let mut responder = responder;
        tokio::spawn(async move {
            let mut requests = MessageReader::new(child_in, Side::Child);
            let mut out = child_out;
            while let Ok(Some(request)) = requests.read_message().await {
                seen.lock().unwrap().push(request.clone());
                let writes = match responder(&request) {
                    ChildReply::Json(v) => vec![format!("{}\n", v)],
                    ChildReply::Raw(s) => vec![s],
                    ChildReply::Chunks(chunks) => chunks,
                    ChildReply::Hangup => break,
                };
                for (i, piece) in writes.iter().enumerate() {
                    if i > 0 {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                    }
                    if out.write_all(piece.as_bytes()).await.is_err() {
                        return;
                    }
                }
            }
        });

        let handle = tokio::spawn(async move {
            let outcome = session
                .run(guard_in, guard_out, guard_from_child, guard_to_child)
                .await;
            (session, outcome)
        });

        Self {
            client,
            replies: MessageReader::new(client_replies, Side::Client),
            child_seen,
            session: handle,
            log_path,
            _dir: dir,
        }
    }

    pub async fn send(&mut self, message: Value) {
        self.send_raw(&format!("{}\n", message)).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.client.write_all(text.as_bytes()).await.unwrap();
    }

    /// Next message relayed to the client.
    pub async fn recv(&mut self) -> Value {
        self.replies
            .read_message()
            .await
            .unwrap()
            .expect("guard closed the client stream")
    }

    pub fn child_seen(&self) -> Vec<Value> {
        self.child_seen.lock().unwrap().clone()
    }

    pub fn log(&self) -> String {
        std::fs::read_to_string(&self.log_path).unwrap_or_default()
    }

    /// Close the client side and wait for the session to end.
    pub async fn finish(self) -> (GuardSession, Result<SessionOutcome, GuardError>, String) {
        let Harness {
            client,
            session,
            log_path,
            _dir,
            ..
        } = self;
        drop(client);
        let (session, outcome) = session.await.unwrap();
        let log = std::fs::read_to_string(&log_path).unwrap_or_default();
        (session, outcome, log)
    }
}
