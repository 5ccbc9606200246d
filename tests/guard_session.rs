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

mod common;

use common::{policy, ChildReply, Harness};
use mcp_guard::engine::policy::Policy;
use mcp_guard::engine_core::errors::{GuardError, Side};
use mcp_guard::mcp::server::SessionOutcome;
use serde_json::{json, Value};

fn result_for(request: &Value, result: Value) -> ChildReply {
    ChildReply::Json(json!({"jsonrpc": "2.0", "id": request["id"].clone(), "result": result}))
}

/// Answers each list method with two entities and echoes everything else.
fn catalog_server(request: &Value) -> ChildReply {
    match request["method"].as_str().unwrap_or_default() {
        "tools/list" => result_for(
            request,
            json!({"tools": [
                {"name": "read_file", "description": "Read a file"},
                {"name": "write_file", "description": "Write a file"}
            ]}),
        ),
        "prompts/list" => result_for(
            request,
            json!({"prompts": [{"name": "summarize"}, {"name": "internal_debug"}]}),
        ),
        "resources/list" => result_for(
            request,
            json!({"resources": [
                {"uri": "fs://project/readme.md", "name": "readme.md"},
                {"uri": "fs://project/secret.env", "name": "secret.env"}
            ]}),
        ),
        _ => result_for(request, json!({"echo": request.clone()})),
    }
}

fn count(log: &str, needle: &str) -> usize {
    log.lines().filter(|l| l.contains(needle)).count()
}

#[tokio::test]
async fn test_list_response_filtered_by_allow_list() {
    let mut h = Harness::start(policy(&["tool:read_*"], &[]), catalog_server);

    h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await;
    let reply = h.recv().await;

    assert_eq!(reply["id"], 1);
    let tools = reply["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "read_file");
    assert_eq!(tools[0]["description"], "Read a file");

    let (_, outcome, log) = h.finish().await;
    assert_eq!(outcome.unwrap(), SessionOutcome::ClientDisconnected);
    assert_eq!(count(&log, "] Filtered: tool 'write_file' denied by policy"), 1);
}

#[tokio::test]
async fn test_denied_tool_call_never_reaches_child() {
    let mut h = Harness::start(policy(&[], &["tool:delete_*"]), catalog_server);

    h.send(json!({
        "jsonrpc": "2.0", "id": 7, "method": "tools/call",
        "params": {"name": "delete_all", "arguments": {}}
    }))
    .await;
    let blocked = h.recv().await;
    assert_eq!(blocked["id"], 7);
    assert_eq!(blocked["error"]["code"], -32000);
    assert_eq!(blocked["error"]["message"], "tool not found: delete_all");
    assert!(blocked.get("result").is_none());

    // Session keeps serving after a block.
    h.send(json!({"jsonrpc": "2.0", "id": 8, "method": "tools/list"}))
        .await;
    let listed = h.recv().await;
    assert_eq!(listed["id"], 8);

    let seen = h.child_seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["method"], "tools/list");

    let (_, outcome, log) = h.finish().await;
    assert!(outcome.is_ok());
    assert_eq!(count(&log, "] Blocked: tool not found: delete_all"), 1);
}

#[tokio::test]
async fn test_denied_resource_read_uses_last_uri_segment() {
    let mut h = Harness::start(policy(&[], &["resource:secret.*"]), catalog_server);

    h.send(json!({
        "jsonrpc": "2.0", "id": "r1", "method": "resources/read",
        "params": {"uri": "fs://project/secret.env"}
    }))
    .await;
    let blocked = h.recv().await;
    assert_eq!(blocked["id"], "r1");
    assert_eq!(blocked["error"]["code"], -32000);
    assert_eq!(blocked["error"]["message"], "resource not found: secret.env");

    h.send(json!({
        "jsonrpc": "2.0", "id": "r2", "method": "resources/read",
        "params": {"uri": "fs://project/readme.md"}
    }))
    .await;
    let allowed = h.recv().await;
    assert_eq!(allowed["id"], "r2");
    assert!(allowed.get("error").is_none());

    let seen = h.child_seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["params"]["uri"], "fs://project/readme.md");
    h.finish().await.1.unwrap();
}

#[tokio::test]
async fn test_denied_prompt_get_blocked() {
    let mut h = Harness::start(policy(&["prompt:*"], &["prompt:internal_*"]), catalog_server);

    h.send(json!({
        "jsonrpc": "2.0", "id": 3, "method": "prompts/get",
        "params": {"name": "internal_debug"}
    }))
    .await;
    let blocked = h.recv().await;
    assert_eq!(blocked["error"]["message"], "prompt not found: internal_debug");

    h.send(json!({"jsonrpc": "2.0", "id": 4, "method": "prompts/list"}))
        .await;
    let listed = h.recv().await;
    let names: Vec<&str> = listed["result"]["prompts"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec!["summarize"]);
    assert!(h.child_seen().iter().all(|r| r["method"] != "prompts/get"));
    h.finish().await.1.unwrap();
}

#[tokio::test]
async fn test_resource_list_filtered_by_name() {
    let mut h = Harness::start(policy(&[], &["resource:secret.*"]), catalog_server);

    h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}))
        .await;
    let reply = h.recv().await;
    let resources = reply["result"]["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["uri"], "fs://project/readme.md");
    h.finish().await.1.unwrap();
}

#[tokio::test]
async fn test_client_disconnect_is_clean() {
    let h = Harness::start(Policy::allow_all(), catalog_server);

    let (session, outcome, log) = h.finish().await;
    assert_eq!(outcome.unwrap(), SessionOutcome::ClientDisconnected);
    assert!(session.last_request_id().is_none());
    assert_eq!(count(&log, "client disconnected"), 1);
    assert_eq!(count(&log, "] Error:"), 0);
}

#[tokio::test]
async fn test_child_exit_mid_request_is_fatal() {
    let mut h = Harness::start(Policy::allow_all(), |_: &Value| ChildReply::Hangup);

    h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await;

    let (session, outcome, log) = h.finish().await;
    assert!(matches!(outcome, Err(GuardError::ChildUnavailable(_))));
    assert_eq!(session.last_request_id(), Some(&json!(1)));
    assert_eq!(count(&log, "] Error:"), 1);
    assert_eq!(count(&log, "] Response:"), 0);
}

#[tokio::test]
async fn test_notifications_are_consumed() {
    let mut h = Harness::start(Policy::allow_all(), catalog_server);

    h.send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;
    h.send(json!({"jsonrpc": "2.0", "method": "notifications/cancelled", "params": {"requestId": 1}}))
        .await;
    h.send(json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}))
        .await;

    // First thing back is the ping reply; nothing was produced for the notifications.
    let reply = h.recv().await;
    assert_eq!(reply["id"], 2);

    let seen = h.child_seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["method"], "ping");

    let (_, _, log) = h.finish().await;
    assert_eq!(count(&log, "] Notification: notifications/initialized"), 1);
    assert_eq!(count(&log, "] Notification: notifications/cancelled"), 1);
}

#[tokio::test]
async fn test_unguarded_traffic_passes_through_unchanged() {
    let mut h = Harness::start(policy(&["tool:read_*"], &["tool:*"]), catalog_server);

    let request = json!({
        "jsonrpc": "2.0", "id": 11, "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {"roots": {"listChanged": true}},
            "clientInfo": {"name": "test-runner", "version": "1.0"}
        }
    });
    h.send(request.clone()).await;
    let reply = h.recv().await;

    assert_eq!(h.child_seen(), vec![request.clone()]);
    assert_eq!(
        reply,
        json!({"jsonrpc": "2.0", "id": 11, "result": {"echo": request}})
    );
    h.finish().await.1.unwrap();
}

#[tokio::test]
async fn test_child_error_response_relayed_verbatim() {
    let failure = json!({
        "jsonrpc": "2.0", "id": 5,
        "error": {"code": -32601, "message": "Method not found", "data": {"method": "tools/list"}}
    });
    let canned = failure.clone();
    let mut h = Harness::start(policy(&["tool:read_*"], &[]), move |_: &Value| {
        ChildReply::Json(canned.clone())
    });

    h.send(json!({"jsonrpc": "2.0", "id": 5, "method": "tools/list"}))
        .await;
    assert_eq!(h.recv().await, failure);
    h.finish().await.1.unwrap();
}

#[tokio::test]
async fn test_malformed_child_output_reported_and_session_continues() {
    let mut calls = 0;
    let mut h = Harness::start(Policy::allow_all(), move |request: &Value| {
        calls += 1;
        if calls == 1 {
            ChildReply::Raw("this is not json\n".to_string())
        } else {
            catalog_server(request)
        }
    });

    h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await;
    let broken = h.recv().await;
    assert_eq!(broken["id"], 1);
    assert_eq!(broken["error"]["code"], -32603);
    assert!(broken["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("error decoding response from server"));

    h.send(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
        .await;
    let recovered = h.recv().await;
    assert_eq!(recovered["id"], 2);
    assert_eq!(recovered["result"]["tools"].as_array().unwrap().len(), 2);

    let (_, outcome, log) = h.finish().await;
    assert!(outcome.is_ok());
    assert_eq!(count(&log, "] Error:"), 1);
}

#[tokio::test]
async fn test_garbage_line_split_across_writes_keeps_replies_aligned() {
    let mut calls = 0;
    let mut h = Harness::start(Policy::allow_all(), move |request: &Value| {
        calls += 1;
        if calls == 1 {
            ChildReply::Chunks(vec!["garb".to_string(), "age log line\n".to_string()])
        } else {
            result_for(request, json!({}))
        }
    });

    h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
        .await;
    let broken = h.recv().await;
    assert_eq!(broken["id"], 1);
    assert_eq!(broken["error"]["code"], -32603);

    for id in 2..=3 {
        h.send(json!({"jsonrpc": "2.0", "id": id, "method": "ping"}))
            .await;
        let reply = h.recv().await;
        assert_eq!(reply["id"], id);
        assert!(reply.get("error").is_none(), "reply {} was {}", id, reply);
    }

    let (_, outcome, log) = h.finish().await;
    assert!(outcome.is_ok());
    assert_eq!(count(&log, "] Error:"), 1);
}

#[tokio::test]
async fn test_malformed_client_input_is_fatal() {
    let mut h = Harness::start(Policy::allow_all(), catalog_server);

    h.send_raw("{\"jsonrpc\": \"2.0\", \"id\": 1,,}\n").await;

    let (_, outcome, _) = h.finish().await;
    match outcome {
        Err(GuardError::ProtocolDecode { side, .. }) => assert_eq!(side, Side::Client),
        other => panic!("expected client decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_value_without_method_is_fatal() {
    let mut h = Harness::start(Policy::allow_all(), catalog_server);

    h.send(json!({"jsonrpc": "2.0", "id": 1})).await;

    let (_, outcome, _) = h.finish().await;
    assert!(matches!(
        outcome,
        Err(GuardError::ProtocolDecode {
            side: Side::Client,
            ..
        })
    ));
}

#[tokio::test]
async fn test_back_to_back_messages_without_separators() {
    let mut h = Harness::start(Policy::allow_all(), catalog_server);

    h.send_raw(concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
        r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#
    ))
    .await;

    assert_eq!(h.recv().await["id"], 1);
    assert_eq!(h.recv().await["id"], 2);
    assert_eq!(h.child_seen().len(), 2);
    h.finish().await.1.unwrap();
}

#[tokio::test]
async fn test_mismatched_reply_id_relayed_by_position() {
    let mut h = Harness::start(Policy::allow_all(), |_: &Value| {
        ChildReply::Json(json!({"jsonrpc": "2.0", "id": 999, "result": {}}))
    });

    h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
        .await;
    assert_eq!(h.recv().await["id"], 999);
    h.finish().await.1.unwrap();
}

#[tokio::test]
async fn test_guard_log_records_traffic_in_order() {
    let mut h = Harness::start(policy(&["tool:read_*"], &[]), catalog_server);

    h.send(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await;
    h.recv().await;

    let (_, _, log) = h.finish().await;
    let labels: Vec<&str> = log
        .lines()
        .filter_map(|l| l.split_once("] ").map(|(_, rest)| rest))
        .filter_map(|rest| rest.split_once(':').map(|(label, _)| label))
        .collect();
    assert_eq!(labels, vec!["Request", "Filtered", "Response", "Session"]);
    assert!(log.lines().all(|l| l.starts_with('[')));
}
