//! MCP protocol integration tests.
//!
//! Drives the JSON-RPC server over in-memory pipes, backed by a fake
//! `emacsclient` shell script so the whole stack down to the subprocess
//! is exercised.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use emacs_mcp::Executor;
use emacs_mcp::config::ClientConfig;
use emacs_mcp::tools::ToolRouter;
use serde_json::{Value, json};

/// Write an executable fake client that logs each script and answers the probe.
fn fake_client(dir: &Path, running: bool) -> PathBuf {
    let log = dir.join("calls.log");
    let body = if running {
        format!(
            "#!/bin/sh\nprintf '%s\\n' \"$2\" >> '{}'\nif [ \"$2\" = '(+ 1 2)' ]; then echo 3; else echo nil; fi\n",
            log.display()
        )
    } else {
        format!(
            "#!/bin/sh\nprintf '%s\\n' \"$2\" >> '{}'\necho \"emacsclient: can't find socket\" >&2\nexit 1\n",
            log.display()
        )
    };
    let path = dir.join("emacsclient");
    std::fs::write(&path, body).expect("write fake client");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

fn calls(dir: &Path) -> Vec<String> {
    std::fs::read_to_string(dir.join("calls.log"))
        .unwrap_or_default()
        .lines()
        .map(str::to_owned)
        .collect()
}

fn router(client: &Path) -> ToolRouter {
    ToolRouter::new(Executor::new(ClientConfig {
        client: client.to_string_lossy().into_owned(),
        ..ClientConfig::default()
    }))
}

/// Feed `requests` (one per line) through the server and parse every response line.
async fn roundtrip(router: &ToolRouter, requests: &[Value]) -> Vec<Value> {
    let input: String = requests
        .iter()
        .map(|r| format!("{r}\n"))
        .collect();
    let mut output = Vec::new();
    emacs_mcp::server::serve(router, input.as_bytes(), &mut output)
        .await
        .expect("serve");
    String::from_utf8(output)
        .expect("utf8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("response json"))
        .collect()
}

#[test]
fn test_json_rpc_request_parsing() {
    let req_json = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": { "name": "test-client", "version": "0.1.0" }
        }
    });

    let req: emacs_mcp::server::JsonRpcRequest =
        serde_json::from_value(req_json).expect("should parse initialize request");

    assert_eq!(req.method, "initialize");
    assert_eq!(req.id, Some(json!(1)));
}

#[test]
fn test_json_rpc_error_response() {
    let resp = emacs_mcp::server::JsonRpcResponse {
        jsonrpc: "2.0".to_owned(),
        id: Some(json!(2)),
        result: None,
        error: Some(emacs_mcp::server::JsonRpcError {
            code: -32601,
            message: "method not found".to_owned(),
            data: None,
        }),
    };

    let json_str = serde_json::to_string(&resp).expect("should serialize");
    assert!(json_str.contains("-32601"));
    assert!(!json_str.contains("result"));
}

#[tokio::test]
async fn test_initialize_and_list_tools() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router(&fake_client(dir.path(), true));

    let responses = roundtrip(
        &router,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        ],
    )
    .await;

    // The notification gets no response.
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["result"]["serverInfo"]["name"], "emacs-mcp");
    assert_eq!(responses[0]["result"]["protocolVersion"], "2025-06-18");

    let tools = responses[1]["result"]["tools"].as_array().expect("tools");
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names, ["open_in_buffer", "open_magit", "check_server", "list_tools"]);
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["file_path"]));

    // Listing never touches emacsclient.
    assert!(calls(dir.path()).is_empty());
}

#[tokio::test]
async fn test_open_in_buffer_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router(&fake_client(dir.path(), true));

    let responses = roundtrip(
        &router,
        &[json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": { "name": "open_in_buffer", "arguments": { "file_path": "/tmp/x.txt" } }
        })],
    )
    .await;

    let result = &responses[0]["result"];
    assert_eq!(result["content"][0]["text"], "File opened in Emacs: /tmp/x.txt");
    assert_eq!(result["metadata"]["result"], "nil");
    assert!(result.get("isError").is_none());

    assert_eq!(calls(dir.path()), ["(+ 1 2)", "(find-file \"/tmp/x.txt\")"]);
}

#[tokio::test]
async fn test_tool_call_with_server_down_is_error_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router(&fake_client(dir.path(), false));

    let responses = roundtrip(
        &router,
        &[
            json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": { "name": "open_magit", "arguments": {} }
            }),
            json!({
                "jsonrpc": "2.0",
                "id": 5,
                "method": "tools/call",
                "params": { "name": "check_server" }
            }),
        ],
    )
    .await;

    let failed = &responses[0]["result"];
    assert_eq!(failed["isError"], true);
    let text = failed["content"][0]["text"].as_str().expect("text");
    assert!(text.contains("Failed to open Magit in Emacs"));
    assert!(text.contains("not running"));
    assert_eq!(failed["metadata"]["kind"], "server_unavailable");

    let check = &responses[1]["result"];
    assert_eq!(check["metadata"]["status"], "error");

    // Only probes ran; the magit script was never sent.
    assert_eq!(calls(dir.path()), ["(+ 1 2)", "(+ 1 2)"]);
}

#[tokio::test]
async fn test_protocol_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let router = router(&fake_client(dir.path(), true));

    let input = concat!(
        "not json\n",
        "{\"jsonrpc\":\"1.0\",\"id\":1,\"method\":\"ping\"}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"nope\"}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"tools/call\",\"params\":{}}\n",
        "\n",
        "{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"ping\"}\n",
    );
    let mut output = Vec::new();
    emacs_mcp::server::serve(&router, input.as_bytes(), &mut output)
        .await
        .expect("serve");

    let responses: Vec<Value> = String::from_utf8(output)
        .expect("utf8")
        .lines()
        .map(|l| serde_json::from_str(l).expect("json"))
        .collect();

    let codes: Vec<Value> = responses
        .iter()
        .take(4)
        .map(|r| r["error"]["code"].clone())
        .collect();
    assert_eq!(codes, [json!(-32700), json!(-32600), json!(-32601), json!(-32602)]);
    assert_eq!(responses[4]["id"], 4);
    assert_eq!(responses[4]["result"], json!({}));
}
