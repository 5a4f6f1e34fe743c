//! MCP Server — JSON-RPC 2.0, newline-delimited.
//!
//! Implements the Model Context Protocol (spec 2025-06-18) server over
//! stdin/stdout. Reads JSON-RPC requests from stdin (one per line),
//! dispatches to the tool router, and writes responses to stdout. The same
//! message handler backs the `POST /mcp` endpoint in HTTP mode.
//!
//! Protocol flow:
//! 1. Client sends `initialize` → server responds with capabilities
//! 2. Client sends `notifications/initialized`
//! 3. Client sends `tools/list` → server returns tool definitions
//! 4. Client sends `tools/call` → server runs the tool and returns result
//! 5. Client closes stdin → server exits

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::client::ClientRunner;
use crate::tools::ToolRouter;

/// Maximum size of a single JSON-RPC line (10 MiB).
const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

/// Name reported in `initialize`.
pub const SERVER_NAME: &str = "emacs-mcp";

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 types
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// MCP protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfo {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct ServerCapabilities {
    tools: ToolsCapability,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolsCapability {
    list_changed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    protocol_version: String,
    capabilities: ServerCapabilities,
    server_info: ServerInfo,
}

/// MCP tool definition for tools/list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolsListResult {
    tools: Vec<ToolDefinition>,
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// MCP content item in tools/call response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_owned(),
            text: text.into(),
        }
    }
}

/// MCP tools/call result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ContentItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

// ---------------------------------------------------------------------------
// Server main loop
// ---------------------------------------------------------------------------

/// Run the MCP server on stdin/stdout until stdin closes.
pub async fn run_mcp_server<C: ClientRunner>(router: &ToolRouter<C>) -> Result<()> {
    info!("emacs-mcp MCP server starting on stdio");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(router, stdin, stdout).await?;
    info!("emacs-mcp MCP server stopped");
    Ok(())
}

/// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`.
///
/// Requests are handled one at a time, in arrival order. Returns when the
/// reader reaches EOF.
pub async fn serve<C, R, W>(router: &ToolRouter<C>, mut reader: R, mut writer: W) -> Result<()>
where
    C: ClientRunner,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line_buf = Vec::new();

    loop {
        line_buf.clear();
        let bytes_read = match read_line_limited(&mut reader, &mut line_buf, MAX_LINE_BYTES).await
        {
            Ok(n) => n,
            Err(LineError::TooLong) => {
                warn!(max_bytes = MAX_LINE_BYTES, "request line too long");
                let resp = error_response(
                    None,
                    -32600,
                    &format!("invalid request: line exceeds {MAX_LINE_BYTES} bytes"),
                );
                write_response(&mut writer, &resp).await?;
                continue;
            }
            Err(LineError::Io(e)) => return Err(e).context("failed to read from stdin"),
        };

        // EOF: client closed stdin.
        if bytes_read == 0 {
            info!("stdin closed, shutting down");
            break;
        }

        let line = match std::str::from_utf8(&line_buf) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "request line is not valid UTF-8");
                let resp =
                    error_response(None, -32700, &format!("parse error: invalid UTF-8: {e}"));
                write_response(&mut writer, &resp).await?;
                continue;
            }
        };

        if let Some(resp) = handle_message(router, line).await {
            write_response(&mut writer, &resp).await?;
        }
    }

    Ok(())
}

/// Handle one raw JSON-RPC message. Returns `None` when no response is due.
pub async fn handle_message<C: ClientRunner>(
    router: &ToolRouter<C>,
    raw: &str,
) -> Option<JsonRpcResponse> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    debug!(raw = trimmed, "received request");

    let request: JsonRpcRequest = match serde_json::from_str(trimmed) {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "invalid JSON-RPC request");
            return Some(error_response(None, -32700, &format!("parse error: {e}")));
        }
    };

    if request.jsonrpc != "2.0" {
        warn!(
            version = request.jsonrpc,
            "invalid JSON-RPC version (expected \"2.0\")"
        );
        return Some(error_response(
            request.id.clone(),
            -32600,
            &format!(
                "invalid request: jsonrpc version must be \"2.0\", got \"{}\"",
                request.jsonrpc
            ),
        ));
    }

    let response = dispatch(router, &request).await;

    // Notifications MUST NOT receive a response.
    if request.id.is_none() {
        debug!(method = request.method, "notification handled (no response)");
        return None;
    }

    response
}

async fn dispatch<C: ClientRunner>(
    router: &ToolRouter<C>,
    req: &JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => Some(handle_initialize(req)),
        "notifications/initialized" => {
            info!("client initialized");
            None
        }
        "tools/list" => Some(handle_tools_list(router, req)),
        "tools/call" => Some(handle_tools_call(router, req).await),
        "ping" => Some(success_response(req.id.clone(), &serde_json::json!({}))),
        _ => {
            warn!(method = req.method, "unknown method");
            Some(error_response(
                req.id.clone(),
                -32601,
                &format!("method not found: {}", req.method),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn handle_initialize(req: &JsonRpcRequest) -> JsonRpcResponse {
    let result = InitializeResult {
        protocol_version: "2025-06-18".to_owned(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        },
    };

    success_response(req.id.clone(), &result)
}

fn handle_tools_list<C: ClientRunner>(
    router: &ToolRouter<C>,
    req: &JsonRpcRequest,
) -> JsonRpcResponse {
    let result = ToolsListResult {
        tools: router.list_tools(),
    };
    success_response(req.id.clone(), &result)
}

async fn handle_tools_call<C: ClientRunner>(
    router: &ToolRouter<C>,
    req: &JsonRpcRequest,
) -> JsonRpcResponse {
    let params: ToolCallParams = match serde_json::from_value(req.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return error_response(
                req.id.clone(),
                -32602,
                &format!("invalid tools/call params: {e}"),
            );
        }
    };

    match router.call_tool(&params.name, params.arguments).await {
        Ok(result) => success_response(req.id.clone(), &result),
        Err(e) => {
            error!(tool = params.name, error = %e, "tool call failed");
            let result = ToolCallResult {
                content: vec![ContentItem::text(format!("Error: {e}"))],
                metadata: Some(serde_json::json!({
                    "kind": e.kind(),
                    "stderr": e.stderr(),
                })),
                is_error: true,
            };
            success_response(req.id.clone(), &result)
        }
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn success_response(id: Option<serde_json::Value>, result: &impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(v) => JsonRpcResponse {
            jsonrpc: "2.0".to_owned(),
            id,
            result: Some(v),
            error: None,
        },
        Err(e) => {
            error!(error = %e, "failed to serialize success response");
            error_response(
                id,
                -32603,
                &format!("internal error: failed to serialize result: {e}"),
            )
        }
    }
}

fn error_response(id: Option<serde_json::Value>, code: i64, message: &str) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_owned(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_owned(),
            data: None,
        }),
    }
}

/// Write a JSON-RPC response as a single line.
async fn write_response(out: &mut (impl AsyncWrite + Unpin), resp: &JsonRpcResponse) -> Result<()> {
    let json = serde_json::to_string(resp).context("failed to serialize response")?;
    debug!(response = json, "sending response");
    out.write_all(json.as_bytes())
        .await
        .context("failed to write to stdout")?;
    out.write_all(b"\n")
        .await
        .context("failed to write newline to stdout")?;
    out.flush().await.context("failed to flush stdout")?;
    Ok(())
}

#[derive(Debug)]
enum LineError {
    TooLong,
    Io(std::io::Error),
}

impl From<std::io::Error> for LineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Read raw line bytes from `reader` into `buf`, stopping at newline or
/// `max_bytes`.
///
/// Returns the number of bytes read (0 = EOF). If the line exceeds
/// `max_bytes`, the rest of it is consumed and discarded. Decoding is left
/// to the caller so a character split across buffer refills stays intact.
async fn read_line_limited(
    reader: &mut (impl AsyncBufRead + Unpin),
    buf: &mut Vec<u8>,
    max_bytes: usize,
) -> Result<usize, LineError> {
    let mut total = 0usize;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(total);
        }
        let (consumed, found_newline) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };
        if total + consumed > max_bytes {
            reader.consume(consumed);
            if !found_newline {
                loop {
                    let rest = reader.fill_buf().await?;
                    if rest.is_empty() {
                        break;
                    }
                    if let Some(pos) = rest.iter().position(|&b| b == b'\n') {
                        reader.consume(pos + 1);
                        break;
                    }
                    let eat = rest.len();
                    reader.consume(eat);
                }
            }
            return Err(LineError::TooLong);
        }
        buf.extend_from_slice(&available[..consumed]);
        total += consumed;
        reader.consume(consumed);
        if found_newline {
            return Ok(total);
        }
    }
}
