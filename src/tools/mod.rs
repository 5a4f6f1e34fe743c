//! Tool router — registers and dispatches MCP tool calls.
//!
//! Each tool takes JSON arguments and returns a [`ToolCallResult`]. The
//! router owns the shared [`Executor`] and provides `list_tools()` /
//! `call_tool()` for the MCP server.

pub mod check_server;
pub mod list_tools;
pub mod open_in_buffer;
pub mod open_magit;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::{ClientRunner, Executor, ProcessRunner};
use crate::error::{BridgeError, BridgeResult};
use crate::server::{ContentItem, ToolCallResult, ToolDefinition};

/// Tool router that dispatches MCP tool calls to implementations.
#[derive(Debug, Clone)]
pub struct ToolRouter<R = ProcessRunner> {
    executor: Executor<R>,
}

impl<R: ClientRunner> ToolRouter<R> {
    pub const fn new(executor: Executor<R>) -> Self {
        Self { executor }
    }

    pub const fn executor(&self) -> &Executor<R> {
        &self.executor
    }

    /// List all available tools with their JSON Schema definitions.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        definitions()
    }

    /// Call a tool by name with the given JSON arguments.
    ///
    /// Unknown tools yield an `is_error` result rather than an `Err`.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> BridgeResult<ToolCallResult> {
        debug!(tool = name, "dispatching tool call");

        match name {
            "open_in_buffer" => open_in_buffer::execute(&self.executor, arguments).await,
            "open_magit" => open_magit::execute(&self.executor, arguments).await,
            "check_server" => Ok(check_server::execute(&self.executor).await),
            "list_tools" => Ok(list_tools::execute()),
            _ => Ok(ToolCallResult {
                content: vec![ContentItem::text(format!("Unknown tool: {name}"))],
                metadata: None,
                is_error: true,
            }),
        }
    }
}

fn definitions() -> Vec<ToolDefinition> {
    vec![
        open_in_buffer::tool_definition(),
        open_magit::tool_definition(),
        check_server::tool_definition(),
        list_tools::tool_definition(),
    ]
}

/// Parse tool arguments; a missing/`null` arguments object counts as `{}`.
fn parse_arguments<T: DeserializeOwned>(
    tool: &str,
    arguments: serde_json::Value,
) -> BridgeResult<T> {
    let arguments = if arguments.is_null() {
        serde_json::json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| BridgeError::InvalidArguments(format!("{tool}: {e}")))
}
