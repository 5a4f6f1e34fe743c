//! `open_in_buffer` tool: Visit a file in a new Emacs buffer.

use serde::Deserialize;

use crate::actions;
use crate::client::{ClientRunner, Executor};
use crate::error::BridgeResult;
use crate::server::{ContentItem, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
pub struct OpenInBufferParams {
    /// Path to the file to open; relative paths resolve against the cwd.
    pub file_path: String,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "open_in_buffer".to_owned(),
        description: "Opens the specified file in a new buffer in Emacs".to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "Absolute path to the file to open in Emacs"
                }
            },
            "required": ["file_path"]
        }),
    }
}

pub async fn execute<R: ClientRunner>(
    executor: &Executor<R>,
    arguments: serde_json::Value,
) -> BridgeResult<ToolCallResult> {
    let params: OpenInBufferParams = super::parse_arguments("open_in_buffer", arguments)?;
    let outcome = actions::open_in_buffer(executor, Some(&params.file_path)).await?;

    Ok(ToolCallResult {
        content: vec![ContentItem::text(outcome.message)],
        metadata: Some(serde_json::json!({ "result": outcome.result })),
        is_error: false,
    })
}
