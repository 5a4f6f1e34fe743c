//! `open_magit` tool: Show `magit-status` for a repository.

use serde::Deserialize;

use crate::actions;
use crate::client::{ClientRunner, Executor};
use crate::error::BridgeResult;
use crate::server::{ContentItem, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
pub struct OpenMagitParams {
    /// Repository directory (default: current directory).
    #[serde(default)]
    pub repo_path: Option<String>,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "open_magit".to_owned(),
        description: "Opens Magit to show Git changes".to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "repo_path": {
                    "type": "string",
                    "description": "Path to the Git repository (defaults to current directory)"
                }
            }
        }),
    }
}

pub async fn execute<R: ClientRunner>(
    executor: &Executor<R>,
    arguments: serde_json::Value,
) -> BridgeResult<ToolCallResult> {
    let params: OpenMagitParams = super::parse_arguments("open_magit", arguments)?;
    let outcome = actions::open_magit(executor, params.repo_path.as_deref()).await?;

    Ok(ToolCallResult {
        content: vec![ContentItem::text(outcome.message)],
        metadata: Some(serde_json::json!({ "result": outcome.result })),
        is_error: false,
    })
}
