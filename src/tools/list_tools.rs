//! `list_tools` tool: Self-description of the registered tools.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::server::{ContentItem, ToolCallResult, ToolDefinition};

#[derive(Debug, Serialize)]
struct ToolInfo {
    name: String,
    description: String,
    /// Parameter name → description.
    parameters: Map<String, Value>,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_tools".to_owned(),
        description: "Lists all available tools in this MCP server".to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub fn execute() -> ToolCallResult {
    let tools: Vec<ToolInfo> = super::definitions().into_iter().map(tool_info).collect();

    ToolCallResult {
        content: vec![ContentItem::text("Available tools in emacs-mcp:")],
        metadata: Some(serde_json::json!({ "tools": tools })),
        is_error: false,
    }
}

fn tool_info(def: ToolDefinition) -> ToolInfo {
    let parameters = def
        .input_schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, schema)| {
                    let description = schema.get("description").cloned().unwrap_or(Value::Null);
                    (name.clone(), description)
                })
                .collect()
        })
        .unwrap_or_default();

    ToolInfo {
        name: def.name,
        description: def.description,
        parameters,
    }
}
