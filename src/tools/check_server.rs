//! `check_server` tool: Report whether the Emacs server is reachable.

use crate::client::{ClientRunner, Executor};
use crate::error::SERVER_NOT_RUNNING;
use crate::server::{ContentItem, ToolCallResult, ToolDefinition};

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "check_server".to_owned(),
        description: "Checks if the Emacs server is running".to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

/// A down server is reported in the result, not as a failed call.
pub async fn execute<R: ClientRunner>(executor: &Executor<R>) -> ToolCallResult {
    let (text, status) = if executor.check().await {
        ("Emacs server is running.".to_owned(), "ok")
    } else {
        (format!("{SERVER_NOT_RUNNING}."), "error")
    };

    ToolCallResult {
        content: vec![ContentItem::text(text)],
        metadata: Some(serde_json::json!({ "status": status })),
        is_error: false,
    }
}
