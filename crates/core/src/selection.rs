//! Tool-selection prompt construction and reply parsing.

use serde_json::{Map, Value};

use crate::context::SessionContext;
use crate::provider::{DEFAULT_TOOL, PARSED_SELECTION_CONFIDENCE, ToolSelection};
use crate::tool::ToolSpec;

/// Build the prompt asking the backend to pick one tool from the catalog.
///
/// Tools are listed in catalog order.
pub fn build_prompt(query: &str, context: &SessionContext, catalog: &[ToolSpec]) -> String {
    let mut tools_text = String::new();
    for tool in catalog {
        tools_text.push_str(&format!("Tool: {}\nDescription: {}\n", tool.name, tool.description));
        if !tool.parameters.is_empty() {
            tools_text.push_str("Parameters:\n");
            for (name, param) in &tool.parameters {
                let required = if param.required { "required" } else { "optional" };
                tools_text.push_str(&format!(
                    "  - {name} ({}, {required}): {}\n",
                    param.kind, param.description
                ));
            }
        }
        tools_text.push('\n');
    }

    let mut history_text = String::new();
    if let Some(account) = &context.last_account {
        history_text.push_str(&format!("Previous account discussed: {account}\n"));
    }
    if let Some(intent) = &context.last_intent {
        history_text.push_str(&format!("Previous intent: {intent}\n"));
    }
    if !history_text.is_empty() {
        history_text = format!("Conversation so far:\n{history_text}\n");
    }

    format!(
        r#"You are Safina, an AI assistant for bank staff handling digital lending queries.

Available Tools:
{tools_text}{history_text}User Query: "{query}"

Select the most appropriate tool. Respond ONLY with JSON:
{{
    "tool_name": "tool_name",
    "arguments": {{}},
    "reasoning": "brief explanation"
}}"#
    )
}

/// Parse the backend's reply. Takes the outermost `{...}` span, so prose or
/// code fences around the JSON are tolerated. Returns `None` when no JSON
/// object can be recovered.
pub fn parse_selection(reply: &str) -> Option<ToolSelection> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }

    let value: Value = serde_json::from_str(&reply[start..=end]).ok()?;
    let object = value.as_object()?;

    let tool_name = object
        .get("tool_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_TOOL);

    let arguments = match object.get("arguments") {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };

    Some(ToolSelection::new(tool_name, arguments, PARSED_SELECTION_CONFIDENCE))
}
