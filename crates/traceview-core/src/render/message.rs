//! Per-message display units

use serde_json::Value;

use super::classify::{classify, pretty_json, pretty_value, RenderPlan};
use crate::models::{Message, Role, ToolCall, META_SEPARATOR};

/// Name shown for tool calls that did not record one
pub const UNKNOWN_TOOL: &str = "unknown_tool";

/// Renderable form of one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayUnit {
    /// Role of the message
    pub role: Role,
    /// Role tag text
    pub label: String,
    /// Classified content, absent when the message has no text
    pub body: Option<RenderPlan>,
    /// Embedded tool calls in order
    pub tool_calls: Vec<ToolCallBlock>,
    /// Single-line `key: value` metadata strip
    pub meta: Option<String>,
}

/// A tool invocation ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallBlock {
    /// Function name, or [`UNKNOWN_TOOL`]
    pub name: String,
    /// Arguments, pretty-printed when they parse as JSON
    pub arguments: String,
}

/// Build the display unit for a message. Pure; no shared state.
pub fn render_message(message: &Message) -> DisplayUnit {
    let body = match &message.content {
        None => None,
        Some(Value::String(text)) if text.is_empty() => None,
        Some(content) => Some(classify(content)),
    };

    let tool_calls = message
        .tool_calls
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(render_tool_call)
        .collect();

    DisplayUnit {
        role: message.role.clone(),
        label: message.role.label().to_string(),
        body,
        tool_calls,
        meta: message.metadata.as_ref().and_then(render_meta),
    }
}

/// Name plus attempted-pretty arguments; unparsable arguments pass through.
pub fn render_tool_call(call: &ToolCall) -> ToolCallBlock {
    let arguments = match call.function.as_ref().and_then(|f| f.arguments.as_ref()) {
        None => String::new(),
        Some(Value::String(raw)) => pretty_json(raw),
        Some(structured) => pretty_value(structured),
    };

    ToolCallBlock {
        name: call.name().unwrap_or(UNKNOWN_TOOL).to_string(),
        arguments,
    }
}

/// `key: value` pairs in object key order, or `None` if there are none.
pub fn render_meta(meta: &Value) -> Option<String> {
    let pairs: Vec<String> = match meta {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| format!("{key}: {}", scalar_text(value)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, value)| format!("{idx}: {}", scalar_text(value)))
            .collect(),
        _ => return None,
    };

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join(META_SEPARATOR))
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
