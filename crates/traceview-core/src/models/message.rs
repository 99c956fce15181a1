//! Message data model

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// System prompt
    System,
    /// End-user input
    User,
    /// Model output
    Assistant,
    /// Tool result fed back to the model
    Tool,
    /// Anything else the producer emitted
    Other(String),
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::Other(raw) => raw,
        }
    }

    /// Display label; unknown roles show their raw value
    pub fn label(&self) -> &str {
        match self {
            Self::System => "System",
            Self::User => "User",
            Self::Assistant => "Assistant",
            Self::Tool => "Tool Result",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "system" => Self::System,
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "tool" => Self::Tool,
            _ => Self::Other(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message within a trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message
    #[serde(default)]
    pub role: Role,

    /// Text or structured content; `None` when absent or null
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,

    /// Tool invocations embedded in the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Per-message metadata (latency, token counts, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id, when the producer recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Function being called
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCall>,
}

/// Function name and JSON-encoded arguments of a tool call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Arguments, normally a JSON-encoded string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl ToolCall {
    /// Function name, if present and non-empty
    pub fn name(&self) -> Option<&str> {
        self.function
            .as_ref()
            .and_then(|f| f.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_strings() {
        for raw in ["system", "user", "assistant", "tool", "critic"] {
            let role: Role = serde_json::from_value(Value::String(raw.into())).unwrap();
            assert_eq!(role.as_str(), raw);
            assert_eq!(serde_json::to_value(&role).unwrap(), Value::String(raw.into()));
        }
    }

    #[test]
    fn test_unknown_role_label_is_raw_value() {
        let role = Role::from("critic".to_string());
        assert_eq!(role, Role::Other("critic".into()));
        assert_eq!(role.label(), "critic");
        assert_eq!(Role::Tool.label(), "Tool Result");
    }

    #[test]
    fn test_null_content_is_absent() {
        let msg: Message = serde_json::from_str(r#"{"role": "assistant", "content": null}"#).unwrap();
        assert!(msg.content.is_none());
        assert!(msg.tool_calls.is_none());
    }

    #[test]
    fn test_tool_call_name_ignores_empty() {
        let call: ToolCall =
            serde_json::from_str(r#"{"function": {"name": "", "arguments": "{}"}}"#).unwrap();
        assert_eq!(call.name(), None);

        let call: ToolCall = serde_json::from_str(r#"{"function": {"name": "grep"}}"#).unwrap();
        assert_eq!(call.name(), Some("grep"));
    }
}
