//! Trace data model

use serde::{Deserialize, Serialize};

use super::Message;

/// A recorded model interaction, as read from the trace collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Stable identifier; annotations are keyed by it
    pub id: String,

    /// Span ID from the originating tracer, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,

    /// Messages in the order they were exchanged
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Trace-level metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TraceMetadata>,
}

/// Trace-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceMetadata {
    /// Model that produced the outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Experiment or run name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment: Option<String>,

    /// Anything else the producer recorded
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Trace {
    /// Header line: span id, model and experiment joined by a separator
    pub fn meta_line(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(span_id) = self.span_id.as_deref().filter(|s| !s.is_empty()) {
            parts.push(span_id);
        }
        if let Some(meta) = &self.metadata {
            if let Some(model) = meta.model.as_deref().filter(|s| !s.is_empty()) {
                parts.push(model);
            }
            if let Some(experiment) = meta.experiment.as_deref().filter(|s| !s.is_empty()) {
                parts.push(experiment);
            }
        }
        parts.join(super::META_SEPARATOR)
    }
}
