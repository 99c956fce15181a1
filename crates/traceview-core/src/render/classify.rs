//! Content classification and segmentation
//!
//! Message content arrives as free text, JSON blobs, prose with fenced code
//! blocks, or structured values. [`classify`] decides which of those it is and
//! cuts it into an ordered list of [`Segment`]s. Classification is pure: the
//! same content always yields the same plan.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::trace;

/// Opening fence with optional language tag, body, closing fence.
/// Non-greedy so adjacent blocks stay separate.
static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```([^\n]*)\n(.*?)```").expect("fence pattern compiles"));

/// How a piece of content was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// The whole trimmed content is bracketed like a JSON object or array
    Json,
    /// Prose interleaved with fenced code blocks
    Mixed,
    /// Plain text
    Prose,
}

/// A typed chunk of message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Free text, whitespace preserved; may be empty
    Prose(String),
    /// Body of a fenced code block
    Code {
        /// Language tag from the opening fence
        language: Option<String>,
        /// Code with the fence lines stripped
        text: String,
    },
    /// Whole-message JSON, pretty-printed when it parses
    Json(String),
}

impl Segment {
    /// Text carried by the segment
    pub fn text(&self) -> &str {
        match self {
            Self::Prose(text) | Self::Json(text) | Self::Code { text, .. } => text,
        }
    }

    /// Whether the segment is displayed in monospace
    pub fn is_monospace(&self) -> bool {
        !matches!(self, Self::Prose(_))
    }
}

/// Result of classifying one message's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderPlan {
    /// Classification outcome
    pub kind: ContentKind,
    /// Segments in source order
    pub segments: Vec<Segment>,
}

/// Classify message content, canonicalizing structured values to JSON text first.
pub fn classify(content: &Value) -> RenderPlan {
    match content {
        Value::String(text) => classify_text(text),
        other => classify_text(&pretty_value(other)),
    }
}

/// Classify textual content.
///
/// The JSON check is a bracket-edge heuristic on the trimmed text; a blob that
/// looks like JSON but fails to parse is still shown verbatim in monospace.
pub fn classify_text(content: &str) -> RenderPlan {
    let trimmed = content.trim();

    if looks_like_json(trimmed) {
        return RenderPlan {
            kind: ContentKind::Json,
            segments: vec![Segment::Json(pretty_json(trimmed))],
        };
    }

    if trimmed.contains("```") {
        return RenderPlan {
            kind: ContentKind::Mixed,
            segments: split_fences(content),
        };
    }

    RenderPlan {
        kind: ContentKind::Prose,
        segments: vec![Segment::Prose(content.to_string())],
    }
}

/// Split text into alternating prose and code segments.
///
/// Prose between, before and after fences is kept even when empty so the
/// segment sequence mirrors the source exactly.
pub fn split_fences(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in FENCE.captures_iter(text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        segments.push(Segment::Prose(text[last..whole.start()].to_string()));

        let language = caps
            .get(1)
            .map(|m| m.as_str().trim())
            .filter(|lang| !lang.is_empty())
            .map(str::to_string);
        segments.push(Segment::Code {
            language,
            text: body.as_str().to_string(),
        });
        last = whole.end();
    }

    segments.push(Segment::Prose(text[last..].to_string()));
    segments
}

/// Bracket-edge check: `{...}` or `[...]`
pub fn looks_like_json(trimmed: &str) -> bool {
    (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'))
}

/// Re-indent a JSON string with two spaces, or return it unchanged if it
/// does not parse.
pub fn pretty_json(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => pretty_value(&value),
        Err(err) => {
            trace!(error = %err, "content is not valid JSON, showing verbatim");
            raw.to_string()
        }
    }
}

/// Two-space indented JSON for an already-parsed value
pub fn pretty_value(value: &Value) -> String {
    // Serializing a `Value` cannot fail
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
