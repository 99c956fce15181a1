//! Content rendering
//!
//! Turns traces into surface-independent display structures: messages are
//! classified and segmented, rendered into display units, and partitioned
//! into input and output lanes. Surfaces (terminal, HTML) escape each leaf
//! fragment themselves.

mod classify;
mod escape;
pub mod html;
mod message;
mod trace;

pub use classify::{
    classify, classify_text, looks_like_json, pretty_json, pretty_value, split_fences,
    ContentKind, RenderPlan, Segment,
};
pub use escape::{escape_html, sanitize_terminal};
pub use message::{render_message, render_meta, render_tool_call, DisplayUnit, ToolCallBlock, UNKNOWN_TOOL};
pub use trace::{lane_for, project, Lane, LaneEntry, LaneSide, TraceView, UnknownRolePolicy};
