//! Data models for TraceView

mod message;
mod trace;

pub use message::*;
pub use trace::*;

/// Separator between joined header and metadata fields
pub const META_SEPARATOR: &str = "  ·  ";
