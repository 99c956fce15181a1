//! # TraceView
//!
//! Human review of recorded LLM conversations.
//!
//! TraceView loads a collection of traces, shows each one as an input lane
//! (what the model was given) beside an output lane (what it produced), and
//! keeps a free-text annotation per trace in a durable store.
//!
//! ## Architecture
//!
//! - **Render**: content classification, message display units, lane projection
//! - **Store**: namespaced annotation persistence over a key-value backend
//! - **Session**: navigation cursor and debounced save state
//! - **TUI**: terminal review interface
//!
//! ## Quick Start
//!
//! ```bash
//! # Review a local collection
//! traceview review data/traces.json
//!
//! # Export the collection with annotations
//! traceview export data/traces.json -o review.html
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod render;
pub mod session;
pub mod store;
pub mod tui;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::loader::{load_traces, TraceSource};
    pub use crate::models::*;
    pub use crate::render::{project, render_message, TraceView, UnknownRolePolicy};
    pub use crate::session::ReviewSession;
    pub use crate::store::{open_annotation_store, AnnotationStore, KvStore};
}
