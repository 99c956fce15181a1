//! Terminal review interface
//!
//! Two lanes of rendered messages, an annotation editor and a status bar.

mod app;
mod components;
mod event;
mod ui;

pub use app::{App, LaneViewports, Screen};
pub use event::{Event, EventHandler};
