//! Review session state
//!
//! Navigation over the loaded traces and debounced persistence of the
//! annotation being edited.

mod cursor;
mod review;
mod save_state;

pub use cursor::Cursor;
pub use review::{LaneScroll, ReviewSession, SessionOptions, StatusSignals};
pub use save_state::{PendingEdit, SaveMachine, SaveState, DEFAULT_DEBOUNCE};
