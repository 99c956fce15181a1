//! Debounced save state for the active annotation

use std::time::{Duration, Instant};

/// Default quiet period before an edit is committed
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(600);

/// Save status shown next to the annotation editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveState {
    /// No edit since the trace was shown
    #[default]
    Idle,
    /// An edit is waiting for the debounce window to pass
    Saving,
    /// The last edit was committed
    Saved,
}

impl SaveState {
    /// Indicator text; an idle trace that already has an annotation shows as saved
    pub fn indicator(self, has_annotation: bool) -> &'static str {
        match self {
            Self::Saving => "Saving…",
            Self::Saved => "✓ Saved",
            Self::Idle if has_annotation => "✓ Saved",
            Self::Idle => "",
        }
    }
}

/// An edit waiting to be committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    /// Trace the edit belongs to
    pub trace_id: String,
    /// Full annotation text at the time of the edit
    pub text: String,
}

/// Debounce state machine.
///
/// Each edit replaces the pending text and pushes the deadline out; only the
/// text present when the deadline passes is committed. [`SaveMachine::flush`]
/// hands out the pending edit immediately regardless of the deadline.
#[derive(Debug, Clone)]
pub struct SaveMachine {
    window: Duration,
    state: SaveState,
    pending: Option<(PendingEdit, Instant)>,
}

impl Default for SaveMachine {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl SaveMachine {
    /// Create a machine with the given debounce window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: SaveState::Idle,
            pending: None,
        }
    }

    /// Current state
    pub fn state(&self) -> SaveState {
        self.state
    }

    /// Debounce window
    pub fn window(&self) -> Duration {
        self.window
    }

    /// When the pending edit becomes due, if there is one
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Whether an edit is waiting
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Record an edit; supersedes any earlier pending edit
    pub fn edit(&mut self, trace_id: impl Into<String>, text: impl Into<String>, now: Instant) {
        let edit = PendingEdit {
            trace_id: trace_id.into(),
            text: text.into(),
        };
        self.pending = Some((edit, now + self.window));
        self.state = SaveState::Saving;
    }

    /// Take the pending edit if its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<PendingEdit> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.take(),
            _ => None,
        }
    }

    /// Take the pending edit immediately
    pub fn flush(&mut self) -> Option<PendingEdit> {
        self.take()
    }

    /// Back to idle, discarding anything pending; callers flush first
    pub fn reset(&mut self) {
        self.pending = None;
        self.state = SaveState::Idle;
    }

    fn take(&mut self) -> Option<PendingEdit> {
        let (edit, _) = self.pending.take()?;
        self.state = SaveState::Saved;
        Some(edit)
    }
}
