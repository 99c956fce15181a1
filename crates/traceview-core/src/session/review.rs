//! Review session: cursor, rendered view and annotation editing for one run

use std::time::{Duration, Instant};

use tracing::debug;

use super::cursor::Cursor;
use super::save_state::{SaveMachine, SaveState, DEFAULT_DEBOUNCE};
use crate::models::Trace;
use crate::render::{project, LaneSide, TraceView, UnknownRolePolicy};
use crate::store::{AnnotationStore, KvStore};

/// Tunables for a review session
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Quiet period before an annotation edit is saved
    pub debounce: Duration,
    /// Lane placement for unrecognized roles
    pub unknown_roles: UnknownRolePolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            unknown_roles: UnknownRolePolicy::default(),
        }
    }
}

/// Vertical scroll offset of each lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneScroll {
    /// Input lane offset in lines
    pub input: u16,
    /// Output lane offset in lines
    pub output: u16,
}

impl LaneScroll {
    /// Offset for one lane
    pub fn get(&self, side: LaneSide) -> u16 {
        match side {
            LaneSide::Input => self.input,
            LaneSide::Output => self.output,
        }
    }

    fn get_mut(&mut self, side: LaneSide) -> &mut u16 {
        match side {
            LaneSide::Input => &mut self.input,
            LaneSide::Output => &mut self.output,
        }
    }
}

/// Externally observable status of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSignals {
    /// One-based position of the current trace
    pub position: usize,
    /// Number of traces
    pub total: usize,
    /// Traces with a non-blank annotation
    pub reviewed: usize,
    /// Whether stepping back is possible
    pub can_step_back: bool,
    /// Whether stepping forward is possible
    pub can_step_forward: bool,
}

impl StatusSignals {
    /// "Trace i of N"
    pub fn counter_text(&self) -> String {
        format!("Trace {} of {}", self.position, self.total)
    }

    /// "r / N reviewed"
    pub fn progress_text(&self) -> String {
        format!("{} / {} reviewed", self.reviewed, self.total)
    }
}

/// State of one review run over a fixed, non-empty trace collection.
///
/// Owns the cursor, the projected view of the current trace, the annotation
/// draft being edited and the debounce machine that persists it.
pub struct ReviewSession<S = Box<dyn KvStore>> {
    traces: Vec<Trace>,
    cursor: Cursor,
    store: AnnotationStore<S>,
    saver: SaveMachine,
    policy: UnknownRolePolicy,
    view: TraceView,
    draft: String,
    scroll: LaneScroll,
    reviewed: usize,
    current_reviewed: bool,
}

impl<S: KvStore> ReviewSession<S> {
    /// Start at the first trace; `None` when there are no traces
    pub fn new(traces: Vec<Trace>, store: AnnotationStore<S>, options: SessionOptions) -> Option<Self> {
        let cursor = Cursor::new(traces.len())?;
        let view = project(&traces[0], options.unknown_roles);
        let mut session = Self {
            traces,
            cursor,
            store,
            saver: SaveMachine::new(options.debounce),
            policy: options.unknown_roles,
            view,
            draft: String::new(),
            scroll: LaneScroll::default(),
            reviewed: 0,
            current_reviewed: false,
        };
        session.recount();
        session.show_current();
        Some(session)
    }

    /// Trace under the cursor
    pub fn current(&self) -> &Trace {
        &self.traces[self.cursor.index()]
    }

    /// Zero-based index of the current trace
    pub fn index(&self) -> usize {
        self.cursor.index()
    }

    /// All traces
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Rendered lanes of the current trace
    pub fn view(&self) -> &TraceView {
        &self.view
    }

    /// Annotation text as last edited
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Lane scroll offsets
    pub fn scroll(&self) -> LaneScroll {
        self.scroll
    }

    /// Annotation store
    pub fn annotations(&self) -> &AnnotationStore<S> {
        &self.store
    }

    /// Save state of the current annotation
    pub fn save_state(&self) -> SaveState {
        self.saver.state()
    }

    /// Save indicator text for the current annotation. Reads no storage;
    /// safe to call on every redraw.
    pub fn save_indicator(&self) -> &'static str {
        self.saver.state().indicator(self.current_reviewed)
    }

    /// Position, progress and step availability
    pub fn status(&self) -> StatusSignals {
        StatusSignals {
            position: self.cursor.index() + 1,
            total: self.cursor.len(),
            reviewed: self.reviewed,
            can_step_back: self.cursor.can_step_back(),
            can_step_forward: self.cursor.can_step_forward(),
        }
    }

    /// Record an edit to the current annotation; persisted once the
    /// debounce window passes without another edit
    pub fn edit(&mut self, text: impl Into<String>, now: Instant) {
        self.draft = text.into();
        let trace_id = self.current().id.clone();
        self.saver.edit(trace_id, self.draft.clone(), now);
    }

    /// Commit the pending edit if it is due. Returns true when something
    /// was written and the status signals changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.saver.poll(now) {
            Some(edit) => {
                self.commit(&edit.trace_id, &edit.text);
                true
            }
            None => false,
        }
    }

    /// Commit any pending edit immediately
    pub fn flush(&mut self) -> bool {
        match self.saver.flush() {
            Some(edit) => {
                self.commit(&edit.trace_id, &edit.text);
                true
            }
            None => false,
        }
    }

    /// Move by `delta` traces. Out-of-range steps change nothing and return
    /// false. Otherwise the outgoing annotation is flushed before the new
    /// trace is shown, so its stored text is never read back stale.
    pub fn step(&mut self, delta: isize) -> bool {
        let Some(next) = self.cursor.target(delta) else {
            return false;
        };

        self.flush();
        self.cursor.step(delta);
        debug!(index = next, trace_id = %self.current().id, "showing trace");
        self.show_current();
        true
    }

    /// Scroll one lane by `delta` lines, stopping at the top
    pub fn scroll_by(&mut self, side: LaneSide, delta: i32) {
        let offset = self.scroll.get_mut(side);
        *offset = if delta < 0 {
            offset.saturating_sub(u16::try_from(delta.unsigned_abs()).unwrap_or(u16::MAX))
        } else {
            offset.saturating_add(u16::try_from(delta).unwrap_or(u16::MAX))
        };
    }

    /// Cap one lane's offset, e.g. to the rendered content height
    pub fn clamp_scroll(&mut self, side: LaneSide, max: u16) {
        let offset = self.scroll.get_mut(side);
        *offset = (*offset).min(max);
    }

    fn show_current(&mut self) {
        self.view = project(self.current(), self.policy);
        self.draft = self.store.get(&self.current().id);
        self.current_reviewed = !self.draft.trim().is_empty();
        self.saver.reset();
        self.scroll = LaneScroll::default();
    }

    fn commit(&mut self, trace_id: &str, text: &str) {
        self.store.set(trace_id, text);
        if trace_id == self.current().id {
            self.current_reviewed = self.store.has(trace_id);
        }
        self.recount();
        debug!(trace_id, reviewed = self.reviewed, "annotation committed");
    }

    fn recount(&mut self) {
        self.reviewed = self
            .store
            .count_reviewed(self.traces.iter().map(|t| t.id.as_str()));
    }
}
