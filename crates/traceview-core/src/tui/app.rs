//! Main TUI application state and logic

use std::cell::Cell;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders};
use tracing::{debug, info};
use tui_textarea::TextArea;

use super::components::{lane_paragraph, max_scroll};
use super::event::{is_quit, key_match};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::loader::{load_traces, TraceSource};
use crate::models::Trace;
use crate::render::LaneSide;
use crate::session::{ReviewSession, SessionOptions};
use crate::store::{AnnotationStore, KvStore};

/// How long a status message stays visible
const STATUS_TTL: Duration = Duration::from_secs(2);

/// What the main area shows
pub enum Screen<S = Box<dyn KvStore>> {
    /// Trace collection is being fetched
    Loading(String),
    /// Loading failed; terminal state
    Failed(String),
    /// Collection loaded but empty; terminal state
    Empty(String),
    /// Stepping through traces
    Reviewing(Box<ReviewSession<S>>),
}

/// Inner area of each lane at the last draw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaneViewports {
    /// Input lane
    pub input: Rect,
    /// Output lane
    pub output: Rect,
}

impl LaneViewports {
    /// Area for one lane
    pub fn get(&self, side: LaneSide) -> Rect {
        match side {
            LaneSide::Input => self.input,
            LaneSide::Output => self.output,
        }
    }

    fn with(mut self, side: LaneSide, area: Rect) -> Self {
        match side {
            LaneSide::Input => self.input = area,
            LaneSide::Output => self.output = area,
        }
        self
    }
}

/// Main TUI application state
pub struct App<S = Box<dyn KvStore>> {
    /// Whether the app should quit
    pub should_quit: bool,
    /// Current screen
    pub screen: Screen<S>,
    /// Annotation editor
    pub editor: TextArea<'static>,
    /// Lane that PageUp/PageDown scroll
    pub focused_lane: LaneSide,
    /// Show help overlay
    pub show_help: bool,
    /// Status message
    pub status_message: Option<(String, Instant)>,
    /// Lines per scroll step
    pub scroll_step: u16,
    /// Tick rate
    pub tick_rate: Duration,
    /// Lane areas recorded by the renderer, used to bound scrolling
    lane_viewports: Cell<LaneViewports>,
    /// Annotation store, held until the collection is loaded
    pending_store: Option<AnnotationStore<S>>,
    options: SessionOptions,
}

impl<S: KvStore> App<S> {
    /// Create an app that will review `source`
    pub fn new(source: &TraceSource, store: AnnotationStore<S>, config: &Config) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Loading(source.to_string()),
            editor: new_editor(Vec::new()),
            focused_lane: LaneSide::Output,
            show_help: false,
            status_message: None,
            scroll_step: config.tui.scroll_step.max(1),
            tick_rate: Duration::from_millis(config.tui.tick_rate_ms),
            lane_viewports: Cell::new(LaneViewports::default()),
            pending_store: Some(store),
            options: SessionOptions {
                debounce: config.viewer.debounce,
                unknown_roles: config.viewer.unknown_roles,
            },
        }
    }

    /// Install the loaded collection, or the terminal state for a failed
    /// or empty load
    pub fn finish_loading(&mut self, loaded: Result<Vec<Trace>>) {
        let traces = match loaded {
            Ok(traces) => traces,
            Err(err) => {
                self.screen = Screen::Failed(err.to_string());
                return;
            }
        };

        let source = match &self.screen {
            Screen::Loading(source) => source.clone(),
            _ => String::new(),
        };
        let Some(store) = self.pending_store.take() else {
            return;
        };

        match ReviewSession::new(traces, store, self.options) {
            Some(session) => {
                self.editor = new_editor(draft_lines(session.draft()));
                self.screen = Screen::Reviewing(Box::new(session));
            }
            None => {
                self.screen = Screen::Empty(format!("{source} is empty"));
            }
        }
    }

    /// Active review session, if any
    pub fn session(&self) -> Option<&ReviewSession<S>> {
        match &self.screen {
            Screen::Reviewing(session) => Some(session.as_ref()),
            _ => None,
        }
    }

    /// Handle key events
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if is_quit(key) {
            self.quit();
            return;
        }

        match (key.code, key.modifiers) {
            (KeyCode::F(1), _) => {
                self.show_help = !self.show_help;
                return;
            }
            (KeyCode::Esc, _) if self.show_help => {
                self.show_help = false;
                return;
            }
            _ if self.show_help => return,
            _ => {}
        }

        let Screen::Reviewing(session) = &mut self.screen else {
            // Terminal states accept nothing but quit
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                self.should_quit = true;
            }
            return;
        };

        if key_match(key, KeyCode::Left, KeyModifiers::NONE) {
            self.navigate(-1);
        } else if key_match(key, KeyCode::Right, KeyModifiers::NONE) {
            self.navigate(1);
        } else if key_match(key, KeyCode::Tab, KeyModifiers::NONE) {
            self.focused_lane = self.focused_lane.other();
        } else if matches!(key.code, KeyCode::PageDown | KeyCode::PageUp) {
            let side = self.focused_lane;
            let max = max_scroll(
                &lane_paragraph(session.view().lane(side)),
                self.lane_viewports.get().get(side),
            );
            // a resize can leave the offset past the end
            session.clamp_scroll(side, max);
            let step = i32::from(self.scroll_step);
            session.scroll_by(side, if key.code == KeyCode::PageDown { step } else { -step });
            session.clamp_scroll(side, max);
        } else if self.editor.input(key) {
            session.edit(self.editor.lines().join("\n"), now);
        }
    }

    /// Handle pasted text
    pub fn handle_paste(&mut self, text: &str, now: Instant) {
        if self.show_help {
            return;
        }
        if let Screen::Reviewing(session) = &mut self.screen {
            if self.editor.insert_str(text.replace('\r', "")) {
                session.edit(self.editor.lines().join("\n"), now);
            }
        }
    }

    /// Periodic work: commit due annotation saves
    pub fn on_tick(&mut self, now: Instant) {
        if let Screen::Reviewing(session) = &mut self.screen {
            if session.tick(now) {
                debug!(trace_id = %session.current().id, "annotation saved");
            }
        }
    }

    /// Step to another trace, flushing the outgoing annotation first
    pub fn navigate(&mut self, delta: isize) {
        let Screen::Reviewing(session) = &mut self.screen else {
            return;
        };

        if session.step(delta) {
            self.editor = new_editor(draft_lines(session.draft()));
        } else if delta < 0 {
            self.set_status("Already at the first trace".to_string());
        } else {
            self.set_status("Already at the last trace".to_string());
        }
    }

    /// Flush any pending annotation and stop
    pub fn quit(&mut self) {
        if let Screen::Reviewing(session) = &mut self.screen {
            session.flush();
        }
        self.should_quit = true;
    }

    /// Record where a lane was drawn
    pub fn record_viewport(&self, side: LaneSide, area: Rect) {
        self.lane_viewports.set(self.lane_viewports.get().with(side, area));
    }

    /// Lane areas from the last draw
    pub fn lane_viewports(&self) -> LaneViewports {
        self.lane_viewports.get()
    }

    /// Set a status message that expires after a short period
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get current status message if not expired
    pub fn get_status(&self) -> Option<&str> {
        self.status_message.as_ref().and_then(|(msg, time)| {
            if time.elapsed() < STATUS_TTL {
                Some(msg.as_str())
            } else {
                None
            }
        })
    }

    /// Run the TUI application
    pub async fn run(&mut self, source: &TraceSource) -> Result<()> {
        use crossterm::{
            event::{DisableBracketedPaste, EnableBracketedPaste},
            execute,
            terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        };
        use ratatui::{backend::CrosstermBackend, Terminal};
        use std::io;

        // Setup terminal
        enable_raw_mode().map_err(Error::tui)?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).map_err(Error::tui)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(Error::tui)?;

        let result = self.event_loop(&mut terminal, source).await;

        // Restore terminal even if the loop failed
        disable_raw_mode().map_err(Error::tui)?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)
            .map_err(Error::tui)?;
        terminal.show_cursor().map_err(Error::tui)?;

        result
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut ratatui::Terminal<B>,
        source: &TraceSource,
    ) -> Result<()> {
        terminal
            .draw(|frame| super::ui::draw(frame, self))
            .map_err(Error::tui)?;

        let loaded = load_traces(source).await;
        if let Err(err) = &loaded {
            tracing::error!(error = %err, "trace collection unavailable");
        }
        self.finish_loading(loaded);
        if let Some(session) = self.session() {
            info!(traces = session.traces().len(), "review started");
        }

        let tick_ms = u64::try_from(self.tick_rate.as_millis()).unwrap_or(u64::MAX);
        let mut events = super::EventHandler::new(tick_ms);
        events.start();

        while !self.should_quit {
            terminal
                .draw(|frame| super::ui::draw(frame, self))
                .map_err(Error::tui)?;

            let Some(event) = events.next().await else {
                self.quit();
                break;
            };
            let now = Instant::now();
            match event {
                super::Event::Key(key) => self.handle_key(key, now),
                super::Event::Paste(text) => self.handle_paste(&text, now),
                super::Event::Tick => self.on_tick(now),
                super::Event::Resize(_, _) => {
                    // Terminal handles resize automatically
                }
            }
        }

        Ok(())
    }
}

fn draft_lines(draft: &str) -> Vec<String> {
    draft.split('\n').map(str::to_string).collect()
}

fn new_editor(lines: Vec<String>) -> TextArea<'static> {
    let mut editor = if lines.is_empty() {
        TextArea::default()
    } else {
        TextArea::new(lines)
    };
    editor.set_block(Block::default().borders(Borders::ALL).title("Annotation"));
    editor.set_placeholder_text("Type notes about this trace…");
    editor.move_cursor(tui_textarea::CursorMove::Bottom);
    editor.move_cursor(tui_textarea::CursorMove::End);
    editor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{LaneScroll, SaveState};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn traces() -> Vec<Trace> {
        serde_json::from_value(json!([
            {"id": "a", "messages": [{"role": "user", "content": "1"}]},
            {"id": "b", "messages": [{"role": "assistant", "content": "2"}]}
        ]))
        .unwrap()
    }

    fn app() -> App<MemoryStore> {
        let mut app = App::new(
            &TraceSource::parse("fixtures.json"),
            AnnotationStore::new(MemoryStore::new()),
            &Config::default(),
        );
        app.finish_loading(Ok(traces()));
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str, now: Instant) {
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch)), now);
        }
    }

    #[test]
    fn test_typing_q_edits_instead_of_quitting() {
        let mut app = app();
        type_text(&mut app, "quick", Instant::now());
        assert!(!app.should_quit);
        let session = app.session().unwrap();
        assert_eq!(session.draft(), "quick");
        assert_eq!(session.save_state(), SaveState::Saving);
    }

    #[test]
    fn test_arrow_navigation_flushes_and_reloads_editor() {
        let mut app = app();
        type_text(&mut app, "note", Instant::now());
        app.handle_key(key(KeyCode::Right), Instant::now());

        let session = app.session().unwrap();
        assert_eq!(session.index(), 1);
        assert_eq!(session.annotations().get("a"), "note");
        assert_eq!(app.editor.lines(), [String::new()]);

        app.handle_key(key(KeyCode::Left), Instant::now());
        assert_eq!(app.editor.lines(), ["note".to_string()]);
    }

    #[test]
    fn test_step_past_end_sets_status() {
        let mut app = app();
        app.handle_key(key(KeyCode::Left), Instant::now());
        assert_eq!(app.get_status(), Some("Already at the first trace"));
        assert_eq!(app.session().unwrap().index(), 0);
    }

    #[test]
    fn test_quit_flushes_pending_edit() {
        let mut app = app();
        type_text(&mut app, "late", Instant::now());
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(app.should_quit);
        assert_eq!(app.session().unwrap().annotations().get("a"), "late");
    }

    #[test]
    fn test_tick_commits_after_debounce() {
        let mut app = app();
        let start = Instant::now();
        type_text(&mut app, "x", start);
        app.on_tick(start + Duration::from_millis(100));
        assert_eq!(app.session().unwrap().annotations().get("a"), "");
        app.on_tick(start + Duration::from_secs(1));
        assert_eq!(app.session().unwrap().annotations().get("a"), "x");
        assert_eq!(app.session().unwrap().status().reviewed, 1);
    }

    #[test]
    fn test_failed_and_empty_loads_are_terminal() {
        let source = TraceSource::parse("missing.json");
        let mut failed = App::new(&source, AnnotationStore::new(MemoryStore::new()), &Config::default());
        failed.finish_loading(Err(Error::load("missing.json", "HTTP 404")));
        assert!(matches!(&failed.screen, Screen::Failed(msg) if msg.contains("HTTP 404")));

        let mut empty = App::new(&source, AnnotationStore::new(MemoryStore::new()), &Config::default());
        empty.finish_loading(Ok(Vec::new()));
        assert!(matches!(&empty.screen, Screen::Empty(msg) if msg == "missing.json is empty"));
        empty.handle_key(key(KeyCode::Right), Instant::now());
        assert!(empty.session().is_none());
    }

    fn draw(app: &App<MemoryStore>) {
        let mut terminal =
            ratatui::Terminal::new(ratatui::backend::TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| super::super::ui::draw(frame, app)).unwrap();
    }

    #[test]
    fn test_short_lanes_do_not_scroll() {
        let mut app = app();
        draw(&app);
        assert_eq!(app.lane_viewports().output.width, 48);
        for _ in 0..10 {
            app.handle_key(key(KeyCode::PageDown), Instant::now());
        }
        app.handle_key(key(KeyCode::Tab), Instant::now());
        app.handle_key(key(KeyCode::PageDown), Instant::now());
        assert_eq!(app.session().unwrap().scroll(), LaneScroll::default());
    }

    #[test]
    fn test_page_up_recovers_immediately_after_overscroll() {
        let mut app = App::new(
            &TraceSource::parse("long.json"),
            AnnotationStore::new(MemoryStore::new()),
            &Config::default(),
        );
        let long = "word ".repeat(2000);
        app.finish_loading(Ok(serde_json::from_value(json!([
            {"id": "long", "messages": [{"role": "assistant", "content": long}]}
        ]))
        .unwrap()));
        draw(&app);

        for _ in 0..500 {
            app.handle_key(key(KeyCode::PageDown), Instant::now());
        }
        let bottom = app.session().unwrap().scroll().output;
        assert!(bottom > 100);

        app.handle_key(key(KeyCode::PageUp), Instant::now());
        assert_eq!(app.session().unwrap().scroll().output, bottom - 3);
    }

    #[test]
    fn test_help_overlay_swallows_keys() {
        let mut app = app();
        app.handle_key(key(KeyCode::F(1)), Instant::now());
        assert!(app.show_help);
        app.handle_key(key(KeyCode::Right), Instant::now());
        assert_eq!(app.session().unwrap().index(), 0);
        app.handle_key(key(KeyCode::Esc), Instant::now());
        assert!(!app.show_help);
    }
}
