//! UI rendering for the TUI

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{block::Title, Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::app::{App, Screen};
use super::components::{lane_paragraph, max_scroll};
use crate::render::{sanitize_terminal, LaneSide};
use crate::session::{ReviewSession, SaveState};
use crate::store::KvStore;

/// Main colors
const PRIMARY: Color = Color::Cyan;
const SECONDARY: Color = Color::Magenta;
const SUCCESS: Color = Color::Green;
const WARNING: Color = Color::Yellow;
const ERROR: Color = Color::Red;
const MUTED: Color = Color::DarkGray;

/// Draw the entire UI
pub fn draw<S: KvStore>(frame: &mut Frame, app: &App<S>) {
    match &app.screen {
        Screen::Loading(source) => draw_message(frame, &format!("Loading {source}…"), MUTED),
        Screen::Failed(reason) => draw_message(frame, reason, ERROR),
        Screen::Empty(reason) => draw_message(frame, reason, MUTED),
        Screen::Reviewing(session) => draw_review(frame, app, session),
    }

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn draw_message(frame: &mut Frame, text: &str, color: Color) {
    let area = centered_rect(70, 30, frame.size());
    let lines = vec![
        Line::from(sanitize_terminal(text).into_owned()).style(Style::default().fg(color)),
        Line::from(""),
        Line::from("Esc / q to quit").style(Style::default().fg(MUTED).italic()),
    ];
    let message = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title("TraceView")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(MUTED)),
        );
    frame.render_widget(message, area);
}

fn draw_review<S: KvStore>(frame: &mut Frame, app: &App<S>, session: &ReviewSession<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Header
            Constraint::Min(8),     // Lanes
            Constraint::Length(7),  // Annotation editor
            Constraint::Length(1),  // Status bar
        ])
        .split(frame.size());

    draw_header(frame, session, chunks[0]);
    draw_lanes(frame, app, session, chunks[1]);
    draw_editor(frame, app, session, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);
}

fn draw_header<S: KvStore>(frame: &mut Frame, session: &ReviewSession<S>, area: Rect) {
    let status = session.status();
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(MUTED));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(24),
            Constraint::Min(20),
            Constraint::Length(34),
        ])
        .split(inner);

    let counter = Paragraph::new(status.counter_text()).style(Style::default().fg(PRIMARY).bold());
    frame.render_widget(counter, chunks[0]);

    let meta = Paragraph::new(sanitize_terminal(&session.current().meta_line()).into_owned())
        .style(Style::default().fg(MUTED));
    frame.render_widget(meta, chunks[1]);

    let nav_style = |enabled: bool| {
        if enabled {
            Style::default().fg(SECONDARY)
        } else {
            Style::default().fg(MUTED)
        }
    };
    let badge_style = if status.reviewed > 0 {
        Style::default().fg(SUCCESS).bold()
    } else {
        Style::default().fg(MUTED)
    };
    let right = Line::from(vec![
        Span::styled("◀ prev ", nav_style(status.can_step_back)),
        Span::styled(status.progress_text(), badge_style),
        Span::styled(" next ▶", nav_style(status.can_step_forward)),
    ]);
    frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), chunks[2]);
}

fn draw_lanes<S: KvStore>(frame: &mut Frame, app: &App<S>, session: &ReviewSession<S>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    for (side, chunk) in [(LaneSide::Input, chunks[0]), (LaneSide::Output, chunks[1])] {
        let border = if app.focused_lane == side { PRIMARY } else { MUTED };
        let title = match side {
            LaneSide::Input => Style::default().fg(WARNING).bold(),
            LaneSide::Output => Style::default().fg(PRIMARY).bold(),
        };
        let block = Block::default()
            .title(Span::styled(side.title(), title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border));
        let inner = block.inner(chunk);
        app.record_viewport(side, inner);

        let paragraph = lane_paragraph(session.view().lane(side));
        let scroll = session.scroll().get(side).min(max_scroll(&paragraph, inner));
        frame.render_widget(paragraph.scroll((scroll, 0)), inner);
        frame.render_widget(block, chunk);
    }
}

fn draw_editor<S: KvStore>(frame: &mut Frame, app: &App<S>, session: &ReviewSession<S>, area: Rect) {
    let indicator_style = match session.save_state() {
        SaveState::Saving => Style::default().fg(WARNING),
        SaveState::Saved | SaveState::Idle => Style::default().fg(SUCCESS),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PRIMARY))
        .title("Annotation")
        .title(
            Title::from(Span::styled(session.save_indicator(), indicator_style))
                .alignment(Alignment::Right),
        );

    let mut editor = app.editor.clone();
    editor.set_block(block);
    frame.render_widget(editor.widget(), area);
}

fn draw_status_bar<S: KvStore>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let left_text = app
        .get_status()
        .unwrap_or("←/→ Trace | Tab Lane | PgUp/PgDn Scroll | F1 Help | Ctrl+Q Quit");
    let left = Paragraph::new(left_text).style(Style::default().fg(MUTED));
    frame.render_widget(left, chunks[0]);

    let right = Paragraph::new(format!("Scrolling: {}", app.focused_lane.title()))
        .style(Style::default().fg(MUTED))
        .alignment(Alignment::Right);
    frame.render_widget(right, chunks[1]);
}

fn draw_help_overlay(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.size());

    // Clear the background
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from("Keyboard Shortcuts").style(Style::default().fg(PRIMARY).bold()),
        Line::from(""),
        Line::from("Navigation:").style(Style::default().fg(SECONDARY)),
        Line::from("  ← / →              Previous / next trace"),
        Line::from("  Tab                Switch scrolled lane"),
        Line::from("  PgUp / PgDn        Scroll lane"),
        Line::from(""),
        Line::from("Annotation:").style(Style::default().fg(SECONDARY)),
        Line::from("  Type               Edit; saved automatically"),
        Line::from("  ↑ / ↓ / Home / End Move within the note"),
        Line::from(""),
        Line::from("General:").style(Style::default().fg(SECONDARY)),
        Line::from("  F1                 Toggle this help"),
        Line::from("  Ctrl+Q / Ctrl+C    Save and quit"),
        Line::from(""),
        Line::from("Esc to close").style(Style::default().fg(MUTED).italic()),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(PRIMARY)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(help, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::loader::TraceSource;
    use crate::store::{AnnotationStore, MemoryStore};
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn render(app: &App<MemoryStore>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.get(x, y).symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_review_screen_shows_header_and_lanes() {
        let mut app = App::new(
            &TraceSource::parse("t.json"),
            AnnotationStore::new(MemoryStore::new()),
            &Config::default(),
        );
        app.finish_loading(Ok(serde_json::from_value(json!([
            {"id": "a", "span_id": "span-1", "messages": [
                {"role": "user", "content": "What is 2+2?"},
                {"role": "assistant", "content": "4"}
            ]},
            {"id": "b", "messages": []}
        ]))
        .unwrap()));

        let screen = render(&app);
        assert!(screen.contains("Trace 1 of 2"));
        assert!(screen.contains("0 / 2 reviewed"));
        assert!(screen.contains("span-1"));
        assert!(screen.contains("What is 2+2?"));
        assert!(screen.contains("Annotation"));
    }

    #[test]
    fn test_tail_of_long_message_is_reachable() {
        let mut words: Vec<String> = (0..800).map(|i| format!("w{i}")).collect();
        words.push("TAILMARK".to_string());
        let mut app = App::new(
            &TraceSource::parse("t.json"),
            AnnotationStore::new(MemoryStore::new()),
            &Config::default(),
        );
        app.finish_loading(Ok(serde_json::from_value(json!([
            {"id": "a", "messages": [{"role": "assistant", "content": words.join(" ")}]}
        ]))
        .unwrap()));

        let first = render(&app);
        assert!(first.contains("w0 w1 w2"));
        assert!(!first.contains("TAILMARK"));

        for _ in 0..200 {
            app.handle_key(
                crossterm::event::KeyEvent::new(
                    crossterm::event::KeyCode::PageDown,
                    crossterm::event::KeyModifiers::NONE,
                ),
                std::time::Instant::now(),
            );
        }
        let last = render(&app);
        assert!(last.contains("TAILMARK"));
        assert!(!last.contains("w0 w1 w2"));

        let viewport = app.lane_viewports().output;
        let paragraph = lane_paragraph(app.session().unwrap().view().lane(LaneSide::Output));
        assert_eq!(
            app.session().unwrap().scroll().output,
            max_scroll(&paragraph, viewport)
        );
    }

    #[test]
    fn test_failed_screen_shows_reason() {
        let mut app = App::new(
            &TraceSource::parse("t.json"),
            AnnotationStore::new(MemoryStore::new()),
            &Config::default(),
        );
        app.finish_loading(Err(crate::Error::load("t.json", "HTTP 500")));
        let screen = render(&app);
        assert!(screen.contains("HTTP 500"));
    }
}
