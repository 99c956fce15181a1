//! Terminal rendering of lanes and messages
//!
//! Every leaf string passes through [`sanitize_terminal`] before it becomes a
//! span.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use crate::models::Role;
use crate::render::{sanitize_terminal, DisplayUnit, Lane, LaneEntry, RenderPlan, Segment, ToolCallBlock};

const CODE_GUTTER: &str = "│ ";

/// Accent color for a role tag
pub fn role_color(role: &Role) -> Color {
    match role {
        Role::System => Color::Magenta,
        Role::User => Color::Blue,
        Role::Assistant => Color::Cyan,
        Role::Tool => Color::Yellow,
        Role::Other(_) => Color::Gray,
    }
}

fn code_style() -> Style {
    Style::default().fg(Color::LightGreen)
}

fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Accumulates styled text, breaking lines on `\n`
#[derive(Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl LineBuilder {
    fn push(&mut self, text: &str, style: Style) {
        let clean = sanitize_terminal(text);
        let mut parts = clean.split('\n');
        if let Some(first) = parts.next() {
            self.push_inline(first, style);
        }
        for part in parts {
            self.break_line();
            self.push_inline(part, style);
        }
    }

    fn push_inline(&mut self, text: &str, style: Style) {
        if !text.is_empty() {
            self.current.push(Span::styled(text.to_string(), style));
        }
    }

    /// Monospace block on its own lines, marked with a gutter
    fn push_block(&mut self, text: &str, style: Style) {
        self.ensure_line_start();
        let clean = sanitize_terminal(text);
        let body = clean.strip_suffix('\n').unwrap_or(&clean);
        for line in body.split('\n') {
            self.lines.push(Line::from(vec![
                Span::styled(CODE_GUTTER, muted()),
                Span::styled(line.to_string(), style),
            ]));
        }
    }

    fn push_line(&mut self, line: Line<'static>) {
        self.ensure_line_start();
        self.lines.push(line);
    }

    fn ensure_line_start(&mut self) {
        if !self.current.is_empty() {
            self.break_line();
        }
    }

    fn break_line(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.ensure_line_start();
        self.lines
    }
}

/// Lines for one message
pub fn unit_lines(unit: &DisplayUnit) -> Vec<Line<'static>> {
    let mut out = LineBuilder::default();
    let tag_style = Style::default()
        .fg(role_color(&unit.role))
        .add_modifier(Modifier::BOLD);
    out.push_line(Line::from(Span::styled(
        sanitize_terminal(&unit.label).to_uppercase(),
        tag_style,
    )));

    if let Some(body) = &unit.body {
        push_body(&mut out, body);
    }
    for call in &unit.tool_calls {
        push_tool_call(&mut out, call);
    }
    if let Some(meta) = &unit.meta {
        out.push_line(Line::from(Span::styled(
            sanitize_terminal(meta).into_owned(),
            muted().add_modifier(Modifier::ITALIC),
        )));
    }
    out.finish()
}

fn push_body(out: &mut LineBuilder, plan: &RenderPlan) {
    for segment in &plan.segments {
        match segment {
            Segment::Prose(text) => out.push(text, Style::default()),
            Segment::Code { text, .. } | Segment::Json(text) => out.push_block(text, code_style()),
        }
    }
}

fn push_tool_call(out: &mut LineBuilder, call: &ToolCallBlock) {
    out.push_line(Line::from(vec![
        Span::styled("→ ", Style::default().fg(Color::Yellow)),
        Span::styled(
            sanitize_terminal(&call.name).into_owned(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ]));
    if !call.arguments.is_empty() {
        out.push_block(&call.arguments, code_style());
    }
}

/// Text for a whole lane, messages separated by a blank line
pub fn lane_text(lane: &Lane) -> Text<'static> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    for (idx, entry) in lane.entries.iter().enumerate() {
        if idx > 0 {
            lines.push(Line::from(""));
        }
        match entry {
            LaneEntry::Message(unit) => lines.extend(unit_lines(unit)),
            LaneEntry::Placeholder(label) => lines.push(Line::from(Span::styled(
                *label,
                muted().add_modifier(Modifier::ITALIC),
            ))),
        }
    }
    Text::from(lines)
}

/// Wrapped paragraph for a lane, without its border block
pub fn lane_paragraph(lane: &Lane) -> Paragraph<'static> {
    Paragraph::new(lane_text(lane)).wrap(Wrap { trim: false })
}

/// Largest scroll offset that still fills `viewport`, counted in wrapped rows
pub fn max_scroll(paragraph: &Paragraph<'_>, viewport: Rect) -> u16 {
    let rows = paragraph.line_count(viewport.width);
    u16::try_from(rows.saturating_sub(usize::from(viewport.height))).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Trace;
    use crate::render::{project, render_message, UnknownRolePolicy};
    use serde_json::json;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_mixed_content_lines() {
        let message = serde_json::from_value(json!({
            "role": "assistant",
            "content": "intro\n```py\nprint(1)\n```\noutro"
        }))
        .unwrap();
        let lines = unit_lines(&render_message(&message));
        assert_eq!(
            plain(&lines),
            vec!["ASSISTANT", "intro", "│ print(1)", "", "outro"]
        );
    }

    #[test]
    fn test_tool_call_lines() {
        let message = serde_json::from_value(json!({
            "role": "assistant",
            "tool_calls": [{"function": {"name": "ls", "arguments": "not json"}}],
            "metadata": {"tokens": 12}
        }))
        .unwrap();
        let lines = unit_lines(&render_message(&message));
        assert_eq!(
            plain(&lines),
            vec!["ASSISTANT", "→ ls", "│ not json", "tokens: 12"]
        );
    }

    #[test]
    fn test_control_characters_are_neutralized() {
        let message = serde_json::from_value(json!({"role": "user", "content": "a\u{1b}[2Jb"})).unwrap();
        let lines = unit_lines(&render_message(&message));
        assert_eq!(plain(&lines)[1], "a\u{fffd}[2Jb");
    }

    #[test]
    fn test_max_scroll_counts_wrapped_rows() {
        let trace: Trace = serde_json::from_value(json!({"id": "t", "messages": [
            {"role": "assistant", "content": "a".repeat(200)}
        ]}))
        .unwrap();
        let view = project(&trace, UnknownRolePolicy::Drop);
        let paragraph = lane_paragraph(&view.output);

        // tag row plus 200 columns broken at 10 per row
        assert_eq!(max_scroll(&paragraph, Rect::new(0, 0, 10, 5)), 16);
        assert_eq!(max_scroll(&paragraph, Rect::new(0, 0, 400, 5)), 0);
        assert_eq!(max_scroll(&paragraph, Rect::default()), 0);
    }

    #[test]
    fn test_placeholder_lane() {
        let trace: Trace = serde_json::from_value(json!({"id": "t", "messages": []})).unwrap();
        let view = project(&trace, UnknownRolePolicy::Drop);
        let text = lane_text(&view.output);
        assert_eq!(plain(&text.lines), vec!["No output messages"]);
    }
}
