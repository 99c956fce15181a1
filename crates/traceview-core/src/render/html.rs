//! Static HTML export of a reviewed trace collection

use super::classify::{RenderPlan, Segment};
use super::escape::escape_html;
use super::message::{DisplayUnit, ToolCallBlock};
use super::trace::{project, Lane, LaneEntry, UnknownRolePolicy};
use crate::models::Trace;

const STYLE: &str = r#"
body { font-family: -apple-system, system-ui, sans-serif; margin: 0; background: #f5f5f7; color: #1d1d1f; }
header { padding: 16px 24px; background: #fff; border-bottom: 1px solid #d2d2d7; }
.trace { margin: 24px; background: #fff; border-radius: 10px; border: 1px solid #d2d2d7; }
.trace-header { padding: 12px 16px; border-bottom: 1px solid #e5e5ea; display: flex; gap: 16px; align-items: baseline; }
.trace-meta { color: #6e6e73; font-size: 13px; }
.lanes { display: grid; grid-template-columns: 1fr 1fr; }
.lane { padding: 12px 16px; min-width: 0; }
.lane + .lane { border-left: 1px solid #e5e5ea; }
.lane-title { font-size: 12px; text-transform: uppercase; color: #6e6e73; margin-bottom: 8px; }
.message { margin-bottom: 12px; }
.message-role-tag { font-size: 11px; font-weight: 600; color: #6e6e73; margin-bottom: 4px; }
.message-body { white-space: pre-wrap; word-break: break-word; font-size: 14px; }
.message-body.is-code, .code-block, .tool-call-args { font-family: ui-monospace, Menlo, monospace; font-size: 12px; white-space: pre-wrap; }
.code-block { display: block; background: #f5f5f7; padding: 8px; border-radius: 6px; margin: 4px 0; }
.tool-call { border: 1px solid #e5e5ea; border-radius: 6px; padding: 8px; margin-top: 6px; }
.tool-call-name { font-weight: 600; font-family: ui-monospace, Menlo, monospace; }
.message-meta { color: #8e8e93; font-size: 11px; margin-top: 4px; }
.empty-col { color: #8e8e93; font-style: italic; }
.annotation { padding: 12px 16px; border-top: 1px solid #e5e5ea; white-space: pre-wrap; }
.annotation.is-empty { color: #8e8e93; font-style: italic; }
"#;

/// Render every trace with its lanes and annotation as one HTML document.
///
/// `annotation` returns the stored annotation for a trace id, `""` when none.
pub fn export_document<F>(traces: &[Trace], policy: UnknownRolePolicy, annotation: F) -> String
where
    F: Fn(&str) -> String,
{
    let reviewed = traces
        .iter()
        .filter(|t| !annotation(&t.id).trim().is_empty())
        .count();

    let mut html = String::with_capacity(traces.len() * 2048);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Trace review</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(&format!(
        "<header><strong>Trace review</strong> &mdash; {reviewed} / {} reviewed</header>\n",
        traces.len()
    ));

    if traces.is_empty() {
        html.push_str("<div class=\"empty-col\">No traces</div>\n");
    }

    for (idx, trace) in traces.iter().enumerate() {
        html.push_str(&render_trace(idx, traces.len(), trace, policy, &annotation(&trace.id)));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_trace(
    idx: usize,
    total: usize,
    trace: &Trace,
    policy: UnknownRolePolicy,
    annotation: &str,
) -> String {
    let view = project(trace, policy);
    let mut html = format!(
        "<section class=\"trace\" id=\"{}\">\n<div class=\"trace-header\"><strong>Trace {} of {}</strong><span class=\"trace-meta\">{}</span></div>\n<div class=\"lanes\">\n",
        escape_html(&trace.id),
        idx + 1,
        total,
        escape_html(&trace.meta_line()),
    );
    html.push_str(&render_lane(&view.input));
    html.push_str(&render_lane(&view.output));
    html.push_str("</div>\n");

    if annotation.trim().is_empty() {
        html.push_str("<div class=\"annotation is-empty\">No annotation</div>\n");
    } else {
        html.push_str(&format!(
            "<div class=\"annotation\">{}</div>\n",
            escape_html(annotation)
        ));
    }
    html.push_str("</section>\n");
    html
}

fn render_lane(lane: &Lane) -> String {
    let mut html = format!(
        "<div class=\"lane\">\n<div class=\"lane-title\">{}</div>\n",
        lane.side.title()
    );
    for entry in &lane.entries {
        match entry {
            LaneEntry::Message(unit) => html.push_str(&render_unit(unit)),
            LaneEntry::Placeholder(label) => html.push_str(&format!(
                "<div class=\"empty-col\">{}</div>\n",
                escape_html(label)
            )),
        }
    }
    html.push_str("</div>\n");
    html
}

/// One message as an HTML fragment
pub fn render_unit(unit: &DisplayUnit) -> String {
    let mut html = format!(
        "<div class=\"message msg-{}\">\n<div class=\"message-role-tag\">{}</div>\n",
        escape_html(unit.role.as_str()),
        escape_html(&unit.label)
    );
    if let Some(body) = &unit.body {
        html.push_str(&render_body(body));
    }
    for call in &unit.tool_calls {
        html.push_str(&render_tool_call(call));
    }
    if let Some(meta) = &unit.meta {
        html.push_str(&format!(
            "<div class=\"message-meta\">{}</div>\n",
            escape_html(meta)
        ));
    }
    html.push_str("</div>\n");
    html
}

fn render_body(plan: &RenderPlan) -> String {
    if let [Segment::Json(text)] = plan.segments.as_slice() {
        return format!(
            "<div class=\"message-body is-code\">{}</div>\n",
            escape_html(text)
        );
    }

    let mut inner = String::new();
    for segment in &plan.segments {
        match segment {
            Segment::Prose(text) => inner.push_str(&escape_html(text)),
            Segment::Code { text, .. } | Segment::Json(text) => inner.push_str(&format!(
                "<code class=\"code-block\">{}</code>",
                escape_html(text)
            )),
        }
    }
    format!("<div class=\"message-body\">{inner}</div>\n")
}

fn render_tool_call(call: &ToolCallBlock) -> String {
    format!(
        "<div class=\"tool-call\">\n<div class=\"tool-call-header\"><span class=\"tool-call-arrow\">&#8594;</span> <span class=\"tool-call-name\">{}</span></div>\n<div class=\"tool-call-args\">{}</div>\n</div>\n",
        escape_html(&call.name),
        escape_html(&call.arguments)
    )
}
