//! Escaping of leaf text fragments for each output surface.
//!
//! Escaping is always the last step before a fragment lands in a display
//! surface, applied uniformly to prose, code, tool arguments and labels.

use std::borrow::Cow;

/// Escape text for insertion into HTML element content or attribute values.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(|ch: char| matches!(ch, '&' | '<' | '>' | '"' | '\'')) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Neutralize control characters so trace content cannot drive the terminal.
///
/// Newlines and tabs survive; tabs are expanded to spaces because the
/// terminal renderer does not interpret them.
pub fn sanitize_terminal(text: &str) -> Cow<'_, str> {
    if !text.chars().any(|ch| ch.is_control() && ch != '\n') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => out.push('\n'),
            '\t' => out.push_str("    "),
            '\r' => {}
            c if c.is_control() => out.push(char::REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
