//! Helpers for putting user-supplied text (item names, descriptions, command
//! arguments, file paths) into log lines without breaking them across lines.

use std::fmt::Write;

/// Longest preview emitted for a single value.
pub const MAX_PREVIEW: usize = 160;

/// Escape a value for single-line logging.
///
/// Backslashes, newlines, carriage returns and tabs are written as their escape
/// sequences and other control characters as `\xNN`. Values longer than
/// [`MAX_PREVIEW`] characters are cut and end with `…`.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 4);
    let mut chars = s.chars();
    for ch in chars.by_ref().take(MAX_PREVIEW) {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}
