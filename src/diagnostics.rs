//! Structured diagnostics: severity-tagged, source-positioned, never thrown.
//!
//! A [`Diagnostic`] is a plain value describing a condition found while
//! building views or rendering content. Diagnostics are handed to a
//! caller-supplied sink (`&mut dyn FnMut(Diagnostic)`) and the run always
//! continues; severity is advisory metadata for the caller (typically the
//! CLI turning any `Error` into a non-zero exit status), not a control-flow
//! signal. Conditions that would indicate a bug in the engine itself are
//! asserted, not reported.

use crate::store::ItemId;
use std::fmt;
use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warn => "warning",
            Severity::Error => "error",
        })
    }
}

/// One reported condition, pointing at a source document and, when known,
/// a position within it. Line and column are 1-based; line 0 means the
/// condition has no specific line (some parsers do not report positions).
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub source: ItemId,
    pub line: usize,
    pub column: usize,
    /// Width of the highlighted span, in characters.
    pub length: usize,
    pub message: String,
    /// The offending source line, captured at construction so rendering
    /// needs no store access.
    line_text: Option<String>,
}

impl Diagnostic {
    /// A diagnostic with no specific position.
    pub fn new(severity: Severity, source: &ItemId, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            severity,
            source: source.clone(),
            line: 0,
            column: 0,
            length: 0,
            message: message.into(),
            line_text: None,
        }
    }

    /// A diagnostic pointing at a byte span of `text`, the source the
    /// condition was found in. Computes line, column, highlight length,
    /// and captures the source line.
    pub fn spanned(
        severity: Severity,
        source: &ItemId,
        text: &str,
        span: Range<usize>,
        message: impl Into<String>,
    ) -> Diagnostic {
        let start = span.start.min(text.len());
        let end = span.end.clamp(start, text.len());
        let (line, column) = line_col(text, start);
        let line_text = text.lines().nth(line - 1).unwrap_or("").to_string();
        Diagnostic {
            severity,
            source: source.clone(),
            line,
            column,
            length: text[start..end].chars().count().max(1),
            message: message.into(),
            line_text: Some(line_text),
        }
    }

    /// Render to the display form:
    ///
    /// ```text
    /// /post/index.md(3,7): unresolved link target /missing.md
    ///     see [here](missing.md) for more
    ///               ^^^^^^^^^^
    /// ```
    ///
    /// The caret block only appears when a specific line is known.
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "{}({},{}): {}",
            self.source, self.line, self.column, self.message
        );
        if self.line > 0 {
            if let Some(line_text) = &self.line_text {
                out.push_str("\n    ");
                out.push_str(line_text);
                out.push_str("\n    ");
                out.push_str(&" ".repeat(self.column.saturating_sub(1)));
                out.push_str(&"^".repeat(self.length.max(1)));
            }
        }
        out
    }
}

/// Map a byte offset into 1-based (line, column). Columns count characters
/// from the start of the line, so the caret lines up under multi-byte text.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|at| at + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
