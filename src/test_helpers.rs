//! Shared test utilities for the leafpress test suite.
//!
//! Fixture builders for in-memory stores and the one template every other
//! test would otherwise re-declare, plus diagnostic assertions that fail
//! with the rendered diagnostics instead of a bare count.

use crate::diagnostics::Diagnostic;
use crate::store::MemStore;

/// A minimal site shell: chrome with `{{title}}` and `{{content}}`, no
/// nested view regions.
pub fn shell_template() -> &'static str {
    concat!(
        "<!DOCTYPE html><html><head><title>{{title}}</title></head>",
        "<body>{{content}}</body></html>",
    )
}

/// Build a [`MemStore`] from `(identifier, text)` pairs.
pub fn store(items: &[(&str, &str)]) -> MemStore {
    let mut built = MemStore::new();
    for (id, text) in items {
        built.insert_text(id, text);
    }
    built
}

/// Assert the sink stayed empty, printing every diagnostic when it did not.
pub fn assert_no_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    let rendered: Vec<String> = diagnostics.iter().map(|d| d.to_text()).collect();
    panic!(
        "expected no diagnostics, got {}:\n{}",
        diagnostics.len(),
        rendered.join("\n")
    );
}
