//! One full publishing pass: template tree in, rendered tree out.
//!
//! The pass is single-threaded and strictly sequential. Pass one walks the
//! template store, building the view tree from `.html` documents and
//! copying everything else through byte-for-byte. Pass two walks the
//! content store in identifier order: `.md` documents render through the
//! view tree into `.html` outputs, anything else copies through unchanged,
//! and documents whose leaf name starts with `_` are left out entirely.
//!
//! Diagnostics never stop the pass; every content document produces an
//! output, degraded if necessary. Only storage failures (a tree that
//! cannot be read or written at all) abort the run.

use crate::diagnostics::Diagnostic;
use crate::output;
use crate::render;
use crate::store::Store;
use crate::views::{self, TEMPLATE_EXTENSION};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// What a pass did, for the CLI summary.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Markdown documents rendered through the view tree.
    pub rendered: usize,
    /// Documents copied through unchanged (from either tree).
    pub copied: usize,
}

/// Run one full pass. Diagnostics go to `sink`; severity is the caller's
/// to interpret.
pub fn run(
    content: &dyn Store,
    templates: &dyn Store,
    output_store: &mut dyn Store,
    sink: &mut dyn FnMut(Diagnostic),
) -> Result<RunReport, EngineError> {
    let mut report = RunReport::default();

    let mut template_documents = Vec::new();
    for id in templates.enumerate() {
        if id.extension() == Some(TEMPLATE_EXTENSION) {
            template_documents.push((id.clone(), templates.read_to_string(&id)?));
        } else {
            output_store.write(&id, &templates.read(&id)?)?;
            report.copied += 1;
        }
    }
    let root = views::build_views(&template_documents, sink);
    for line in output::view_tree_lines(&root) {
        log::debug!("{line}");
    }

    for id in content.enumerate() {
        if id.leaf().starts_with('_') {
            continue;
        }
        if id.extension() != Some(render::CONTENT_EXTENSION) {
            output_store.write(&id, &content.read(&id)?)?;
            report.copied += 1;
            continue;
        }
        let raw = content.read_to_string(&id)?;
        let rendered = render::render_document(content, &root, &id, &raw, sink);
        let output_id = id.with_extension(render::OUTPUT_EXTENSION);
        output_store.write(&output_id, rendered.as_bytes())?;
        log::debug!("rendered {id} -> {output_id}");
        report.rendered += 1;
    }

    Ok(report)
}
