//! # Leafpress
//!
//! A minimal static site generator for publishing a loosely-structured
//! tree of markdown documents (a personal knowledge base, a blog, a
//! digital garden) as a browsable hierarchy of HTML pages.
//!
//! The template tree is ordinary HTML with two additions: `{{name}}`
//! placeholders, and nested `<content-view>` / `<collection-view>` regions
//! with `applies-to` filters. Each content document finds the most
//! specific applicable view, renders through it, and then re-wraps
//! outward through every enclosing view up to the document shell. That
//! is how a page body ends up inside page chrome inside the site shell
//! without the renderer hardcoding any layout.
//!
//! # Architecture: Two-Pass Engine
//!
//! ```text
//! 1. templates/  →  view tree        (in memory, immutable for the run)
//! 2. content/    →  rendered dist/   (one document at a time, in order)
//! ```
//!
//! Nothing aborts the pass. Malformed templates, broken links, and
//! misconfigured views all degrade to a best-effort output plus a
//! [`diagnostics::Diagnostic`] delivered to a caller-supplied sink; the
//! CLI maps any `Error`-severity diagnostic to a non-zero exit status.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | Document identifiers and the store abstraction (`DirStore` on disk, `MemStore` in memory) |
//! | [`template`] | `{{name}}` placeholder templates: parse once, render per document |
//! | [`views`] | View extraction from template documents and most-specific-view resolution |
//! | [`render`] | Per-document pipeline: classify, convert markdown, validate links, apply views |
//! | [`engine`] | The two passes, stitched together over three stores |
//! | [`markup`] | Boundary to the HTML parser: lenient parsing, serialization, link rewriting |
//! | [`diagnostics`] | Severity-tagged, caret-rendered condition reports |
//! | [`config`] | Optional `leafpress.toml` fixing the tree locations |
//! | [`output`] | View-tree listing and pass summaries for the CLI |
//!
//! # Design Decisions
//!
//! ## Views Are Data, Not Code
//!
//! Templates are parsed at run time rather than compiled in. A site's
//! whole look lives in its template tree, so publishing a restyled site is
//! editing HTML files, not rebuilding a binary; the content/template/
//! output split is the product.
//!
//! ## Diagnostics Over Failures
//!
//! A knowledge base always has a broken link or a half-finished template
//! somewhere. Publishing must not be hostage to the worst document in the
//! tree, so every input-level problem is a diagnostic and every document
//! still produces output. Assertions are reserved for bugs in the engine
//! itself.
//!
//! ## Resolution Cannot Fail
//!
//! The view tree is rooted at a synthetic shell that is applicable to
//! every document and renders content bare. Fallback is therefore not a
//! special case in the resolver; it is just the shallowest answer.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod markup;
pub mod output;
pub mod render;
pub mod store;
pub mod template;
pub mod views;

#[cfg(test)]
pub(crate) mod test_helpers;
