//! The content pipeline: classify, convert, resolve, apply, re-wrap.
//!
//! Each markdown document goes through the same stations. An
//! empty-or-whitespace document is a *collection placeholder* standing for
//! its non-empty sibling documents; anything else is *singleton content*
//! and gets converted to an HTML fragment, with internal links validated
//! against the content store and rewritten to the output extension. The
//! resolved view renders the fragment, and then every ancestor view up to
//! the root re-wraps the result, body inside page chrome inside site
//! shell, without the renderer knowing anything about layout.

use crate::diagnostics::{Diagnostic, Severity};
use crate::markup;
use crate::store::{ItemId, Store};
use crate::views::{self, Classification, View, ViewKind};
use pulldown_cmark::{Event, Options, Parser, Tag, html};

/// Extension identifying content documents.
pub const CONTENT_EXTENSION: &str = ".md";
/// Extension rendered documents are written under.
pub const OUTPUT_EXTENSION: &str = ".html";

/// The markdown dialect: tables, footnotes, strikethrough, and YAML
/// front-matter blocks (kept out of the output).
fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

/// Decide what a document is. The collection predicate keeps non-empty
/// markdown siblings under the placeholder's directory prefix, in
/// identifier order; the placeholder itself is empty and so never a
/// member.
pub fn classify(
    content: &dyn Store,
    id: &ItemId,
    raw: &str,
    sink: &mut dyn FnMut(Diagnostic),
) -> Classification {
    if raw.trim().is_empty() {
        let members = content
            .enumerate_under(&id.parent())
            .into_iter()
            .filter(|member| member.extension() == Some(CONTENT_EXTENSION))
            .filter(|member| {
                matches!(content.read_to_string(member), Ok(text) if !text.trim().is_empty())
            })
            .collect();
        return Classification::Collection {
            id: id.clone(),
            members,
        };
    }
    Classification::Singleton {
        id: id.clone(),
        markup: convert(content, id, raw, sink),
    }
}

/// Convert raw markdown to an HTML fragment. While converting, every
/// internal link target ending in the content extension is resolved
/// against the source document's directory; targets missing from the
/// store are reported and still rewritten optimistically; the caret
/// points at the URL in the markdown source. All internal `.md` targets
/// come out as `.html`.
pub fn convert(
    content: &dyn Store,
    source: &ItemId,
    raw: &str,
    sink: &mut dyn FnMut(Diagnostic),
) -> String {
    let mut events = Vec::new();
    for (event, range) in Parser::new_ext(raw, markdown_options()).into_offset_iter() {
        if let Event::Start(Tag::Link { dest_url, .. }) = &event {
            let dest = dest_url.to_string();
            if markup::is_internal_target(&dest) && dest.ends_with(CONTENT_EXTENSION) {
                let target = source.parent().join(&dest);
                if !content.exists(&target) {
                    // Point at the URL itself, not the whole link construct.
                    let span = match raw[range.clone()].find(&dest) {
                        Some(at) => range.start + at..range.start + at + dest.len(),
                        None => range.clone(),
                    };
                    sink(Diagnostic::spanned(
                        Severity::Error,
                        source,
                        raw,
                        span,
                        format!("unresolved link target {target}"),
                    ));
                }
            }
        }
        events.push(event);
    }
    let mut fragment = String::new();
    html::push_html(&mut fragment, events.into_iter());
    markup::rewrite_link_extensions(&fragment, CONTENT_EXTENSION, OUTPUT_EXTENSION)
}

/// Render one content document to its final output text.
pub fn render_document(
    content: &dyn Store,
    root: &View,
    id: &ItemId,
    raw: &str,
    sink: &mut dyn FnMut(Diagnostic),
) -> String {
    let classification = classify(content, id, raw, sink);
    let chain = views::resolve(root, &classification, sink);
    let (resolved, ancestors) = chain
        .split_last()
        .expect("a resolution chain is never empty");
    let mut rendered = apply_view(content, root, *resolved, &classification, sink);
    for ancestor in ancestors.iter().rev() {
        let wrapped = ancestor.body.render(|field| match field {
            "title" => classification.title(),
            "content" => rendered.clone(),
            _ => "?".to_string(),
        });
        rendered = wrapped;
    }
    rendered
}

/// Render the resolved view itself: bind `title` and `content` (unknown
/// fields render as `"?"`).
fn apply_view(
    content: &dyn Store,
    root: &View,
    view: &View,
    classification: &Classification,
    sink: &mut dyn FnMut(Diagnostic),
) -> String {
    let content_value = match classification {
        Classification::Singleton { markup, .. } => markup.clone(),
        Classification::Collection { id, members } => {
            collection_content(content, root, view, id, members, sink)
        }
    };
    view.body.render(|field| match field {
        "title" => classification.title(),
        "content" => content_value.clone(),
        _ => "?".to_string(),
    })
}

/// The `content` of a collection. When the resolved view is a collection
/// view that names a usable element view, each member renders through it
/// and the results concatenate in member order; otherwise the members
/// degrade to a plain name listing.
fn collection_content(
    content: &dyn Store,
    root: &View,
    view: &View,
    id: &ItemId,
    members: &[ItemId],
    sink: &mut dyn FnMut(Diagnostic),
) -> String {
    if let ViewKind::Collection { element_view } = &view.kind {
        if !element_view.is_empty() {
            match root.find_named(element_view) {
                Some(element) => return render_members(content, element, members, sink),
                None => sink(Diagnostic::new(
                    Severity::Error,
                    id,
                    format!("no view named \"{element_view}\" exists for the members of {id}"),
                )),
            }
        }
    }
    members
        .iter()
        .map(|member| member.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_members(
    content: &dyn Store,
    element: &View,
    members: &[ItemId],
    sink: &mut dyn FnMut(Diagnostic),
) -> String {
    let mut out = String::new();
    for member in members {
        let raw = match content.read_to_string(member) {
            Ok(raw) => raw,
            Err(error) => {
                sink(Diagnostic::new(
                    Severity::Error,
                    member,
                    format!("cannot read collection member: {error}"),
                ));
                continue;
            }
        };
        // Members are non-empty by the collection predicate, so each one is
        // ordinary singleton content.
        let member_markup = convert(content, member, &raw, sink);
        out.push_str(&element.body.render(|field| match field {
            "title" => member.display_name().to_string(),
            "content" => member_markup.clone(),
            _ => "?".to_string(),
        }));
    }
    out
}
