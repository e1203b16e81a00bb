//! Boundary to the external structured-markup parser (html5ever).
//!
//! View templates and converted content fragments are HTML. This module is
//! the only place that touches the parser's types: it parses documents and
//! fragments into an rcdom tree plus a best-effort list of parse errors,
//! reads attributes, computes structural paths for unnamed view nodes, and
//! serializes trees back to markup, optionally leaving out a set of
//! nodes, which is how extracted view regions are excised from their
//! parent's residual template text.
//!
//! html5ever reports recoverable parse errors as messages without source
//! positions; callers turn them into diagnostics with line 0 ("no specific
//! line"). Parsing never fails outright: a best-effort tree is always
//! produced, malformed input included.

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tokenizer::TokenizerOpts;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, parse_document, parse_fragment};
use markup5ever::{QualName, local_name, namespace_url, ns};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::collections::HashMap;
use std::rc::Rc;

/// A parsed tree and whatever recoverable errors the parser noticed along
/// the way. `root` is the `#document` node.
pub struct ParsedMarkup {
    pub root: Handle,
    pub errors: Vec<String>,
}

fn parse_opts() -> ParseOpts {
    // exact_errors buys descriptive messages instead of the default
    // one-word ones; this parser is only ever fed template-sized inputs.
    ParseOpts {
        tokenizer: TokenizerOpts {
            exact_errors: true,
            ..Default::default()
        },
        tree_builder: TreeBuilderOpts {
            exact_errors: true,
            ..Default::default()
        },
    }
}

/// Parse a full document (a view template).
pub fn parse(text: &str) -> ParsedMarkup {
    let dom = parse_document(RcDom::default(), parse_opts()).one(StrTendril::from_slice(text));
    collect(dom)
}

/// Parse a fragment in body context (converted content markup).
pub fn parse_body_fragment(text: &str) -> ParsedMarkup {
    let dom = parse_fragment(
        RcDom::default(),
        parse_opts(),
        QualName::new(None, ns!(html), local_name!("body")),
        Vec::new(),
    )
    .one(StrTendril::from_slice(text));
    collect(dom)
}

fn collect(dom: RcDom) -> ParsedMarkup {
    let errors = dom
        .errors
        .into_iter()
        .map(|error| error.into_owned())
        .collect();
    ParsedMarkup {
        root: dom.document,
        errors,
    }
}

/// The element wrapping a parsed fragment's nodes. Fragment parsing nests
/// everything under a synthetic `<html>` element.
pub fn fragment_root(document: &Handle) -> Handle {
    document
        .children
        .borrow()
        .first()
        .cloned()
        .unwrap_or_else(|| document.clone())
}

/// Local tag name of an element node.
pub fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref().to_string()),
        _ => None,
    }
}

/// Value of the named attribute on an element node.
pub fn attribute(node: &Handle, attribute_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == attribute_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

fn set_attribute(node: &Handle, attribute_name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        if let Some(attr) = attrs
            .borrow_mut()
            .iter_mut()
            .find(|attr| attr.name.local.as_ref() == attribute_name)
        {
            attr.value = StrTendril::from_slice(value);
        }
    }
}

/// XPath-like structural path of `node` within the tree under `root`, used
/// as a diagnostic label for view nodes without an explicit name. Returns
/// an empty string when `node` is not under `root`.
pub fn structural_path(root: &Handle, node: &Handle) -> String {
    fn descend(current: &Handle, target: &Handle, path: &mut String) -> bool {
        if Rc::ptr_eq(current, target) {
            return true;
        }
        let mut seen: HashMap<String, usize> = HashMap::new();
        for child in current.children.borrow().iter() {
            let segment = element_name(child).map(|name| {
                let count = seen.entry(name.clone()).or_insert(0);
                *count += 1;
                format!("/{}[{}]", name, *count)
            });
            let rollback = path.len();
            if let Some(segment) = &segment {
                path.push_str(segment);
            }
            if descend(child, target, path) {
                return true;
            }
            path.truncate(rollback);
        }
        false
    }
    let mut path = String::new();
    descend(root, node, &mut path);
    path
}

// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

// Elements whose text children are emitted without entity escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Serialize the markup inside `node` (its children, not the node itself),
/// leaving out any subtree whose root is listed in `excise`.
pub fn inner_markup(node: &Handle, excise: &[Handle]) -> String {
    let mut out = String::new();
    for child in node.children.borrow().iter() {
        write_node(child, excise, false, &mut out);
    }
    out
}

fn write_node(node: &Handle, excise: &[Handle], raw_text: bool, out: &mut String) {
    if excise.iter().any(|skipped| Rc::ptr_eq(skipped, node)) {
        return;
    }
    match &node.data {
        NodeData::Document => {
            for child in node.children.borrow().iter() {
                write_node(child, excise, false, out);
            }
        }
        NodeData::Doctype { name, .. } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text { contents } => {
            let text = contents.borrow();
            if raw_text {
                out.push_str(&text);
            } else {
                escape_text(&text, out);
            }
        }
        NodeData::Comment { contents } => {
            out.push_str("<!--");
            out.push_str(contents);
            out.push_str("-->");
        }
        NodeData::Element { name, attrs, .. } => {
            let tag = name.local.as_ref();
            out.push('<');
            out.push_str(tag);
            for attr in attrs.borrow().iter() {
                out.push(' ');
                out.push_str(attr.name.local.as_ref());
                out.push_str("=\"");
                escape_attribute(&attr.value, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag) {
                return;
            }
            let raw = RAW_TEXT_ELEMENTS.contains(&tag);
            for child in node.children.borrow().iter() {
                write_node(child, excise, raw, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeData::ProcessingInstruction { .. } => {}
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}

/// True for link targets the pipeline may own: not empty, not an in-page
/// anchor, not an external URL.
pub fn is_internal_target(href: &str) -> bool {
    !(href.is_empty()
        || href.starts_with('#')
        || href.starts_with("http://")
        || href.starts_with("https://"))
}

/// Rewrite internal `<a href>` targets ending in `from_ext` to `to_ext`
/// throughout a converted fragment. Covers both links the converter
/// produced from markdown and anchors that came through as raw inline
/// HTML, since by this point they are all markup.
pub fn rewrite_link_extensions(fragment: &str, from_ext: &str, to_ext: &str) -> String {
    if fragment.is_empty() {
        return String::new();
    }
    let parsed = parse_body_fragment(fragment);
    let root = fragment_root(&parsed.root);
    rewrite_anchors(&root, from_ext, to_ext);
    inner_markup(&root, &[])
}

fn rewrite_anchors(node: &Handle, from_ext: &str, to_ext: &str) {
    if element_name(node).as_deref() == Some("a") {
        if let Some(href) = attribute(node, "href") {
            if is_internal_target(&href) && href.ends_with(from_ext) {
                let rewritten =
                    format!("{}{}", &href[..href.len() - from_ext.len()], to_ext);
                set_attribute(node, "href", &rewritten);
            }
        }
    }
    for child in node.children.borrow().iter() {
        rewrite_anchors(child, from_ext, to_ext);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_descendant_named(node: &Handle, name: &str) -> Option<Handle> {
        if element_name(node).as_deref() == Some(name) {
            return Some(node.clone());
        }
        for child in node.children.borrow().iter() {
            if let Some(found) = first_descendant_named(child, name) {
                return Some(found);
            }
        }
        None
    }

    #[test]
    fn well_formed_document_parses_cleanly() {
        let parsed = parse("<!DOCTYPE html><html><head></head><body><p>hi</p></body></html>");
        assert!(parsed.errors.is_empty(), "unexpected: {:?}", parsed.errors);
    }

    #[test]
    fn malformed_document_yields_errors_and_a_tree() {
        // No doctype: recoverable, reported, and the tree is still built.
        let parsed = parse("<html><body><p>hi</p></body></html>");
        assert!(!parsed.errors.is_empty());
        assert!(first_descendant_named(&parsed.root, "p").is_some());
    }

    #[test]
    fn attributes_are_readable() {
        let parsed = parse(r#"<!DOCTYPE html><html><body><div name="page" applies-to="*.md"></div></body></html>"#);
        let div = first_descendant_named(&parsed.root, "div").unwrap();
        assert_eq!(attribute(&div, "name").as_deref(), Some("page"));
        assert_eq!(attribute(&div, "applies-to").as_deref(), Some("*.md"));
        assert_eq!(attribute(&div, "missing"), None);
    }

    #[test]
    fn inner_markup_round_trips_structure() {
        let parsed = parse(
            "<!DOCTYPE html><html><head><title>t</title></head><body><p>a &amp; b</p></body></html>",
        );
        let markup = inner_markup(&parsed.root, &[]);
        assert_eq!(
            markup,
            "<!DOCTYPE html><html><head><title>t</title></head><body><p>a &amp; b</p></body></html>"
        );
    }

    #[test]
    fn inner_markup_excises_listed_nodes() {
        let parsed = parse(
            "<!DOCTYPE html><html><body><p>keep</p><section><p>gone</p></section><p>also kept</p></body></html>",
        );
        let section = first_descendant_named(&parsed.root, "section").unwrap();
        let markup = inner_markup(&parsed.root, &[section]);
        assert!(markup.contains("<p>keep</p><p>also kept</p>"));
        assert!(!markup.contains("gone"));
    }

    #[test]
    fn void_elements_serialize_without_closing_tags() {
        let parsed = parse(r#"<!DOCTYPE html><html><head><meta charset="utf-8"></head><body><br></body></html>"#);
        let markup = inner_markup(&parsed.root, &[]);
        assert!(markup.contains(r#"<meta charset="utf-8">"#));
        assert!(markup.contains("<br>"));
        assert!(!markup.contains("</br>"));
    }

    #[test]
    fn placeholder_markers_survive_the_round_trip() {
        let parsed = parse("<!DOCTYPE html><html><body><title>{{title}}</title>{{content}}</body></html>");
        let markup = inner_markup(&parsed.root, &[]);
        assert!(markup.contains("{{title}}"));
        assert!(markup.contains("{{content}}"));
    }

    #[test]
    fn structural_path_counts_same_named_siblings() {
        let parsed = parse(
            "<!DOCTYPE html><html><body><div></div><div><span>x</span></div></body></html>",
        );
        let span = first_descendant_named(&parsed.root, "span").unwrap();
        assert_eq!(
            structural_path(&parsed.root, &span),
            "/html[1]/body[1]/div[2]/span[1]"
        );
    }

    #[test]
    fn link_extensions_rewrite_only_internal_markup_targets() {
        let fragment = concat!(
            r#"<p><a href="other.md">in</a>"#,
            r#" <a href="https://example.com/x.md">out</a>"#,
            r##" <a href="#frag">anchor</a>"##,
            r#" <a href="plain.txt">txt</a></p>"#,
        );
        let rewritten = rewrite_link_extensions(fragment, ".md", ".html");
        assert!(rewritten.contains(r#"<a href="other.html">in</a>"#));
        assert!(rewritten.contains(r#"<a href="https://example.com/x.md">out</a>"#));
        assert!(rewritten.contains(r##"<a href="#frag">anchor</a>"##));
        assert!(rewritten.contains(r#"<a href="plain.txt">txt</a>"#));
    }

    #[test]
    fn raw_inline_html_anchors_are_rewritten_too() {
        let rewritten =
            rewrite_link_extensions(r#"<div><a href="deep/page.md">go</a></div>"#, ".md", ".html");
        assert!(rewritten.contains(r#"href="deep/page.html""#));
    }
}
