//! The view tree: extraction from template documents and resolution.
//!
//! A view is a named template node with an applicability filter. Template
//! authors mark regions of their HTML with `<content-view>` and
//! `<collection-view>` tags; the builder extracts each tagged region into
//! an immutable [`View`] whose body is the region's *residual* markup,
//! the markup left after every nested view tag has been excised, parsed
//! as a placeholder template. Extraction is a pure two-phase affair: the
//! parsed document is never mutated, and the resulting tree is read-only
//! for the rest of the run.
//!
//! Every template document becomes one top-level *shell* view (its whole
//! document, applicable to anything), and all shells hang off a single
//! synthetic root shell that renders content bare. The root is what makes
//! resolution total: the walk can always stop somewhere, so there is no
//! "view not found" error path at all. Document shells being applicable to
//! collections as well as singletons is what lets resolution reach a
//! `<collection-view>` nested inside a template at all.

use crate::diagnostics::{Diagnostic, Severity};
use crate::markup;
use crate::store::ItemId;
use crate::template::Template;
use markup5ever_rcdom::Handle;
use regex::Regex;

/// Extension identifying template documents in the template tree.
pub const TEMPLATE_EXTENSION: &str = ".html";

// Tag and attribute vocabulary shared by the builder and the renderer.
pub const CONTENT_VIEW_TAG: &str = "content-view";
pub const COLLECTION_VIEW_TAG: &str = "collection-view";
pub const NAME_ATTRIBUTE: &str = "name";
pub const APPLIES_TO_ATTRIBUTE: &str = "applies-to";
pub const ELEMENT_VIEW_ATTRIBUTE: &str = "element-view";

/// What kind of document a view can render.
#[derive(Debug)]
pub enum ViewKind {
    /// Chrome around anything: applicable to every classification. Used
    /// for the synthetic root and for each template document's top level,
    /// so resolution needs no special fallback object and collections can
    /// descend into a document's nested views.
    Shell,
    /// Renders one document.
    Content,
    /// Renders a listing; each member renders through the view named here
    /// (empty when the template omitted the required attribute).
    Collection { element_view: String },
}

/// A node in the view tree. Built once per run, immutable thereafter.
#[derive(Debug)]
pub struct View {
    /// Diagnostic label: the `name` attribute, or a structural path when
    /// absent. Not required to be unique.
    pub name: String,
    pub kind: ViewKind,
    applies_to: Regex,
    pub children: Vec<View>,
    pub body: Template,
}

/// What a content document turned out to be, decided at render time.
#[derive(Debug)]
pub enum Classification {
    /// A document with actual content, already converted to markup.
    Singleton { id: ItemId, markup: String },
    /// An empty placeholder document standing for its non-empty siblings.
    Collection { id: ItemId, members: Vec<ItemId> },
}

impl Classification {
    pub fn id(&self) -> &ItemId {
        match self {
            Classification::Singleton { id, .. } | Classification::Collection { id, .. } => id,
        }
    }

    /// The string applicability filters match against: the identifier,
    /// suffixed with `[]` for collections.
    pub fn type_string(&self) -> String {
        match self {
            Classification::Singleton { id, .. } => id.as_str().to_string(),
            Classification::Collection { id, .. } => format!("{id}[]"),
        }
    }

    /// Display title. Without front-matter metadata in scope, the document
    /// names itself.
    pub fn title(&self) -> String {
        match self {
            Classification::Singleton { id, .. } => id.display_name().to_string(),
            Classification::Collection { id, .. } => format!("{}[]", id.display_name()),
        }
    }
}

impl View {
    pub fn is_applicable_to(&self, classification: &Classification) -> bool {
        match (&self.kind, classification) {
            (ViewKind::Shell, _)
            | (ViewKind::Content, Classification::Singleton { .. })
            | (ViewKind::Collection { .. }, Classification::Collection { .. }) => {
                self.applies_to.is_match(&classification.type_string())
            }
            _ => false,
        }
    }

    /// First tagged view with the given name, in document order over the
    /// whole tree. Shells (the root and document top levels) are not
    /// addressable by name.
    pub fn find_named(&self, name: &str) -> Option<&View> {
        if self.name == name && !matches!(self.kind, ViewKind::Shell) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_named(name))
    }

    /// The filter pattern, for listings and logs.
    pub fn filter_pattern(&self) -> &str {
        self.applies_to.as_str()
    }
}

fn match_all() -> Regex {
    Regex::new(".*").unwrap()
}

/// Build the view tree from all template documents, in document order.
pub fn build_views(
    templates: &[(ItemId, String)],
    sink: &mut dyn FnMut(Diagnostic),
) -> View {
    let children = templates
        .iter()
        .map(|(id, text)| build_document_view(id, text, sink))
        .collect();
    View {
        name: "root".to_string(),
        kind: ViewKind::Shell,
        applies_to: match_all(),
        children,
        body: Template::parse("{{content}}"),
    }
}

/// One template document becomes one shell view: the document itself,
/// applicable to anything, with every tagged region extracted out of its
/// body.
fn build_document_view(id: &ItemId, text: &str, sink: &mut dyn FnMut(Diagnostic)) -> View {
    let parsed = markup::parse(text);
    for error in &parsed.errors {
        sink(Diagnostic::new(Severity::Error, id, error.clone()));
    }
    let (children, consumed) = extract_views(&parsed.root, id, &parsed.root, sink);
    View {
        name: id.as_str().to_string(),
        kind: ViewKind::Shell,
        applies_to: match_all(),
        children,
        body: Template::parse(&markup::inner_markup(&parsed.root, &consumed)),
    }
}

/// Walk the subtree under `node`, collecting every view-tagged descendant
/// as a child view of the nearest enclosing view. Returns those views plus
/// the handles consumed from *this* level's residual markup (view nodes
/// deeper inside a consumed subtree disappear along with it).
fn extract_views(
    node: &Handle,
    template_id: &ItemId,
    document: &Handle,
    sink: &mut dyn FnMut(Diagnostic),
) -> (Vec<View>, Vec<Handle>) {
    let mut views = Vec::new();
    let mut consumed = Vec::new();
    for child in node.children.borrow().iter() {
        match markup::element_name(child).as_deref() {
            Some(tag @ (CONTENT_VIEW_TAG | COLLECTION_VIEW_TAG)) => {
                consumed.push(child.clone());
                let (grandchildren, inner_consumed) =
                    extract_views(child, template_id, document, sink);
                views.push(build_view(
                    child,
                    tag,
                    grandchildren,
                    &inner_consumed,
                    template_id,
                    document,
                    sink,
                ));
            }
            _ => {
                let (nested_views, nested_consumed) =
                    extract_views(child, template_id, document, sink);
                views.extend(nested_views);
                consumed.extend(nested_consumed);
            }
        }
    }
    (views, consumed)
}

fn build_view(
    node: &Handle,
    tag: &str,
    children: Vec<View>,
    consumed: &[Handle],
    template_id: &ItemId,
    document: &Handle,
    sink: &mut dyn FnMut(Diagnostic),
) -> View {
    let name = markup::attribute(node, NAME_ATTRIBUTE)
        .unwrap_or_else(|| markup::structural_path(document, node));
    let applies_to = compile_filter(
        markup::attribute(node, APPLIES_TO_ATTRIBUTE).as_deref(),
        template_id,
        &name,
        sink,
    );
    let kind = if tag == CONTENT_VIEW_TAG {
        ViewKind::Content
    } else {
        let element_view = match markup::attribute(node, ELEMENT_VIEW_ATTRIBUTE) {
            Some(value) => value,
            None => {
                sink(Diagnostic::new(
                    Severity::Error,
                    template_id,
                    format!(
                        "collection view \"{name}\" is missing an '{ELEMENT_VIEW_ATTRIBUTE}' attribute"
                    ),
                ));
                String::new()
            }
        };
        ViewKind::Collection { element_view }
    };
    View {
        name,
        kind,
        applies_to,
        children,
        body: Template::parse(&markup::inner_markup(node, consumed)),
    }
}

/// Compile an `applies-to` attribute. `*` (and absence) matches all; a
/// leading `*.` means "ends with", a bare leading `*` means "contains";
/// anything else is taken as a regular expression. A pattern that fails to
/// compile degrades to match-all with an `Error` diagnostic.
fn compile_filter(
    value: Option<&str>,
    template_id: &ItemId,
    view_name: &str,
    sink: &mut dyn FnMut(Diagnostic),
) -> Regex {
    let Some(value) = value else {
        return match_all();
    };
    let pattern = if value == "*" {
        return match_all();
    } else if let Some(suffix) = value.strip_prefix("*.") {
        format!("{}$", regex::escape(&format!(".{suffix}")))
    } else if let Some(infix) = value.strip_prefix('*') {
        regex::escape(infix)
    } else {
        value.to_string()
    };
    match Regex::new(&pattern) {
        Ok(regex) => regex,
        Err(error) => {
            sink(Diagnostic::new(
                Severity::Error,
                template_id,
                format!("view \"{view_name}\": invalid '{APPLIES_TO_ATTRIBUTE}' pattern {value:?}: {error}"),
            ));
            match_all()
        }
    }
}

/// Resolve the chain of views for a classification: the root first, then
/// ever more specific applicable views, ending at the winner. Depth is
/// preference: a deeper applicable view beats its ancestors. Among
/// applicable siblings the first in document order wins, with a `Warn`
/// diagnostic naming all candidates. The chain is never empty and the
/// result is deterministic for a fixed tree and classification.
pub fn resolve<'a>(
    root: &'a View,
    classification: &Classification,
    sink: &mut dyn FnMut(Diagnostic),
) -> Vec<&'a View> {
    assert!(
        root.is_applicable_to(classification),
        "the root view must be applicable to every document"
    );
    let mut chain = vec![root];
    let mut current = root;
    loop {
        let applicable: Vec<&View> = current
            .children
            .iter()
            .filter(|child| child.is_applicable_to(classification))
            .collect();
        if applicable.len() > 1 {
            let names: Vec<&str> = applicable.iter().map(|view| view.name.as_str()).collect();
            sink(Diagnostic::new(
                Severity::Warn,
                classification.id(),
                format!(
                    "more than one view is applicable to {}: {}",
                    classification.type_string(),
                    names.join(", ")
                ),
            ));
        }
        match applicable.first() {
            Some(&child) => {
                chain.push(child);
                current = child;
            }
            None => break,
        }
    }
    chain
}
