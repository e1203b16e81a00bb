//! CLI display of the built view tree and pass results.
//!
//! The view tree listing is the fastest way to see why a document picked
//! the view it did: every view with its kind and filter, indented under
//! its parent. Emitted at debug level by the engine after the build pass.

use crate::engine::RunReport;
use crate::views::{View, ViewKind};

/// The view tree as indented box-drawing lines, one view per line.
pub fn view_tree_lines(root: &View) -> Vec<String> {
    let mut lines = Vec::new();
    descend(root, "", "", &mut lines);
    lines
}

fn descend(view: &View, prefix: &str, child_prefix: &str, lines: &mut Vec<String>) {
    lines.push(format!("{prefix}{}", describe(view)));
    if let Some((last, rest)) = view.children.split_last() {
        for child in rest {
            descend(
                child,
                &format!("{child_prefix}├─ "),
                &format!("{child_prefix}│  "),
                lines,
            );
        }
        descend(
            last,
            &format!("{child_prefix}└─ "),
            &format!("{child_prefix}   "),
            lines,
        );
    }
}

fn describe(view: &View) -> String {
    match &view.kind {
        ViewKind::Shell => format!("{} (shell)", view.name),
        ViewKind::Content => format!(
            "{} (content, applies to {})",
            view.name,
            view.filter_pattern()
        ),
        ViewKind::Collection { element_view } => format!(
            "{} (collection of \"{element_view}\", applies to {})",
            view.name,
            view.filter_pattern()
        ),
    }
}

/// One-line pass summary in the `==>` style of the stage banners.
pub fn run_summary(report: &RunReport) -> String {
    format!(
        "==> {} documents rendered, {} copied through",
        report.rendered, report.copied
    )
}
