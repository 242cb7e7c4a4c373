//! Plain-text rendering of outlines and content summaries.

use paper_outline_core::{ContentStore, OutlineNode, OutlineTree, SectionStatus};
use std::collections::HashMap;

/// Renders the outline as an ASCII tree with positional section numbers.
///
/// Collapsed sections hide their children behind a `(+N)` marker.
///
/// ```text
/// Paper title
/// ├── 1 Introduction
/// │   └── 1.1 Background
/// └── 2 Design (+2)
/// ```
pub fn render_outline(tree: &OutlineTree, show_ids: bool) -> String {
    let numbers = tree
        .outline_numbers()
        .into_iter()
        .map(|section| (section.id, section.number))
        .collect::<HashMap<_, _>>();

    let mut output = String::new();
    output.push_str(if tree.title.trim().is_empty() {
        "(untitled)"
    } else {
        tree.title.as_str()
    });
    output.push('\n');

    let ctx = RenderContext {
        numbers: &numbers,
        show_ids,
    };
    for (i, node) in tree.nodes.iter().enumerate() {
        render_node(&mut output, &ctx, node, "", i + 1 == tree.nodes.len());
    }
    output
}

/// One line per section: number, status, text size and artifact counts.
pub fn render_content_summary(tree: &OutlineTree, store: &ContentStore) -> String {
    let mut output = String::new();
    for section in tree.outline_numbers() {
        let indent = "  ".repeat(section.depth);
        match store.entry(&section.id) {
            Some(entry) => output.push_str(&format!(
                "{indent}{} {} [{}] text={} figures={} tables={}\n",
                section.number,
                section.title,
                status_label(entry.status),
                entry.text.chars().count(),
                entry.figures.len(),
                entry.tables.len()
            )),
            None => output.push_str(&format!(
                "{indent}{} {} [untracked]\n",
                section.number, section.title
            )),
        }
    }
    output
}

struct RenderContext<'a> {
    numbers: &'a HashMap<String, String>,
    show_ids: bool,
}

fn render_node(
    output: &mut String,
    ctx: &RenderContext<'_>,
    node: &OutlineNode,
    prefix: &str,
    is_last: bool,
) {
    output.push_str(prefix);
    output.push_str(if is_last { "└── " } else { "├── " });
    if let Some(number) = ctx.numbers.get(&node.id) {
        output.push_str(number);
        output.push(' ');
    }
    output.push_str(&node.title);
    if ctx.show_ids {
        output.push_str(&format!(" [{}]", node.id));
    }
    if node.collapsed && !node.children.is_empty() {
        output.push_str(&format!(" (+{})", count_descendants(node)));
    }
    output.push('\n');

    if node.collapsed {
        return;
    }
    let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
    for (i, child) in node.children.iter().enumerate() {
        render_node(
            output,
            ctx,
            child,
            &child_prefix,
            i + 1 == node.children.len(),
        );
    }
}

fn count_descendants(node: &OutlineNode) -> usize {
    node.children
        .iter()
        .map(|child| 1 + count_descendants(child))
        .sum()
}

fn status_label(status: SectionStatus) -> &'static str {
    match status {
        SectionStatus::Planning => "planning",
        SectionStatus::Generated => "generated",
        SectionStatus::Partial => "partial",
        SectionStatus::Failed => "failed",
    }
}
