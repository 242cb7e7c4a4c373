//! Outline identifier scheme and display numbering.
//!
//! # Responsibility
//! - Compute dotted-decimal ids for new root, child and sibling nodes.
//! - Generate opaque ids for the default id strategy.
//! - Derive display outline numbers (`1`, `1.2`, ...) from tree position.
//!
//! # Invariants
//! - Scheme functions are pure and only inspect the slice they are given.
//! - `next_sibling_id` is local: it does not check later siblings for
//!   collisions. Hierarchical callers renumber the tree afterwards.
//! - Non-numeric segments count as `0`.

use crate::model::outline::OutlineNode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Strategy used to assign ids to newly inserted outline nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Random stable id. Outline numbers are computed from position.
    #[default]
    Opaque,
    /// Dotted-decimal id that doubles as the outline number.
    Hierarchical,
}

/// One id change produced by hierarchical renumbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdRename {
    /// Id the node carried before the edit.
    pub from: String,
    /// Id the node carries after the edit.
    pub to: String,
}

/// Renames produced by one renumbering pass. Must be applied atomically.
pub type RenameBatch = Vec<IdRename>;

/// Display number of one node, in pre-order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionNumber {
    /// Node id (opaque or hierarchical).
    pub id: String,
    /// Positional outline number, e.g. `2.1.3`.
    pub number: String,
    /// Node title at the time of numbering.
    pub title: String,
    /// Zero-based nesting depth.
    pub depth: usize,
}

/// Returns the id for a new root node: max leading number among roots + 1.
pub fn next_root_id(existing_roots: &[OutlineNode]) -> String {
    let max = existing_roots
        .iter()
        .map(|node| leading_number(&node.id))
        .max()
        .unwrap_or(0);
    max.saturating_add(1).to_string()
}

/// Returns `parent_id.N` where `N` is max last segment among children + 1.
pub fn next_child_id(parent_id: &str, existing_children: &[OutlineNode]) -> String {
    let max = existing_children
        .iter()
        .map(|node| last_segment(&node.id))
        .max()
        .unwrap_or(0);
    compose(Some(parent_id), max.saturating_add(1))
}

/// Returns the id for a node inserted right after `siblings[insert_after]`.
///
/// The number is the reference node's last segment + 1 under `parent_id`
/// (root level when `None`). Returns `None` when the index is out of range.
pub fn next_sibling_id(
    parent_id: Option<&str>,
    siblings: &[OutlineNode],
    insert_after: usize,
) -> Option<String> {
    let reference = siblings.get(insert_after)?;
    Some(compose(
        parent_id,
        last_segment(&reference.id).saturating_add(1),
    ))
}

/// Returns a fresh opaque node id.
pub fn opaque_id() -> String {
    Uuid::new_v4().to_string()
}

/// Returns the canonical id of the child at `index` (zero-based) under `parent`.
pub fn positional_id(parent: Option<&str>, index: usize) -> String {
    compose(parent, index as u64 + 1)
}

/// Computes positional outline numbers for every node in pre-order.
pub fn outline_numbers(roots: &[OutlineNode]) -> Vec<SectionNumber> {
    let mut numbers = Vec::new();
    collect_numbers(roots, None, 0, &mut numbers);
    numbers
}

fn collect_numbers(
    nodes: &[OutlineNode],
    prefix: Option<&str>,
    depth: usize,
    out: &mut Vec<SectionNumber>,
) {
    for (index, node) in nodes.iter().enumerate() {
        let number = positional_id(prefix, index);
        out.push(SectionNumber {
            id: node.id.clone(),
            number: number.clone(),
            title: node.title.clone(),
            depth,
        });
        collect_numbers(&node.children, Some(number.as_str()), depth + 1, out);
    }
}

fn compose(parent: Option<&str>, number: u64) -> String {
    match parent {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}.{number}"),
        _ => number.to_string(),
    }
}

fn last_segment(id: &str) -> u64 {
    leading_number(id.rsplit('.').next().unwrap_or(id))
}

fn leading_number(value: &str) -> u64 {
    let digits = value
        .trim_start()
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect::<String>();
    digits.parse().unwrap_or(0)
}
