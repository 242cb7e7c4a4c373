//! Outline tree model and structural edit operations.
//!
//! # Responsibility
//! - Own the nested section hierarchy of one paper outline.
//! - Provide find/insert/delete/move/rename operations over owned nodes.
//! - Report structural problems through `validate()` without mutating.
//!
//! # Invariants
//! - Every node is owned by exactly one child list (or the root list).
//! - Failed operations leave the tree unchanged.
//! - `move_node` never attaches a node below itself.
//! - In hierarchical mode ids are canonical positional numbers: switching to
//!   the strategy and every insert, delete and move renumber the tree, and
//!   changed ids are queued as one rename batch per pass, oldest first.

use crate::model::ids::{self, IdRename, IdStrategy, RenameBatch, SectionNumber};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One section of the outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    /// Unique node id. Also the content store key of this section.
    pub id: String,
    /// Section title. Must be non-blank before save.
    pub title: String,
    /// Owned subsections in document order.
    #[serde(default)]
    pub children: Vec<OutlineNode>,
    /// Display-only fold state.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub collapsed: bool,
}

impl OutlineNode {
    /// Creates a leaf node.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            children: Vec::new(),
            collapsed: false,
        }
    }

    /// Returns whether `id` is this node or any of its descendants.
    pub fn subtree_contains(&self, id: &str) -> bool {
        self.id == id || self.children.iter().any(|child| child.subtree_contains(id))
    }
}

/// Whole outline document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlineTree {
    /// Paper title shown above the outline.
    #[serde(default)]
    pub title: String,
    /// Root-level sections in document order.
    #[serde(default)]
    pub nodes: Vec<OutlineNode>,
    #[serde(skip)]
    id_strategy: IdStrategy,
    #[serde(skip)]
    pending_renames: Vec<RenameBatch>,
}

impl PartialEq for OutlineTree {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.nodes == other.nodes
    }
}

impl Eq for OutlineTree {}

/// Immediate container of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocation {
    /// Parent id, `None` for root-level nodes.
    pub parent_id: Option<String>,
    /// Index inside the parent's child list.
    pub index: usize,
}

/// One structural problem found by `OutlineTree::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// The same id occurs more than once.
    DuplicateId { id: String },
    /// Title is blank after trim.
    EmptyTitle { id: String },
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId { id } => write!(f, "duplicate node id: {id}"),
            Self::EmptyTitle { id } => write!(f, "node {id} has an empty title"),
        }
    }
}

/// Aggregated validation result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns `true` when no issue was found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages = self
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>();
        write!(f, "{}", messages.join(", "))
    }
}

/// Errors from structural outline operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineError {
    /// Referenced node id is absent from the tree.
    NodeNotFound(String),
    /// Source and target of a move are the same node.
    SelfMove(String),
    /// Move target lies inside the subtree being moved.
    CyclicMove { source_id: String, target_id: String },
}

impl Display for OutlineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "outline node not found: {id}"),
            Self::SelfMove(id) => write!(f, "cannot move node {id} onto itself"),
            Self::CyclicMove {
                source_id,
                target_id,
            } => write!(
                f,
                "cannot move node {source_id} under its own descendant {target_id}"
            ),
        }
    }
}

impl Error for OutlineError {}

impl OutlineTree {
    /// Creates an empty outline with the default id strategy.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Returns this tree with the given id strategy.
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.set_id_strategy(strategy);
        self
    }

    pub fn id_strategy(&self) -> IdStrategy {
        self.id_strategy
    }

    /// Switches the id strategy.
    ///
    /// Switching to `Hierarchical` renumbers a loaded tree to canonical
    /// positional ids and queues the renames like any structural edit.
    pub fn set_id_strategy(&mut self, strategy: IdStrategy) {
        self.id_strategy = strategy;
        if strategy == IdStrategy::Hierarchical {
            self.renumber(None);
        }
    }

    /// Walks every node and reports duplicate ids and blank titles.
    pub fn validate(&self) -> ValidationReport {
        let mut seen = HashSet::new();
        let mut errors = Vec::new();
        for (node, _) in self.preorder() {
            if !seen.insert(node.id.as_str()) {
                errors.push(ValidationIssue::DuplicateId {
                    id: node.id.clone(),
                });
            }
            if node.title.trim().is_empty() {
                errors.push(ValidationIssue::EmptyTitle {
                    id: node.id.clone(),
                });
            }
        }
        ValidationReport { errors }
    }

    /// Depth-first search by id.
    pub fn find_node(&self, id: &str) -> Option<&OutlineNode> {
        let path = find_path(&self.nodes, id)?;
        node_at(&self.nodes, &path)
    }

    /// Returns the immediate container of `id`.
    pub fn find_parent_and_index(&self, id: &str) -> Option<NodeLocation> {
        let path = find_path(&self.nodes, id)?;
        let (index, parent_path) = path.split_last()?;
        let parent_id = if parent_path.is_empty() {
            None
        } else {
            Some(node_at(&self.nodes, parent_path)?.id.clone())
        };
        Some(NodeLocation {
            parent_id,
            index: *index,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        find_path(&self.nodes, id).is_some()
    }

    pub fn node_count(&self) -> usize {
        self.preorder().len()
    }

    /// Returns every node with its depth, parents before children.
    pub fn preorder(&self) -> Vec<(&OutlineNode, usize)> {
        let mut out = Vec::new();
        collect_preorder(&self.nodes, 0, &mut out);
        out
    }

    /// Positional display numbers for every node.
    pub fn outline_numbers(&self) -> Vec<SectionNumber> {
        ids::outline_numbers(&self.nodes)
    }

    /// Appends a new root-level section.
    pub fn insert_root(&mut self, title: impl Into<String>) -> OutlineNode {
        let id = match self.id_strategy {
            IdStrategy::Hierarchical => ids::next_root_id(&self.nodes),
            IdStrategy::Opaque => self.fresh_opaque_id(),
        };
        self.nodes.push(OutlineNode::new(id, title));
        let fresh_index = self.nodes.len() - 1;
        if self.id_strategy == IdStrategy::Hierarchical {
            self.renumber(Some(&[fresh_index][..]));
        }
        self.nodes[fresh_index].clone()
    }

    /// Appends a new child under `parent_id` and expands the parent.
    pub fn insert_child(
        &mut self,
        parent_id: &str,
        title: impl Into<String>,
    ) -> Result<OutlineNode, OutlineError> {
        let path = find_path(&self.nodes, parent_id).ok_or_else(|| not_found(parent_id))?;
        let id = match self.id_strategy {
            IdStrategy::Hierarchical => {
                let parent = node_at(&self.nodes, &path).ok_or_else(|| not_found(parent_id))?;
                ids::next_child_id(&parent.id, &parent.children)
            }
            IdStrategy::Opaque => self.fresh_opaque_id(),
        };

        let parent = node_at_mut(&mut self.nodes, &path).ok_or_else(|| not_found(parent_id))?;
        parent.children.push(OutlineNode::new(id, title));
        parent.collapsed = false;

        let mut fresh_path = path;
        fresh_path.push(parent.children.len() - 1);
        if self.id_strategy == IdStrategy::Hierarchical {
            // Nodes pushed directly may have left the ids non-canonical.
            self.renumber(Some(fresh_path.as_slice()));
        }
        node_at(&self.nodes, &fresh_path)
            .cloned()
            .ok_or_else(|| not_found(parent_id))
    }

    /// Inserts a new node right after `after_id` in the same container.
    pub fn insert_sibling(
        &mut self,
        after_id: &str,
        title: impl Into<String>,
    ) -> Result<OutlineNode, OutlineError> {
        let path = find_path(&self.nodes, after_id).ok_or_else(|| not_found(after_id))?;
        let (index, parent_path) = path.split_last().ok_or_else(|| not_found(after_id))?;

        let id = match self.id_strategy {
            IdStrategy::Hierarchical => {
                let parent_id = if parent_path.is_empty() {
                    None
                } else {
                    node_at(&self.nodes, parent_path).map(|parent| parent.id.as_str())
                };
                let siblings =
                    container(&self.nodes, parent_path).ok_or_else(|| not_found(after_id))?;
                ids::next_sibling_id(parent_id, siblings, *index)
                    .ok_or_else(|| not_found(after_id))?
            }
            IdStrategy::Opaque => self.fresh_opaque_id(),
        };

        let siblings =
            container_mut(&mut self.nodes, parent_path).ok_or_else(|| not_found(after_id))?;
        let insert_at = index + 1;
        siblings.insert(insert_at, OutlineNode::new(id, title));

        let mut fresh_path = parent_path.to_vec();
        fresh_path.push(insert_at);
        if self.id_strategy == IdStrategy::Hierarchical {
            // The local sibling id may collide with the next sibling.
            self.renumber(Some(&fresh_path));
        }
        node_at(&self.nodes, &fresh_path)
            .cloned()
            .ok_or_else(|| not_found(after_id))
    }

    /// Removes `id` with its whole subtree. Returns `false` when absent.
    pub fn delete_subtree(&mut self, id: &str) -> bool {
        let Some(path) = find_path(&self.nodes, id) else {
            return false;
        };
        let Some((index, parent_path)) = path.split_last() else {
            return false;
        };
        let Some(siblings) = container_mut(&mut self.nodes, parent_path) else {
            return false;
        };
        siblings.remove(*index);

        if self.id_strategy == IdStrategy::Hierarchical {
            self.renumber(None);
        }
        true
    }

    /// Re-parents `source_id` (with its subtree) as last child of `target_id`.
    ///
    /// # Errors
    /// - `SelfMove` when both ids are equal.
    /// - `NodeNotFound` when either node is absent.
    /// - `CyclicMove` when `target_id` lies inside the source subtree.
    pub fn move_node(&mut self, source_id: &str, target_id: &str) -> Result<(), OutlineError> {
        if source_id == target_id {
            return Err(OutlineError::SelfMove(source_id.to_string()));
        }
        let source_path = find_path(&self.nodes, source_id).ok_or_else(|| not_found(source_id))?;
        if !self.contains(target_id) {
            return Err(not_found(target_id));
        }
        let source = node_at(&self.nodes, &source_path).ok_or_else(|| not_found(source_id))?;
        if source.subtree_contains(target_id) {
            return Err(OutlineError::CyclicMove {
                source_id: source_id.to_string(),
                target_id: target_id.to_string(),
            });
        }

        let (index, parent_path) = source_path
            .split_last()
            .ok_or_else(|| not_found(source_id))?;
        let siblings =
            container_mut(&mut self.nodes, parent_path).ok_or_else(|| not_found(source_id))?;
        let moved = siblings.remove(*index);

        if let Err(moved) = self.attach_child(target_id, moved) {
            // Unreachable for a consistent tree; restore the detached subtree.
            if let Some(siblings) = container_mut(&mut self.nodes, parent_path) {
                siblings.insert(*index, moved);
            }
            return Err(not_found(target_id));
        }

        if self.id_strategy == IdStrategy::Hierarchical {
            self.renumber(None);
        }
        Ok(())
    }

    /// Sets the fold state of one node.
    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) -> Result<(), OutlineError> {
        let node = self.find_node_mut(id).ok_or_else(|| not_found(id))?;
        node.collapsed = collapsed;
        Ok(())
    }

    /// Sets the fold state of every node that has children.
    pub fn set_all_collapsed(&mut self, collapsed: bool) {
        set_collapsed_recursive(&mut self.nodes, collapsed);
    }

    pub fn rename_node(&mut self, id: &str, title: impl Into<String>) -> Result<(), OutlineError> {
        let node = self.find_node_mut(id).ok_or_else(|| not_found(id))?;
        node.title = title.into();
        Ok(())
    }

    pub fn rename_tree(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Drains rename batches queued by hierarchical renumbering, oldest first.
    pub fn take_renames(&mut self) -> Vec<RenameBatch> {
        std::mem::take(&mut self.pending_renames)
    }

    fn find_node_mut(&mut self, id: &str) -> Option<&mut OutlineNode> {
        let path = find_path(&self.nodes, id)?;
        node_at_mut(&mut self.nodes, &path)
    }

    fn attach_child(&mut self, target_id: &str, node: OutlineNode) -> Result<(), OutlineNode> {
        let Some(target) = self.find_node_mut(target_id) else {
            return Err(node);
        };
        target.children.push(node);
        target.collapsed = false;
        Ok(())
    }

    fn fresh_opaque_id(&self) -> String {
        loop {
            let id = ids::opaque_id();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    fn renumber(&mut self, fresh: Option<&[usize]>) {
        let mut renames = Vec::new();
        let mut path = Vec::new();
        renumber_nodes(&mut self.nodes, None, &mut path, fresh, &mut renames);

        if !renames.is_empty() {
            self.pending_renames.push(renames);
        }
    }
}

fn not_found(id: &str) -> OutlineError {
    OutlineError::NodeNotFound(id.to_string())
}

fn find_path(nodes: &[OutlineNode], id: &str) -> Option<Vec<usize>> {
    for (index, node) in nodes.iter().enumerate() {
        if node.id == id {
            return Some(vec![index]);
        }
        if let Some(mut rest) = find_path(&node.children, id) {
            rest.insert(0, index);
            return Some(rest);
        }
    }
    None
}

fn node_at<'a>(nodes: &'a [OutlineNode], path: &[usize]) -> Option<&'a OutlineNode> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get(*first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        node_at(&node.children, rest)
    }
}

fn node_at_mut<'a>(nodes: &'a mut [OutlineNode], path: &[usize]) -> Option<&'a mut OutlineNode> {
    let (first, rest) = path.split_first()?;
    let node = nodes.get_mut(*first)?;
    if rest.is_empty() {
        Some(node)
    } else {
        node_at_mut(&mut node.children, rest)
    }
}

fn container<'a>(nodes: &'a [OutlineNode], parent_path: &[usize]) -> Option<&'a [OutlineNode]> {
    if parent_path.is_empty() {
        return Some(nodes);
    }
    node_at(nodes, parent_path).map(|parent| parent.children.as_slice())
}

fn container_mut<'a>(
    nodes: &'a mut Vec<OutlineNode>,
    parent_path: &[usize],
) -> Option<&'a mut Vec<OutlineNode>> {
    if parent_path.is_empty() {
        return Some(nodes);
    }
    node_at_mut(nodes, parent_path).map(|parent| &mut parent.children)
}

fn collect_preorder<'a>(
    nodes: &'a [OutlineNode],
    depth: usize,
    out: &mut Vec<(&'a OutlineNode, usize)>,
) {
    for node in nodes {
        out.push((node, depth));
        collect_preorder(&node.children, depth + 1, out);
    }
}

fn set_collapsed_recursive(nodes: &mut [OutlineNode], collapsed: bool) {
    for node in nodes {
        if !node.children.is_empty() {
            node.collapsed = collapsed;
            set_collapsed_recursive(&mut node.children, collapsed);
        }
    }
}

fn renumber_nodes(
    nodes: &mut [OutlineNode],
    prefix: Option<&str>,
    path: &mut Vec<usize>,
    fresh: Option<&[usize]>,
    renames: &mut Vec<IdRename>,
) {
    for (index, node) in nodes.iter_mut().enumerate() {
        path.push(index);
        let canonical = ids::positional_id(prefix, index);
        if node.id != canonical {
            if fresh != Some(path.as_slice()) {
                renames.push(IdRename {
                    from: node.id.clone(),
                    to: canonical.clone(),
                });
            }
            node.id = canonical;
        }
        let id = node.id.clone();
        renumber_nodes(&mut node.children, Some(id.as_str()), path, fresh, renames);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::{find_path, OutlineNode, OutlineTree};
    use crate::model::ids::{IdRename, IdStrategy};

    #[test]
    fn find_path_returns_index_chain() {
        let mut root = OutlineNode::new("1", "A");
        root.children.push(OutlineNode::new("1.1", "B"));
        let nodes = vec![OutlineNode::new("0", "Z"), root];

        assert_eq!(find_path(&nodes, "1.1"), Some(vec![1, 0]));
        assert_eq!(find_path(&nodes, "missing"), None);
    }

    #[test]
    fn each_renumbering_edit_queues_its_own_batch() {
        let mut tree = OutlineTree::new("t").with_id_strategy(IdStrategy::Hierarchical);
        tree.insert_root("A");
        tree.insert_root("B");
        tree.insert_root("C");

        tree.insert_sibling("1", "X").unwrap();
        tree.insert_sibling("1", "Y").unwrap();

        let batches = tree.take_renames();
        assert_eq!(batches.len(), 2);
        assert_eq!(
            batches[0],
            vec![rename("2", "3"), rename("3", "4")]
        );
        // X was fresh in the first edit and is renamed like any other node now.
        assert_eq!(
            batches[1],
            vec![rename("2", "3"), rename("3", "4"), rename("4", "5")]
        );
        assert!(tree.take_renames().is_empty());
    }

    #[test]
    fn opaque_edits_never_queue_renames() {
        let mut tree = OutlineTree::new("t");
        let first = tree.insert_root("A");
        tree.insert_root("B");
        tree.insert_sibling(&first.id, "X").unwrap();
        assert!(tree.delete_subtree(&first.id));
        assert!(tree.take_renames().is_empty());
    }

    fn rename(from: &str, to: &str) -> IdRename {
        IdRename {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
