//! Outline-to-content reconciliation.
//!
//! # Responsibility
//! - Derive the required section keys from the outline (pre-order).
//! - Create missing entries, retitle existing ones, prune orphans.
//!
//! # Invariants
//! - Existing entries keep status, plan, prompt, text, figures and tables.
//! - The sentinel entry is never created, retitled or pruned.
//! - Running `sync` twice without a tree change yields an empty report.

use crate::model::content::{ContentStore, TEMPLATE_SECTION_KEY};
use crate::model::outline::OutlineTree;
use log::{debug, warn};
use std::collections::HashSet;

/// One outline section as seen by the content store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRef {
    pub id: String,
    pub title: String,
}

/// Keys touched by one `sync` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: Vec<String>,
    /// Entries whose `sectionTitle` actually changed.
    pub retitled: Vec<String>,
    pub pruned: Vec<String>,
}

impl SyncReport {
    /// Returns `true` when the store was not mutated.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.retitled.is_empty() && self.pruned.is_empty()
    }
}

/// Flattens the outline into `{id, title}` pairs, parents before children.
pub fn flatten_sections(tree: &OutlineTree) -> Vec<SectionRef> {
    tree.preorder()
        .into_iter()
        .map(|(node, _)| SectionRef {
            id: node.id.clone(),
            title: node.title.clone(),
        })
        .collect()
}

/// Reconciles `store.contents` with the current shape of `tree`.
pub fn sync(tree: &OutlineTree, store: &mut ContentStore) -> SyncReport {
    let mut report = SyncReport::default();
    let mut live = HashSet::new();

    for section in flatten_sections(tree) {
        if section.id == TEMPLATE_SECTION_KEY {
            warn!(
                "event=content_sync module=service status=skipped reason=sentinel_node_id node_id={}",
                section.id
            );
            continue;
        }
        // First occurrence of a duplicated id owns the entry.
        if !live.insert(section.id.clone()) {
            continue;
        }

        match store.contents.get_mut(&section.id) {
            Some(entry) => {
                if entry.section_title != section.title {
                    entry.section_title = section.title;
                    report.retitled.push(section.id);
                }
            }
            None => {
                let entry = store.create_default_entry(&section.title);
                store.contents.insert(section.id.clone(), entry);
                report.created.push(section.id);
            }
        }
    }

    report.pruned = store
        .contents
        .keys()
        .filter(|key| key.as_str() != TEMPLATE_SECTION_KEY && !live.contains(*key))
        .cloned()
        .collect();
    for key in &report.pruned {
        store.contents.remove(key);
    }

    debug!(
        "event=content_sync module=service status=ok created={} retitled={} pruned={}",
        report.created.len(),
        report.retitled.len(),
        report.pruned.len()
    );
    report
}
