//! Project-scoped edit session over one outline + content pair.
//!
//! # Responsibility
//! - Route every structural and content edit through one owner.
//! - Track unsaved changes with a `dirty` flag.
//! - Save with validate -> sync -> persist, as one all-or-nothing step.
//!
//! # Invariants
//! - A failed operation leaves tree, store and `dirty` untouched.
//! - `dirty` is cleared only by a successful `save`.
//! - Hierarchical id renames are applied to the store right after the edit
//!   that produced them, so content follows its node.
//! - Entries of a deleted hierarchical subtree are dropped with the delete,
//!   so a later node reusing one of those ids starts from a fresh entry.
//! - One session per project; concurrent writers are caught by the
//!   repository version check.

use crate::model::content::{ContentError, ContentStore, TEMPLATE_SECTION_KEY};
use crate::model::ids::IdStrategy;
use crate::model::outline::{OutlineError, OutlineNode, OutlineTree, ValidationReport};
use crate::repo::project_repo::{
    ProjectDocument, ProjectId, ProjectRepository, RepoError, StoredDocument,
};
use crate::service::content_sync::{self, SyncReport};
use crate::service::generation::{self, GenerationEngine, GenerationReport};
use crate::service::planner::{self, PrefillReport, PrefillRules};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from edit session operations.
#[derive(Debug)]
pub enum SessionError {
    /// Structural edit rejected.
    Outline(OutlineError),
    /// Content edit rejected.
    Content(ContentError),
    /// Save blocked by validation; carries every issue found.
    ValidationFailed(ValidationReport),
    /// Persistence collaborator failed; the session is unchanged.
    Persistence(RepoError),
    /// Project to open does not exist.
    ProjectNotFound(ProjectId),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outline(err) => write!(f, "{err}"),
            Self::Content(err) => write!(f, "{err}"),
            Self::ValidationFailed(report) => write!(f, "outline is invalid: {report}"),
            Self::Persistence(err) => write!(f, "save failed: {err}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Outline(err) => Some(err),
            Self::Content(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::ValidationFailed(_) | Self::ProjectNotFound(_) => None,
        }
    }
}

impl From<OutlineError> for SessionError {
    fn from(value: OutlineError) -> Self {
        Self::Outline(value)
    }
}

impl From<ContentError> for SessionError {
    fn from(value: ContentError) -> Self {
        Self::Content(value)
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ProjectNotFound(id),
            other => Self::Persistence(other),
        }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    /// Version now stored for the project.
    pub version: i64,
    /// Changes made to the store by the pre-save sync.
    pub sync: SyncReport,
}

/// Edit session facade.
pub struct EditSession<R: ProjectRepository> {
    repo: R,
    project_id: ProjectId,
    base_version: i64,
    tree: OutlineTree,
    store: ContentStore,
    dirty: bool,
}

impl<R: ProjectRepository> EditSession<R> {
    /// Loads a project and starts a session on it.
    pub fn open(
        repo: R,
        project_id: ProjectId,
        id_strategy: IdStrategy,
    ) -> Result<Self, SessionError> {
        let stored = repo.load_document(project_id)?;
        debug!(
            "event=session_open module=session status=ok project_id={project_id} version={}",
            stored.version
        );
        Ok(Self::from_stored(repo, project_id, stored, id_strategy))
    }

    /// Starts a session on an already loaded document.
    ///
    /// The session starts dirty only when hierarchical mode had to renumber
    /// the loaded ids.
    pub fn from_stored(
        repo: R,
        project_id: ProjectId,
        stored: StoredDocument,
        id_strategy: IdStrategy,
    ) -> Self {
        let ProjectDocument {
            mut outline,
            mut content,
        } = stored.document;
        outline.set_id_strategy(id_strategy);

        // Non-canonical ids loaded in hierarchical mode are renumbered here.
        let batches = outline.take_renames();
        let renumbered = !batches.is_empty();
        if renumbered {
            let rekeyed = batches
                .iter()
                .map(|batch| content.apply_renames(batch))
                .sum::<usize>();
            info!(
                "event=session_open module=session status=renumbered project_id={project_id} rekeyed={rekeyed}"
            );
        }
        Self {
            repo,
            project_id,
            base_version: stored.version,
            tree: outline,
            store: content,
            dirty: renumbered,
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Version the in-memory state was loaded or last saved at.
    pub fn base_version(&self) -> i64 {
        self.base_version
    }

    pub fn tree(&self) -> &OutlineTree {
        &self.tree
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn validate(&self) -> ValidationReport {
        self.tree.validate()
    }

    pub fn insert_root(&mut self, title: impl Into<String>) -> OutlineNode {
        let node = self.tree.insert_root(title);
        self.after_structural_edit("insert_root", &node.id);
        node
    }

    pub fn insert_child(
        &mut self,
        parent_id: &str,
        title: impl Into<String>,
    ) -> Result<OutlineNode, SessionError> {
        let node = self.tree.insert_child(parent_id, title)?;
        self.after_structural_edit("insert_child", &node.id);
        Ok(node)
    }

    pub fn insert_sibling(
        &mut self,
        after_id: &str,
        title: impl Into<String>,
    ) -> Result<OutlineNode, SessionError> {
        let node = self.tree.insert_sibling(after_id, title)?;
        self.after_structural_edit("insert_sibling", &node.id);
        Ok(node)
    }

    /// Removes a subtree. Returns `false` (and stays clean) when absent.
    pub fn delete_subtree(&mut self, id: &str) -> bool {
        let doomed = self
            .tree
            .find_node(id)
            .map(subtree_ids)
            .unwrap_or_default();
        if !self.tree.delete_subtree(id) {
            return false;
        }

        // Hierarchical ids are reused by later inserts; opaque ids are pruned
        // by the next sync.
        if self.tree.id_strategy() == IdStrategy::Hierarchical {
            for key in doomed.iter().filter(|key| *key != TEMPLATE_SECTION_KEY) {
                self.store.contents.remove(key);
            }
        }
        self.after_structural_edit("delete_subtree", id);
        true
    }

    pub fn move_node(&mut self, source_id: &str, target_id: &str) -> Result<(), SessionError> {
        self.tree.move_node(source_id, target_id)?;
        self.after_structural_edit("move_node", source_id);
        Ok(())
    }

    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) -> Result<(), SessionError> {
        self.tree.set_collapsed(id, collapsed)?;
        self.dirty = true;
        Ok(())
    }

    pub fn set_all_collapsed(&mut self, collapsed: bool) {
        self.tree.set_all_collapsed(collapsed);
        self.dirty = true;
    }

    pub fn rename_node(&mut self, id: &str, title: impl Into<String>) -> Result<(), SessionError> {
        self.tree.rename_node(id, title)?;
        self.dirty = true;
        Ok(())
    }

    pub fn rename_tree(&mut self, title: impl Into<String>) {
        self.tree.rename_tree(title);
        self.dirty = true;
    }

    /// Applies one or more content mutations as a unit.
    ///
    /// The edit runs on a copy; the store is replaced only when it succeeds.
    pub fn edit_content<T>(
        &mut self,
        edit: impl FnOnce(&mut ContentStore) -> Result<T, ContentError>,
    ) -> Result<T, SessionError> {
        let mut draft = self.store.clone();
        let value = edit(&mut draft)?;
        self.store = draft;
        self.dirty = true;
        Ok(value)
    }

    /// Reconciles the store with the tree now instead of at save time.
    pub fn sync(&mut self) -> SyncReport {
        let report = content_sync::sync(&self.tree, &mut self.store);
        if !report.is_noop() {
            self.dirty = true;
        }
        report
    }

    /// Seeds keyword-based plans for sections without content.
    pub fn prefill(&mut self, rules: &PrefillRules) -> PrefillReport {
        let report = planner::prefill(&self.tree, &mut self.store, rules);
        if !report.planned.is_empty() {
            self.dirty = true;
        }
        report
    }

    /// Runs the generation engine over the current plans.
    pub fn generate(&mut self, engine: &mut dyn GenerationEngine) -> GenerationReport {
        let report = generation::run_generation(&self.tree, &mut self.store, engine);
        if !report.attempted_sections.is_empty() {
            self.dirty = true;
        }
        report
    }

    /// Validates, syncs and persists the session state.
    ///
    /// # Errors
    /// - `ValidationFailed` with every issue; nothing is persisted.
    /// - `Persistence` when the repository rejects the write (including a
    ///   version conflict); in-memory state is exactly as before the call.
    pub fn save(&mut self) -> Result<SaveReport, SessionError> {
        let started_at = Instant::now();

        let validation = self.tree.validate();
        if !validation.is_valid() {
            warn!(
                "event=session_save module=session status=rejected project_id={} issues={}",
                self.project_id,
                validation.errors.len()
            );
            return Err(SessionError::ValidationFailed(validation));
        }

        let mut synced = self.store.clone();
        let sync = content_sync::sync(&self.tree, &mut synced);
        let document = ProjectDocument {
            outline: self.tree.clone(),
            content: synced,
        };

        let version = match self
            .repo
            .save_document(self.project_id, self.base_version, &document)
        {
            Ok(version) => version,
            Err(err) => {
                error!(
                    "event=session_save module=session status=error project_id={} base_version={} duration_ms={} error={err}",
                    self.project_id,
                    self.base_version,
                    started_at.elapsed().as_millis()
                );
                return Err(SessionError::Persistence(err));
            }
        };

        self.store = document.content;
        self.base_version = version;
        self.dirty = false;
        info!(
            "event=session_save module=session status=ok project_id={} version={version} sections={} duration_ms={}",
            self.project_id,
            self.store.section_ids().len(),
            started_at.elapsed().as_millis()
        );
        Ok(SaveReport { version, sync })
    }

    fn after_structural_edit(&mut self, op: &'static str, node_id: &str) {
        self.dirty = true;
        let mut moved = 0;
        for batch in self.tree.take_renames() {
            moved += self.store.apply_renames(&batch);
        }
        debug!(
            "event=outline_edit module=session status=ok op={op} node_id={node_id} rekeyed={moved}"
        );
    }
}

fn subtree_ids(node: &OutlineNode) -> Vec<String> {
    let mut ids = vec![node.id.clone()];
    for child in &node.children {
        ids.extend(subtree_ids(child));
    }
    ids
}
