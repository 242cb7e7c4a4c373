//! Core of the paper outline engine.
//! Owns the outline tree, the per-section content store and the rules that
//! keep them consistent.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod template;

pub use config::{ConfigError, OutlineConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::content::{
    ContentEntry, ContentError, ContentStore, FigurePlanField, PlanField, SectionStatus,
    TablePlanField, TEMPLATE_SECTION_KEY,
};
pub use model::ids::{IdRename, IdStrategy, SectionNumber};
pub use model::outline::{
    NodeLocation, OutlineError, OutlineNode, OutlineTree, ValidationIssue, ValidationReport,
};
pub use repo::project_repo::{
    Project, ProjectDocument, ProjectId, ProjectRepository, RepoError, SqliteProjectRepository,
};
pub use service::content_sync::{sync, SyncReport};
pub use service::project_service::{ProjectService, ProjectServiceError};
pub use service::session::{EditSession, SaveReport, SessionError};
pub use template::{BuiltinTemplates, DirectoryTemplates, TemplateError, TemplateProvider};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
