//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist one outline + content document pair per project.
//! - Enforce single-writer safety with a version check on every save.
//!
//! # Invariants
//! - Listing is deterministic: `updated_at DESC, name ASC`.
//! - `save_document` is one conditional `UPDATE`; a stale base version
//!   writes nothing.
//! - Stored `version` starts at 1 and grows by exactly 1 per save.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::content::ContentStore;
use crate::model::outline::OutlineTree;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Result type used by project repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from project repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Project does not exist.
    NotFound(ProjectId),
    /// Another project already uses this name.
    DuplicateName(String),
    /// Stored version moved past the caller's base version.
    VersionConflict {
        project_id: ProjectId,
        expected: i64,
        actual: i64,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Document could not be encoded or decoded as JSON.
    Serialization(serde_json::Error),
    /// Persisted row cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::DuplicateName(name) => write!(f, "project name already exists: {name}"),
            Self::VersionConflict {
                project_id,
                expected,
                actual,
            } => write!(
                f,
                "project {project_id} was saved elsewhere: expected version {expected}, found {actual}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "project repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "project repository requires table `{table}`")
            }
            Self::Serialization(err) => write!(f, "project document encoding failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid project data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Project read model without its documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    /// Unique, user-chosen handle.
    pub name: String,
    /// Paper title. Mirrors the outline title at the last save.
    pub title: String,
    /// Paper theme. Mirrors `content.meta.theme` at the last save.
    pub theme: String,
    /// Optimistic concurrency version, starts at 1.
    pub version: i64,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// The persisted unit of one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub outline: OutlineTree,
    pub content: ContentStore,
}

/// Document together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub version: i64,
    pub document: ProjectDocument,
}

/// Input for `create_project`.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub document: ProjectDocument,
}

/// Repository interface for project persistence.
pub trait ProjectRepository {
    /// Inserts a new project at version 1.
    fn create_project(&self, project: &NewProject) -> RepoResult<Project>;
    /// Loads one project by id.
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    /// Loads one project by its unique name.
    fn find_project_by_name(&self, name: &str) -> RepoResult<Option<Project>>;
    /// Lists projects, most recently updated first.
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    /// Hard-deletes one project with its documents.
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
    /// Loads the document pair and its current version.
    fn load_document(&self, id: ProjectId) -> RepoResult<StoredDocument>;
    /// Replaces the document pair if the stored version equals `base_version`.
    ///
    /// Returns the new version.
    fn save_document(
        &self,
        id: ProjectId,
        base_version: i64,
        document: &ProjectDocument,
    ) -> RepoResult<i64>;
}

impl<R: ProjectRepository + ?Sized> ProjectRepository for &R {
    fn create_project(&self, project: &NewProject) -> RepoResult<Project> {
        (**self).create_project(project)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        (**self).get_project(id)
    }

    fn find_project_by_name(&self, name: &str) -> RepoResult<Option<Project>> {
        (**self).find_project_by_name(name)
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        (**self).list_projects()
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        (**self).delete_project(id)
    }

    fn load_document(&self, id: ProjectId) -> RepoResult<StoredDocument> {
        (**self).load_document(id)
    }

    fn save_document(
        &self,
        id: ProjectId,
        base_version: i64,
        document: &ProjectDocument,
    ) -> RepoResult<i64> {
        (**self).save_document(id, base_version, document)
    }
}

/// SQLite-backed project repository.
#[derive(Debug, Clone, Copy)]
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_project_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &NewProject) -> RepoResult<Project> {
        let id = Uuid::new_v4();
        let outline_json = serde_json::to_string(&project.document.outline)?;
        let content_json = serde_json::to_string(&project.document.content)?;
        let now = now_epoch_ms();

        let inserted = self.conn.execute(
            "INSERT INTO projects (
                project_uuid,
                name,
                title,
                theme,
                outline_json,
                content_json,
                version,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7);",
            params![
                id.to_string(),
                project.name,
                project.document.outline.title,
                project.document.content.meta.theme,
                outline_json,
                content_json,
                now,
            ],
        );
        if let Err(err) = inserted {
            return Err(map_unique_violation(err, &project.name));
        }

        self.get_project(id)?.ok_or(RepoError::NotFound(id))
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.conn
            .query_row(
                "SELECT project_uuid, name, title, theme, version, created_at, updated_at
                 FROM projects
                 WHERE project_uuid = ?1;",
                [id.to_string()],
                |row| Ok(parse_project_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_project_by_name(&self, name: &str) -> RepoResult<Option<Project>> {
        self.conn
            .query_row(
                "SELECT project_uuid, name, title, theme, version, created_at, updated_at
                 FROM projects
                 WHERE name = ?1;",
                [name],
                |row| Ok(parse_project_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT project_uuid, name, title, theme, version, created_at, updated_at
             FROM projects
             ORDER BY updated_at DESC, name ASC;",
        )?;
        let mut rows = stmt.query([])?;

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_project_row(row)?);
        }
        Ok(items)
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM projects WHERE project_uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn load_document(&self, id: ProjectId) -> RepoResult<StoredDocument> {
        let row = self
            .conn
            .query_row(
                "SELECT outline_json, content_json, version
                 FROM projects
                 WHERE project_uuid = ?1;",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;
        let Some((outline_json, content_json, version)) = row else {
            return Err(RepoError::NotFound(id));
        };

        Ok(StoredDocument {
            version,
            document: ProjectDocument {
                outline: serde_json::from_str(&outline_json)?,
                content: serde_json::from_str(&content_json)?,
            },
        })
    }

    fn save_document(
        &self,
        id: ProjectId,
        base_version: i64,
        document: &ProjectDocument,
    ) -> RepoResult<i64> {
        let outline_json = serde_json::to_string(&document.outline)?;
        let content_json = serde_json::to_string(&document.content)?;

        let changed = self.conn.execute(
            "UPDATE projects
             SET outline_json = ?3,
                 content_json = ?4,
                 title = ?5,
                 theme = ?6,
                 version = version + 1,
                 updated_at = ?7
             WHERE project_uuid = ?1
               AND version = ?2;",
            params![
                id.to_string(),
                base_version,
                outline_json,
                content_json,
                document.outline.title,
                document.content.meta.theme,
                now_epoch_ms(),
            ],
        )?;
        if changed == 1 {
            return Ok(base_version + 1);
        }

        match stored_version(self.conn, id)? {
            Some(actual) => Err(RepoError::VersionConflict {
                project_id: id,
                expected: base_version,
                actual,
            }),
            None => Err(RepoError::NotFound(id)),
        }
    }
}

fn stored_version(conn: &Connection, id: ProjectId) -> RepoResult<Option<i64>> {
    let version = conn
        .query_row(
            "SELECT version FROM projects WHERE project_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version)
}

fn map_unique_violation(err: rusqlite::Error, name: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::DuplicateName(name.to_string())
        }
        _ => err.into(),
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("project_uuid")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid `{id_text}` in projects.project_uuid"))
    })?;

    let version: i64 = row.get("version")?;
    if version < 1 {
        return Err(RepoError::InvalidData(format!(
            "invalid version `{version}` in projects.version"
        )));
    }

    Ok(Project {
        id,
        name: row.get("name")?,
        title: row.get("title")?,
        theme: row.get("theme")?,
        version,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn ensure_project_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'projects'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable("projects"));
    }

    Ok(())
}
