//! CLI error type.

use paper_outline_core::{ConfigError, DbError, ProjectServiceError, RepoError, SessionError};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Db(DbError),
    Repo(RepoError),
    Project(ProjectServiceError),
    Session(SessionError),
    Json(serde_json::Error),
    /// No project with this name exists.
    UnknownProject(String),
    /// Section id not present in the outline or content store.
    UnknownSection(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Project(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "failed to encode output: {err}"),
            Self::UnknownProject(name) => write!(f, "no project named `{name}`"),
            Self::UnknownSection(id) => write!(f, "no section with id `{id}`"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Project(err) => Some(err),
            Self::Session(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::UnknownProject(_) | Self::UnknownSection(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ProjectServiceError> for CliError {
    fn from(value: ProjectServiceError) -> Self {
        Self::Project(value)
    }
}

impl From<SessionError> for CliError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
