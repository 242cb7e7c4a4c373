//! Project lifecycle use-case service.
//!
//! # Responsibility
//! - Create projects from templates with a synced content store.
//! - List, look up and delete projects.
//! - Open edit sessions bound to one project.
//!
//! # Invariants
//! - Project names are trimmed and must not be blank.
//! - A newly created project is stored at version 1 with one content entry
//!   per outline section plus the sentinel.

use crate::model::content::ContentMeta;
use crate::model::ids::IdStrategy;
use crate::repo::project_repo::{
    NewProject, Project, ProjectDocument, ProjectId, ProjectRepository, RepoError,
};
use crate::service::content_sync;
use crate::service::session::{EditSession, SessionError};
use crate::template::{TemplateError, TemplateProvider};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from project service operations.
#[derive(Debug)]
pub enum ProjectServiceError {
    /// Project name is blank after trim.
    InvalidName,
    /// Template could not be loaded.
    Template(TemplateError),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ProjectServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "project name must not be blank"),
            Self::Template(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName => None,
            Self::Template(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<TemplateError> for ProjectServiceError {
    fn from(value: TemplateError) -> Self {
        Self::Template(value)
    }
}

impl From<RepoError> for ProjectServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Project service facade.
pub struct ProjectService<R: ProjectRepository, T: TemplateProvider> {
    repo: R,
    templates: T,
    id_strategy: IdStrategy,
}

impl<R: ProjectRepository, T: TemplateProvider> ProjectService<R, T> {
    /// Creates service with the default id strategy.
    pub fn new(repo: R, templates: T) -> Self {
        Self {
            repo,
            templates,
            id_strategy: IdStrategy::default(),
        }
    }

    /// Id strategy handed to every opened session.
    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Creates a project seeded from the template provider.
    pub fn create_project(
        &self,
        name: &str,
        title: &str,
        theme: &str,
    ) -> Result<Project, ProjectServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProjectServiceError::InvalidName);
        }

        let mut outline = self.templates.outline_template()?;
        outline.rename_tree(title.trim());
        let mut content = self.templates.content_template()?;
        content.meta = ContentMeta {
            title: title.trim().to_string(),
            theme: theme.trim().to_string(),
        };
        let sync = content_sync::sync(&outline, &mut content);

        let project = self.repo.create_project(&NewProject {
            name: name.to_string(),
            document: ProjectDocument { outline, content },
        })?;
        info!(
            "event=project_create module=service status=ok project_id={} sections={}",
            project.id,
            sync.created.len()
        );
        Ok(project)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>, ProjectServiceError> {
        Ok(self.repo.list_projects()?)
    }

    pub fn get_project(&self, id: ProjectId) -> Result<Option<Project>, ProjectServiceError> {
        Ok(self.repo.get_project(id)?)
    }

    pub fn find_project(&self, name: &str) -> Result<Option<Project>, ProjectServiceError> {
        Ok(self.repo.find_project_by_name(name.trim())?)
    }

    pub fn delete_project(&self, id: ProjectId) -> Result<(), ProjectServiceError> {
        self.repo.delete_project(id)?;
        info!("event=project_delete module=service status=ok project_id={id}");
        Ok(())
    }

    /// Opens an edit session borrowing this service's repository.
    pub fn open_session(&self, id: ProjectId) -> Result<EditSession<&R>, SessionError> {
        EditSession::open(&self.repo, id, self.id_strategy)
    }
}
