//! Starting documents for new projects.
//!
//! # Responsibility
//! - Provide the outline and content skeletons a project is created from.
//! - Load skeletons from the built-in JSON or from a user directory.
//!
//! # Invariants
//! - Every call returns a fresh, independently owned document.

use crate::model::content::ContentStore;
use crate::model::outline::OutlineTree;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the outline skeleton inside a template directory.
pub const OUTLINE_TEMPLATE_FILE: &str = "outline.template.json";
/// File name of the content skeleton inside a template directory.
pub const CONTENT_TEMPLATE_FILE: &str = "content.template.json";

const BUILTIN_OUTLINE: &str = include_str!("outline.template.json");
const BUILTIN_CONTENT: &str = include_str!("content.template.json");

/// Errors from template loading.
#[derive(Debug)]
pub enum TemplateError {
    /// Template file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Template is not a valid document.
    Parse {
        name: String,
        source: serde_json::Error,
    },
}

impl Display for TemplateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read template `{}`: {source}", path.display())
            }
            Self::Parse { name, source } => write!(f, "invalid template `{name}`: {source}"),
        }
    }
}

impl Error for TemplateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Source of new-project skeletons.
pub trait TemplateProvider {
    fn outline_template(&self) -> Result<OutlineTree, TemplateError>;
    fn content_template(&self) -> Result<ContentStore, TemplateError>;
}

/// Skeletons compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl TemplateProvider for BuiltinTemplates {
    fn outline_template(&self) -> Result<OutlineTree, TemplateError> {
        parse("builtin outline", BUILTIN_OUTLINE)
    }

    fn content_template(&self) -> Result<ContentStore, TemplateError> {
        parse("builtin content", BUILTIN_CONTENT)
    }
}

/// Skeletons read from `outline.template.json` / `content.template.json`.
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    dir: PathBuf,
}

impl DirectoryTemplates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read(&self, file_name: &str) -> Result<String, TemplateError> {
        let path = self.dir.join(file_name);
        fs::read_to_string(&path).map_err(|source| TemplateError::Io { path, source })
    }
}

impl TemplateProvider for DirectoryTemplates {
    fn outline_template(&self) -> Result<OutlineTree, TemplateError> {
        parse(OUTLINE_TEMPLATE_FILE, &self.read(OUTLINE_TEMPLATE_FILE)?)
    }

    fn content_template(&self) -> Result<ContentStore, TemplateError> {
        parse(CONTENT_TEMPLATE_FILE, &self.read(CONTENT_TEMPLATE_FILE)?)
    }
}

impl<T: TemplateProvider + ?Sized> TemplateProvider for &T {
    fn outline_template(&self) -> Result<OutlineTree, TemplateError> {
        (**self).outline_template()
    }

    fn content_template(&self) -> Result<ContentStore, TemplateError> {
        (**self).content_template()
    }
}

fn parse<T: serde::de::DeserializeOwned>(name: &str, json: &str) -> Result<T, TemplateError> {
    serde_json::from_str(json).map_err(|source| TemplateError::Parse {
        name: name.to_string(),
        source,
    })
}
