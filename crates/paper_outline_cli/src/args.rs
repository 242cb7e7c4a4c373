//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// Build and maintain paper outlines with per-section generation plans
#[derive(Parser, Debug)]
#[command(name = "paper-outline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Project database file
    #[arg(
        long,
        global = true,
        env = "PAPER_OUTLINE_DB",
        default_value = "paper-outline.db",
        value_hint = ValueHint::FilePath
    )]
    pub db: PathBuf,

    /// Absolute directory for log files (logging is off when unset)
    #[arg(long, global = true, env = "PAPER_OUTLINE_LOG_DIR", value_hint = ValueHint::DirPath)]
    pub log_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true, env = "PAPER_OUTLINE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// JSON engine config (id strategy, prefill rules)
    #[arg(long, global = true, env = "PAPER_OUTLINE_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory with outline.template.json and content.template.json
    #[arg(long, global = true, env = "PAPER_OUTLINE_TEMPLATES", value_hint = ValueHint::DirPath)]
    pub templates: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, list and delete projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Show and edit the outline tree
    Outline {
        /// Project name
        #[arg(short, long)]
        project: String,
        #[command(subcommand)]
        command: OutlineCommands,
    },

    /// Show and edit per-section content
    Content {
        /// Project name
        #[arg(short, long)]
        project: String,
        #[command(subcommand)]
        command: ContentCommands,
    },

    /// Check the outline for duplicate ids and empty titles
    Validate {
        /// Project name
        #[arg(short, long)]
        project: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Create a project from templates
    New {
        /// Unique project name
        name: String,
        /// Paper title
        #[arg(long, default_value = "")]
        title: String,
        /// Paper theme used in prompts
        #[arg(long, default_value = "")]
        theme: String,
    },
    /// List projects, most recently updated first
    List,
    /// Delete a project and its documents
    Delete {
        /// Project name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum OutlineCommands {
    /// Print the outline as a tree with section numbers
    Show {
        /// Also print node ids
        #[arg(long)]
        ids: bool,
    },
    /// Append a root-level section
    AddRoot { title: String },
    /// Append a child section
    AddChild { parent: String, title: String },
    /// Insert a section right after another one
    AddSibling { after: String, title: String },
    /// Delete a section with all its subsections
    Delete { id: String },
    /// Move a section (with subsections) under another section
    Move { source: String, target: String },
    /// Change a section title
    Rename { id: String, title: String },
    /// Change the paper title
    Retitle { title: String },
    /// Collapse one section, or every section when no id is given
    Collapse { id: Option<String> },
    /// Expand one section, or every section when no id is given
    Expand { id: Option<String> },
}

#[derive(Subcommand, Debug)]
pub enum ContentCommands {
    /// Summarize all sections, or print one entry as JSON
    Show { id: Option<String> },
    /// Reconcile content entries with the outline
    Sync,
    /// Seed keyword-based plans for sections without content
    Prefill,
    /// Replace a section's text
    SetText { id: String, text: String },
    /// Replace a section's text prompt
    SetPrompt { id: String, prompt: String },
    /// Set a section's length target (0 restores the default)
    SetLength { id: String, target: u32 },
    /// Change a section's plan
    Plan {
        id: String,
        #[arg(long)]
        want_text: Option<bool>,
        #[arg(long)]
        want_figure: Option<bool>,
        #[arg(long)]
        want_table: Option<bool>,
        /// Append an enabled figure plan with this title
        #[arg(long, value_name = "TITLE")]
        add_figure: Option<String>,
        /// Append an enabled table plan with this title
        #[arg(long, value_name = "TITLE")]
        add_table: Option<String>,
    },
}
