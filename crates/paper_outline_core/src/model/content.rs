//! Per-section content store model.
//!
//! # Responsibility
//! - Define the wire shape of the content document (camelCase JSON).
//! - Seed new section entries from the sentinel template entry and prompt
//!   defaults.
//! - Provide field mutators that only act on tracked sections.
//!
//! # Invariants
//! - `TEMPLATE_SECTION_KEY` holds defaults and is never a real section.
//! - Mutators never create entries; an absent key is `SectionNotFound`.
//! - Template rendering is a single pass; substituted values are not rescanned.

use crate::model::ids::IdRename;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Content key of the sentinel entry holding per-section defaults.
pub const TEMPLATE_SECTION_KEY: &str = "__TEMPLATE_PER_SECTION__";
/// Length unit used when the sentinel entry is missing.
pub const DEFAULT_LENGTH_UNIT: &str = "char";
/// Length target used when the sentinel entry is missing or a target is `0`.
pub const DEFAULT_LENGTH_TARGET: u32 = 900;
/// Text prompt used when `defaults.textPromptTemplate` is empty.
pub const DEFAULT_TEXT_PROMPT_TEMPLATE: &str = "Write the section \"{{sectionTitle}}\" of a paper on \"{{theme}}\". Cover the source structure, key modules and data flow in an academic register.";
/// Theme substituted when the store has no theme.
pub const DEFAULT_THEME: &str = "system development";

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([^{}\s]+)\}\}").expect("valid prompt token regex"));

/// Lifecycle of one section's generated content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    /// Plan is editable; nothing generated yet.
    #[default]
    Planning,
    /// Every attempted artifact was generated.
    Generated,
    /// Some attempted artifacts failed.
    Partial,
    /// Every attempted artifact failed.
    Failed,
}

/// Target size of a section's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionLength {
    pub unit: String,
    pub target: u32,
}

impl Default for SectionLength {
    fn default() -> Self {
        Self {
            unit: DEFAULT_LENGTH_UNIT.to_string(),
            target: DEFAULT_LENGTH_TARGET,
        }
    }
}

/// Which artifacts should be generated for a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SectionPlan {
    pub want_text: bool,
    pub want_figure: bool,
    pub figure_plan: Vec<FigureSpec>,
    pub want_table: bool,
    pub table_plan: Vec<TableSpec>,
}

impl Default for SectionPlan {
    fn default() -> Self {
        Self {
            want_text: true,
            want_figure: false,
            figure_plan: Vec::new(),
            want_table: false,
            table_plan: Vec::new(),
        }
    }
}

/// One planned figure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FigureSpec {
    pub enabled: bool,
    pub figure_title: String,
    /// What the figure should emphasise. Rendered into `{{figureFocus}}`.
    pub figure_focus: String,
    pub prompt_template: String,
}

/// One planned table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableSpec {
    pub enabled: bool,
    pub table_title: String,
    /// Column headers. Rendered into `{{schema}}` joined by `, `.
    pub schema: Vec<String>,
    pub prompt_template: String,
}

/// Outcome of one generated artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    #[default]
    Pending,
    Success,
    Error,
}

/// One generated figure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FigureRecord {
    /// Display label, e.g. `Figure 2.1-1 System architecture`.
    pub label: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    pub status: RecordStatus,
    /// RFC 3339 UTC timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Header row plus body rows of a generated table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One generated table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableRecord {
    pub label: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<TableData>,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Plan, prompt and generated artifacts of one outline section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentEntry {
    pub status: SectionStatus,
    /// Mirror of the owning node's title, maintained by sync.
    pub section_title: String,
    pub length: SectionLength,
    pub plan: SectionPlan,
    pub text_prompt: String,
    pub text: String,
    pub figures: Vec<FigureRecord>,
    pub tables: Vec<TableRecord>,
}

/// Paper-level metadata used by prompt rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentMeta {
    pub title: String,
    pub theme: String,
}

/// Prompt templates applied to new sections and new plan items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromptDefaults {
    pub text_prompt_template: String,
    pub figure_prompt_template: String,
    pub table_prompt_template: String,
}

/// Keyed per-section content document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentStore {
    pub meta: ContentMeta,
    pub defaults: PromptDefaults,
    /// Section entries keyed by node id, plus the sentinel entry.
    pub contents: BTreeMap<String, ContentEntry>,
}

/// Token values for `render_template`.
#[derive(Debug, Clone, Copy)]
pub struct PromptVars<'a> {
    pub section_title: &'a str,
    pub theme: &'a str,
    pub figure_focus: Option<&'a str>,
    pub schema: Option<&'a [String]>,
}

impl<'a> PromptVars<'a> {
    pub fn new(section_title: &'a str, theme: &'a str) -> Self {
        Self {
            section_title,
            theme,
            figure_focus: None,
            schema: None,
        }
    }

    pub fn with_figure_focus(mut self, focus: &'a str) -> Self {
        self.figure_focus = Some(focus);
        self
    }

    pub fn with_schema(mut self, schema: &'a [String]) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Replaces every recognized `{{token}}` occurrence in one pass.
///
/// Recognized tokens: `sectionTitle`, `theme` (also `论文主题`), and when set
/// on `vars`, `figureFocus` and `schema`. Anything else is kept verbatim.
pub fn render_template(template: &str, vars: &PromptVars<'_>) -> String {
    TOKEN_PATTERN
        .replace_all(template, |caps: &Captures<'_>| {
            let value = match &caps[1] {
                "sectionTitle" => Some(vars.section_title.to_string()),
                "theme" | "论文主题" => Some(vars.theme.to_string()),
                "figureFocus" => vars.figure_focus.map(str::to_string),
                "schema" => vars.schema.map(|columns| columns.join(", ")),
                _ => None,
            };
            value.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Builds a fresh `planning` entry for `section_title`.
///
/// `length` is copied from `template_entry` (or the built-in default when the
/// sentinel is missing). The text prompt is rendered from
/// `defaults.textPromptTemplate`, falling back to the built-in template.
pub fn create_default_entry(
    template_entry: Option<&ContentEntry>,
    section_title: &str,
    defaults: &PromptDefaults,
    theme: &str,
) -> ContentEntry {
    let template = if defaults.text_prompt_template.trim().is_empty() {
        DEFAULT_TEXT_PROMPT_TEMPLATE
    } else {
        defaults.text_prompt_template.as_str()
    };
    let theme = if theme.trim().is_empty() {
        DEFAULT_THEME
    } else {
        theme
    };

    ContentEntry {
        status: SectionStatus::Planning,
        section_title: section_title.to_string(),
        length: template_entry
            .map(|entry| entry.length.clone())
            .unwrap_or_default(),
        plan: SectionPlan::default(),
        text_prompt: render_template(template, &PromptVars::new(section_title, theme)),
        text: String::new(),
        figures: Vec::new(),
        tables: Vec::new(),
    }
}

/// Boolean plan switches addressable by `set_plan_field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanField {
    WantText(bool),
    WantFigure(bool),
    WantTable(bool),
}

/// Field update for one figure plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FigurePlanField {
    Enabled(bool),
    Title(String),
    Focus(String),
    PromptTemplate(String),
}

/// Field update for one table plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TablePlanField {
    Enabled(bool),
    Title(String),
    Schema(Vec<String>),
    PromptTemplate(String),
}

/// Errors from content store mutators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// No entry is tracked under the given key.
    SectionNotFound(String),
    /// Positional mutator referenced a missing list item.
    IndexOutOfRange {
        section_id: String,
        index: usize,
        len: usize,
    },
}

impl Display for ContentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SectionNotFound(id) => write!(f, "content section not found: {id}"),
            Self::IndexOutOfRange {
                section_id,
                index,
                len,
            } => write!(
                f,
                "index {index} out of range for section {section_id} (len {len})"
            ),
        }
    }
}

impl Error for ContentError {}

impl ContentStore {
    /// Sentinel entry, if present.
    pub fn template_entry(&self) -> Option<&ContentEntry> {
        self.contents.get(TEMPLATE_SECTION_KEY)
    }

    /// Builds a default entry from this store's sentinel, defaults and theme.
    pub fn create_default_entry(&self, section_title: &str) -> ContentEntry {
        create_default_entry(
            self.template_entry(),
            section_title,
            &self.defaults,
            &self.meta.theme,
        )
    }

    /// Theme for prompt rendering, with the built-in fallback.
    pub fn theme(&self) -> &str {
        if self.meta.theme.trim().is_empty() {
            DEFAULT_THEME
        } else {
            &self.meta.theme
        }
    }

    pub fn entry(&self, id: &str) -> Option<&ContentEntry> {
        self.contents.get(id)
    }

    /// Tracked section ids, sentinel excluded.
    pub fn section_ids(&self) -> Vec<&str> {
        self.contents
            .keys()
            .map(String::as_str)
            .filter(|key| *key != TEMPLATE_SECTION_KEY)
            .collect()
    }

    pub fn set_status(&mut self, id: &str, status: SectionStatus) -> Result<(), ContentError> {
        self.entry_mut(id)?.status = status;
        Ok(())
    }

    pub fn set_plan_field(&mut self, id: &str, field: PlanField) -> Result<(), ContentError> {
        let plan = &mut self.entry_mut(id)?.plan;
        match field {
            PlanField::WantText(value) => plan.want_text = value,
            PlanField::WantFigure(value) => plan.want_figure = value,
            PlanField::WantTable(value) => plan.want_table = value,
        }
        Ok(())
    }

    /// Sets the length target; `0` restores the default target.
    pub fn set_length(&mut self, id: &str, target: u32) -> Result<(), ContentError> {
        let length = &mut self.entry_mut(id)?.length;
        length.target = if target == 0 {
            DEFAULT_LENGTH_TARGET
        } else {
            target
        };
        if length.unit.trim().is_empty() {
            length.unit = DEFAULT_LENGTH_UNIT.to_string();
        }
        Ok(())
    }

    pub fn set_text_prompt(
        &mut self,
        id: &str,
        prompt: impl Into<String>,
    ) -> Result<(), ContentError> {
        self.entry_mut(id)?.text_prompt = prompt.into();
        Ok(())
    }

    pub fn set_text(&mut self, id: &str, text: impl Into<String>) -> Result<(), ContentError> {
        self.entry_mut(id)?.text = text.into();
        Ok(())
    }

    /// Appends an enabled, untitled figure plan item. Returns its index.
    pub fn add_figure_plan(&mut self, id: &str) -> Result<usize, ContentError> {
        let prompt_template = self.defaults.figure_prompt_template.clone();
        let figure_plan = &mut self.entry_mut(id)?.plan.figure_plan;
        figure_plan.push(FigureSpec {
            enabled: true,
            prompt_template,
            ..FigureSpec::default()
        });
        Ok(figure_plan.len() - 1)
    }

    pub fn update_figure_plan(
        &mut self,
        id: &str,
        index: usize,
        field: FigurePlanField,
    ) -> Result<(), ContentError> {
        let item = item_mut(id, &mut self.entry_mut(id)?.plan.figure_plan, index)?;
        match field {
            FigurePlanField::Enabled(value) => item.enabled = value,
            FigurePlanField::Title(value) => item.figure_title = value,
            FigurePlanField::Focus(value) => item.figure_focus = value,
            FigurePlanField::PromptTemplate(value) => item.prompt_template = value,
        }
        Ok(())
    }

    pub fn remove_figure_plan(
        &mut self,
        id: &str,
        index: usize,
    ) -> Result<FigureSpec, ContentError> {
        remove_item(id, &mut self.entry_mut(id)?.plan.figure_plan, index)
    }

    /// Appends an enabled, untitled table plan item. Returns its index.
    pub fn add_table_plan(&mut self, id: &str) -> Result<usize, ContentError> {
        let prompt_template = self.defaults.table_prompt_template.clone();
        let table_plan = &mut self.entry_mut(id)?.plan.table_plan;
        table_plan.push(TableSpec {
            enabled: true,
            prompt_template,
            ..TableSpec::default()
        });
        Ok(table_plan.len() - 1)
    }

    pub fn update_table_plan(
        &mut self,
        id: &str,
        index: usize,
        field: TablePlanField,
    ) -> Result<(), ContentError> {
        let item = item_mut(id, &mut self.entry_mut(id)?.plan.table_plan, index)?;
        match field {
            TablePlanField::Enabled(value) => item.enabled = value,
            TablePlanField::Title(value) => item.table_title = value,
            TablePlanField::Schema(value) => item.schema = value,
            TablePlanField::PromptTemplate(value) => item.prompt_template = value,
        }
        Ok(())
    }

    pub fn remove_table_plan(&mut self, id: &str, index: usize) -> Result<TableSpec, ContentError> {
        remove_item(id, &mut self.entry_mut(id)?.plan.table_plan, index)
    }

    pub fn add_figure(&mut self, id: &str, record: FigureRecord) -> Result<usize, ContentError> {
        let figures = &mut self.entry_mut(id)?.figures;
        figures.push(record);
        Ok(figures.len() - 1)
    }

    pub fn update_figure(
        &mut self,
        id: &str,
        index: usize,
        record: FigureRecord,
    ) -> Result<(), ContentError> {
        *item_mut(id, &mut self.entry_mut(id)?.figures, index)? = record;
        Ok(())
    }

    pub fn remove_figure(&mut self, id: &str, index: usize) -> Result<FigureRecord, ContentError> {
        remove_item(id, &mut self.entry_mut(id)?.figures, index)
    }

    pub fn add_table(&mut self, id: &str, record: TableRecord) -> Result<usize, ContentError> {
        let tables = &mut self.entry_mut(id)?.tables;
        tables.push(record);
        Ok(tables.len() - 1)
    }

    pub fn update_table(
        &mut self,
        id: &str,
        index: usize,
        record: TableRecord,
    ) -> Result<(), ContentError> {
        *item_mut(id, &mut self.entry_mut(id)?.tables, index)? = record;
        Ok(())
    }

    pub fn remove_table(&mut self, id: &str, index: usize) -> Result<TableRecord, ContentError> {
        remove_item(id, &mut self.entry_mut(id)?.tables, index)
    }

    /// Re-keys entries for one rename batch.
    ///
    /// All `from` keys are detached before any entry is re-inserted, so
    /// chained renames (`2 -> 3`, `3 -> 4`) never clobber each other. Missing
    /// `from` keys are skipped and the sentinel is never moved.
    pub fn apply_renames(&mut self, renames: &[IdRename]) -> usize {
        let detached = renames
            .iter()
            .filter(|rename| {
                rename.from != TEMPLATE_SECTION_KEY && rename.to != TEMPLATE_SECTION_KEY
            })
            .filter_map(|rename| {
                self.contents
                    .remove(&rename.from)
                    .map(|entry| (rename.to.clone(), entry))
            })
            .collect::<Vec<_>>();

        let moved = detached.len();
        for (to, entry) in detached {
            self.contents.insert(to, entry);
        }
        moved
    }

    pub(crate) fn entry_mut(&mut self, id: &str) -> Result<&mut ContentEntry, ContentError> {
        self.contents
            .get_mut(id)
            .ok_or_else(|| ContentError::SectionNotFound(id.to_string()))
    }
}

fn item_mut<'a, T>(
    section_id: &str,
    items: &'a mut [T],
    index: usize,
) -> Result<&'a mut T, ContentError> {
    let len = items.len();
    items.get_mut(index).ok_or_else(|| ContentError::IndexOutOfRange {
        section_id: section_id.to_string(),
        index,
        len,
    })
}

fn remove_item<T>(section_id: &str, items: &mut Vec<T>, index: usize) -> Result<T, ContentError> {
    if index >= items.len() {
        return Err(ContentError::IndexOutOfRange {
            section_id: section_id.to_string(),
            index,
            len: items.len(),
        });
    }
    Ok(items.remove(index))
}
