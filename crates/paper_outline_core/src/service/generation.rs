//! Generation run orchestration over an external engine.
//!
//! # Responsibility
//! - Render per-section prompts and hand them to a `GenerationEngine`.
//! - Write generated text, figure and table records back into the store.
//! - Derive each section's status from the outcome of its attempts.
//!
//! # Invariants
//! - Engine failures never abort the run; they become `error` records and
//!   entries in `GenerationReport::failures`.
//! - Sections with nothing to attempt keep their status and artifacts.
//! - Only enabled plan items produce records.

use crate::model::content::{
    render_template, ContentEntry, ContentStore, FigureRecord, FigureSpec, PromptVars,
    RecordStatus, SectionLength, SectionStatus, TableData, TableRecord, TableSpec,
    DEFAULT_TEXT_PROMPT_TEMPLATE, TEMPLATE_SECTION_KEY,
};
use crate::model::outline::OutlineTree;
use chrono::{SecondsFormat, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Text generation input for one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest<'a> {
    pub section_id: &'a str,
    /// Display outline number, e.g. `2.1`.
    pub number: &'a str,
    pub section_title: &'a str,
    pub prompt: String,
    pub length: &'a SectionLength,
}

/// Figure generation input for one enabled plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FigureRequest<'a> {
    pub section_id: &'a str,
    pub label: String,
    pub spec: &'a FigureSpec,
    pub prompt: String,
}

/// Table generation input for one enabled plan item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest<'a> {
    pub section_id: &'a str,
    pub label: String,
    pub spec: &'a TableSpec,
    pub prompt: String,
}

/// Artifact location returned by a figure generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFigure {
    pub image_path: String,
}

/// Failure reported by a generation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "generation failed: {}", self.message)
    }
}

impl Error for GenerationError {}

/// External producer of section text, figures and tables.
pub trait GenerationEngine {
    fn generate_text(&mut self, request: &TextRequest<'_>) -> Result<String, GenerationError>;
    fn generate_figure(
        &mut self,
        request: &FigureRequest<'_>,
    ) -> Result<GeneratedFigure, GenerationError>;
    fn generate_table(&mut self, request: &TableRequest<'_>) -> Result<TableData, GenerationError>;
}

/// Artifact kind of one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Text,
    Figure,
    Table,
}

/// One failed engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationFailure {
    pub section_id: String,
    pub kind: ArtifactKind,
    /// Record label for figures and tables.
    pub label: Option<String>,
    pub message: String,
}

/// Outcome of one `run_generation` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Sections with at least one attempt, in outline order.
    pub attempted_sections: Vec<String>,
    pub succeeded: usize,
    pub failures: Vec<GenerationFailure>,
}

impl GenerationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the engine over every planned section in outline order.
pub fn run_generation(
    tree: &OutlineTree,
    store: &mut ContentStore,
    engine: &mut dyn GenerationEngine,
) -> GenerationReport {
    let mut report = GenerationReport::default();

    for section in tree.outline_numbers() {
        if section.id == TEMPLATE_SECTION_KEY {
            continue;
        }
        let Some(entry) = store.contents.get(&section.id) else {
            warn!(
                "event=content_generate module=service status=skipped reason=untracked_section node_id={}",
                section.id
            );
            continue;
        };

        let mut updated = entry.clone();
        let outcome = generate_section(
            &SectionContext {
                id: &section.id,
                number: &section.number,
                store,
            },
            entry,
            &mut updated,
            engine,
            &mut report,
        );
        if outcome.attempted == 0 {
            continue;
        }

        updated.status = if outcome.failed == 0 {
            SectionStatus::Generated
        } else if outcome.failed == outcome.attempted {
            SectionStatus::Failed
        } else {
            SectionStatus::Partial
        };
        report.succeeded += outcome.attempted - outcome.failed;
        report.attempted_sections.push(section.id.clone());
        store.contents.insert(section.id, updated);
    }

    info!(
        "event=content_generate module=service status={} sections={} succeeded={} failed={}",
        if report.is_clean() { "ok" } else { "partial" },
        report.attempted_sections.len(),
        report.succeeded,
        report.failures.len()
    );
    report
}

struct SectionContext<'a> {
    id: &'a str,
    number: &'a str,
    store: &'a ContentStore,
}

#[derive(Default)]
struct SectionOutcome {
    attempted: usize,
    failed: usize,
}

fn generate_section(
    ctx: &SectionContext<'_>,
    entry: &ContentEntry,
    updated: &mut ContentEntry,
    engine: &mut dyn GenerationEngine,
    report: &mut GenerationReport,
) -> SectionOutcome {
    let mut outcome = SectionOutcome::default();
    let theme = ctx.store.theme();
    let vars = PromptVars::new(&entry.section_title, theme);

    if entry.plan.want_text {
        let prompt = if entry.text_prompt.trim().is_empty() {
            let template = non_empty_or(
                &ctx.store.defaults.text_prompt_template,
                DEFAULT_TEXT_PROMPT_TEMPLATE,
            );
            render_template(template, &vars)
        } else {
            entry.text_prompt.clone()
        };
        let request = TextRequest {
            section_id: ctx.id,
            number: ctx.number,
            section_title: &entry.section_title,
            prompt,
            length: &entry.length,
        };

        outcome.attempted += 1;
        match engine.generate_text(&request) {
            Ok(text) => updated.text = text,
            Err(err) => {
                outcome.failed += 1;
                report.failures.push(GenerationFailure {
                    section_id: ctx.id.to_string(),
                    kind: ArtifactKind::Text,
                    label: None,
                    message: err.message,
                });
            }
        }
    }

    if entry.plan.want_figure {
        updated.figures.clear();
        let enabled = entry.plan.figure_plan.iter().filter(|spec| spec.enabled);
        for (position, spec) in enabled.enumerate() {
            let label = format!("Figure {}-{} {}", ctx.number, position + 1, spec.figure_title);
            let template = non_empty_or(
                &spec.prompt_template,
                &ctx.store.defaults.figure_prompt_template,
            );
            let request = FigureRequest {
                section_id: ctx.id,
                label: label.clone(),
                spec,
                prompt: render_template(template, &vars.with_figure_focus(&spec.figure_focus)),
            };

            outcome.attempted += 1;
            let record = match engine.generate_figure(&request) {
                Ok(figure) => FigureRecord {
                    label,
                    title: spec.figure_title.clone(),
                    image_path: Some(figure.image_path),
                    status: RecordStatus::Success,
                    generated_at: Some(timestamp()),
                    error: None,
                },
                Err(err) => {
                    outcome.failed += 1;
                    report.failures.push(GenerationFailure {
                        section_id: ctx.id.to_string(),
                        kind: ArtifactKind::Figure,
                        label: Some(label.clone()),
                        message: err.message.clone(),
                    });
                    FigureRecord {
                        label,
                        title: spec.figure_title.clone(),
                        image_path: None,
                        status: RecordStatus::Error,
                        generated_at: None,
                        error: Some(err.message),
                    }
                }
            };
            updated.figures.push(record);
        }
    }

    if entry.plan.want_table {
        updated.tables.clear();
        let enabled = entry.plan.table_plan.iter().filter(|spec| spec.enabled);
        for (position, spec) in enabled.enumerate() {
            let label = format!("Table {}-{} {}", ctx.number, position + 1, spec.table_title);
            let template = non_empty_or(
                &spec.prompt_template,
                &ctx.store.defaults.table_prompt_template,
            );
            let request = TableRequest {
                section_id: ctx.id,
                label: label.clone(),
                spec,
                prompt: render_template(template, &vars.with_schema(&spec.schema)),
            };

            outcome.attempted += 1;
            let record = match engine.generate_table(&request) {
                Ok(data) => TableRecord {
                    label,
                    title: spec.table_title.clone(),
                    data: Some(data),
                    status: RecordStatus::Success,
                    generated_at: Some(timestamp()),
                    error: None,
                },
                Err(err) => {
                    outcome.failed += 1;
                    report.failures.push(GenerationFailure {
                        section_id: ctx.id.to_string(),
                        kind: ArtifactKind::Table,
                        label: Some(label.clone()),
                        message: err.message.clone(),
                    });
                    TableRecord {
                        label,
                        title: spec.table_title.clone(),
                        data: None,
                        status: RecordStatus::Error,
                        generated_at: None,
                        error: Some(err.message),
                    }
                }
            };
            updated.tables.push(record);
        }
    }

    outcome
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
