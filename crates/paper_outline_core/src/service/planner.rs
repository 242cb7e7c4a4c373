//! Keyword-driven generation plan prefill.
//!
//! # Responsibility
//! - Suggest a section plan (figures, tables) from the section title.
//! - Seed plans for sections that have no content entry yet.
//!
//! # Invariants
//! - Keyword matching is case-insensitive substring matching.
//! - `prefill` never touches an existing entry and never prunes.

use crate::model::content::{
    render_template, ContentStore, FigureSpec, PromptDefaults, PromptVars, SectionPlan, TableSpec,
    TEMPLATE_SECTION_KEY,
};
use crate::model::outline::OutlineTree;
use log::info;
use serde::{Deserialize, Serialize};

/// Figure title and focus used when a keyword matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigurePreset {
    pub keyword: String,
    pub title: String,
    pub focus: String,
}

/// Table title and columns used when a keyword matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePreset {
    pub keyword: String,
    pub title: String,
    pub schema: Vec<String>,
}

/// Heuristics for `suggest_plan`.
///
/// Presets are tried in order; the first keyword found in the title wins.
/// Fallback titles are templates over `{{sectionTitle}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrefillRules {
    pub figure_keywords: Vec<String>,
    pub table_keywords: Vec<String>,
    pub figure_presets: Vec<FigurePreset>,
    pub table_presets: Vec<TablePreset>,
    pub fallback_figure_title: String,
    pub fallback_figure_focus: String,
    pub fallback_table_title: String,
    pub fallback_table_schema: Vec<String>,
}

impl Default for PrefillRules {
    fn default() -> Self {
        Self {
            figure_keywords: strings(&[
                "架构",
                "设计",
                "流程",
                "结构",
                "框图",
                "用例",
                "时序",
                "ER图",
                "architecture",
                "design",
                "flow",
                "process",
                "structure",
                "diagram",
                "use case",
                "sequence",
            ]),
            table_keywords: strings(&[
                "测试",
                "需求",
                "对比",
                "数据库",
                "字段",
                "接口",
                "性能",
                "test",
                "requirement",
                "comparison",
                "database",
                "field",
                "interface",
                "performance",
            ]),
            figure_presets: vec![
                figure_preset("架构", "系统架构图", "整体架构和模块关系"),
                figure_preset("设计", "设计方案图", "设计思路和实现方案"),
                figure_preset("流程", "业务流程图", "流程步骤和决策点"),
                figure_preset("用例", "用例图", "用户角色和系统交互"),
                figure_preset(
                    "architecture",
                    "System architecture diagram",
                    "overall architecture and module relations",
                ),
                figure_preset(
                    "design",
                    "Design overview diagram",
                    "design approach and implementation",
                ),
                figure_preset(
                    "flow",
                    "Process flow diagram",
                    "process steps and decision points",
                ),
                figure_preset(
                    "use case",
                    "Use case diagram",
                    "user roles and system interactions",
                ),
            ],
            table_presets: vec![
                table_preset("测试", "测试用例表", &["测试项", "输入", "预期输出", "实际结果"]),
                table_preset("需求", "需求分析表", &["需求ID", "需求描述", "优先级", "状态"]),
                table_preset(
                    "数据库",
                    "数据库设计表",
                    &["字段名", "类型", "长度", "约束", "说明"],
                ),
                table_preset(
                    "test",
                    "Test case table",
                    &["Test item", "Input", "Expected output", "Actual result"],
                ),
                table_preset(
                    "requirement",
                    "Requirements table",
                    &["Requirement ID", "Description", "Priority", "Status"],
                ),
                table_preset(
                    "database",
                    "Database design table",
                    &["Field", "Type", "Length", "Constraint", "Description"],
                ),
            ],
            fallback_figure_title: "{{sectionTitle}} diagram".to_string(),
            fallback_figure_focus: "key points and relations".to_string(),
            fallback_table_title: "{{sectionTitle}} summary".to_string(),
            fallback_table_schema: strings(&["Item", "Content", "Notes"]),
        }
    }
}

/// Sections seeded by one `prefill` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefillReport {
    /// Every section that received a new entry, in outline order.
    pub planned: Vec<String>,
    /// Subset of `planned` that wants a figure.
    pub with_figures: Vec<String>,
    /// Subset of `planned` that wants a table.
    pub with_tables: Vec<String>,
}

/// Suggests a plan for one section title.
///
/// Text is always wanted. A figure (table) plan with one enabled item is added
/// when the title contains a figure (table) keyword.
pub fn suggest_plan(title: &str, defaults: &PromptDefaults, rules: &PrefillRules) -> SectionPlan {
    let haystack = title.to_lowercase();
    let want_figure = contains_any(&haystack, &rules.figure_keywords);
    let want_table = contains_any(&haystack, &rules.table_keywords);

    let figure_plan = if want_figure {
        vec![suggest_figure(title, &haystack, defaults, rules)]
    } else {
        Vec::new()
    };
    let table_plan = if want_table {
        vec![suggest_table(title, &haystack, defaults, rules)]
    } else {
        Vec::new()
    };

    SectionPlan {
        want_text: true,
        want_figure,
        figure_plan,
        want_table,
        table_plan,
    }
}

/// Creates planned entries for every outline section without one.
pub fn prefill(
    tree: &OutlineTree,
    store: &mut ContentStore,
    rules: &PrefillRules,
) -> PrefillReport {
    let mut report = PrefillReport::default();

    for (node, _) in tree.preorder() {
        if node.id == TEMPLATE_SECTION_KEY || store.contents.contains_key(&node.id) {
            continue;
        }

        let mut entry = store.create_default_entry(&node.title);
        entry.plan = suggest_plan(&node.title, &store.defaults, rules);
        if entry.plan.want_figure {
            report.with_figures.push(node.id.clone());
        }
        if entry.plan.want_table {
            report.with_tables.push(node.id.clone());
        }
        store.contents.insert(node.id.clone(), entry);
        report.planned.push(node.id.clone());
    }

    info!(
        "event=content_prefill module=service status=ok planned={} figures={} tables={}",
        report.planned.len(),
        report.with_figures.len(),
        report.with_tables.len()
    );
    report
}

fn suggest_figure(
    title: &str,
    haystack: &str,
    defaults: &PromptDefaults,
    rules: &PrefillRules,
) -> FigureSpec {
    let (figure_title, figure_focus) = rules
        .figure_presets
        .iter()
        .find(|preset| matches_keyword(haystack, &preset.keyword))
        .map(|preset| (preset.title.clone(), preset.focus.clone()))
        .unwrap_or_else(|| {
            (
                render_fallback(&rules.fallback_figure_title, title),
                rules.fallback_figure_focus.clone(),
            )
        });

    FigureSpec {
        enabled: true,
        figure_title,
        figure_focus,
        prompt_template: defaults.figure_prompt_template.clone(),
    }
}

fn suggest_table(
    title: &str,
    haystack: &str,
    defaults: &PromptDefaults,
    rules: &PrefillRules,
) -> TableSpec {
    let (table_title, schema) = rules
        .table_presets
        .iter()
        .find(|preset| matches_keyword(haystack, &preset.keyword))
        .map(|preset| (preset.title.clone(), preset.schema.clone()))
        .unwrap_or_else(|| {
            (
                render_fallback(&rules.fallback_table_title, title),
                rules.fallback_table_schema.clone(),
            )
        });

    TableSpec {
        enabled: true,
        table_title,
        schema,
        prompt_template: defaults.table_prompt_template.clone(),
    }
}

fn render_fallback(template: &str, title: &str) -> String {
    render_template(template, &PromptVars::new(title, ""))
}

fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .any(|keyword| matches_keyword(haystack, keyword))
}

fn matches_keyword(haystack: &str, keyword: &str) -> bool {
    !keyword.is_empty() && haystack.contains(&keyword.to_lowercase())
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn figure_preset(keyword: &str, title: &str, focus: &str) -> FigurePreset {
    FigurePreset {
        keyword: keyword.to_string(),
        title: title.to_string(),
        focus: focus.to_string(),
    }
}

fn table_preset(keyword: &str, title: &str, schema: &[&str]) -> TablePreset {
    TablePreset {
        keyword: keyword.to_string(),
        title: title.to_string(),
        schema: strings(schema),
    }
}
