use paper_outline_core::model::content::{
    create_default_entry, ContentMeta, FigureRecord, PromptDefaults, RecordStatus, SectionLength,
    TableRecord, DEFAULT_LENGTH_TARGET, DEFAULT_THEME,
};
use paper_outline_core::{
    ContentError, ContentStore, FigurePlanField, IdRename, PlanField, SectionStatus,
    TablePlanField, TEMPLATE_SECTION_KEY,
};
use serde_json::json;

fn store() -> ContentStore {
    let mut store = ContentStore {
        meta: ContentMeta {
            title: "Thesis".to_string(),
            theme: "robots".to_string(),
        },
        defaults: PromptDefaults {
            text_prompt_template: "Write {{sectionTitle}} for {{theme}}".to_string(),
            figure_prompt_template: "Draw {{figureFocus}}".to_string(),
            table_prompt_template: "Tabulate {{schema}}".to_string(),
        },
        ..ContentStore::default()
    };
    let intro = store.create_default_entry("Intro");
    store.contents.insert("1".to_string(), intro);
    store
}

fn rename(from: &str, to: &str) -> IdRename {
    IdRename {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[test]
fn default_entry_without_sentinel_uses_builtin_length() {
    let entry = create_default_entry(None, "Intro", &PromptDefaults::default(), "");

    assert_eq!(entry.status, SectionStatus::Planning);
    assert_eq!(entry.section_title, "Intro");
    assert_eq!(entry.length, SectionLength::default());
    assert_eq!(entry.length.target, DEFAULT_LENGTH_TARGET);
    assert!(entry.plan.want_text);
    assert!(!entry.plan.want_figure);
    assert!(!entry.plan.want_table);
    assert!(entry.text_prompt.contains("\"Intro\""));
    assert!(entry.text_prompt.contains(DEFAULT_THEME));
    assert!(entry.text.is_empty());
    assert!(entry.figures.is_empty());
    assert!(entry.tables.is_empty());
}

#[test]
fn default_entry_copies_sentinel_length_and_renders_prompt() {
    let mut store = store();
    let mut sentinel = store.create_default_entry("");
    sentinel.length = SectionLength {
        unit: "word".to_string(),
        target: 250,
    };
    store
        .contents
        .insert(TEMPLATE_SECTION_KEY.to_string(), sentinel);

    let entry = store.create_default_entry("Design");
    assert_eq!(entry.length.unit, "word");
    assert_eq!(entry.length.target, 250);
    assert_eq!(entry.text_prompt, "Write Design for robots");
    assert_eq!(store.section_ids(), vec!["1"]);
}

#[test]
fn field_mutators_update_tracked_sections() {
    let mut store = store();

    store.set_status("1", SectionStatus::Generated).unwrap();
    store.set_plan_field("1", PlanField::WantFigure(true)).unwrap();
    store.set_plan_field("1", PlanField::WantText(false)).unwrap();
    store.set_text_prompt("1", "custom").unwrap();
    store.set_text("1", "body").unwrap();
    store.set_length("1", 1200).unwrap();

    let entry = store.entry("1").unwrap();
    assert_eq!(entry.status, SectionStatus::Generated);
    assert!(entry.plan.want_figure);
    assert!(!entry.plan.want_text);
    assert_eq!(entry.text_prompt, "custom");
    assert_eq!(entry.text, "body");
    assert_eq!(entry.length.target, 1200);

    store.set_length("1", 0).unwrap();
    assert_eq!(store.entry("1").unwrap().length.target, DEFAULT_LENGTH_TARGET);
}

#[test]
fn mutators_on_untracked_section_fail_without_creating_it() {
    let mut store = store();
    let before = store.clone();

    assert_eq!(
        store.set_text("9", "x"),
        Err(ContentError::SectionNotFound("9".to_string()))
    );
    assert!(matches!(
        store.add_figure_plan("9"),
        Err(ContentError::SectionNotFound(_))
    ));
    assert!(matches!(
        store.remove_table("9", 0),
        Err(ContentError::SectionNotFound(_))
    ));
    assert_eq!(store, before);
}

#[test]
fn figure_plan_items_are_added_updated_and_removed_by_index() {
    let mut store = store();

    let first = store.add_figure_plan("1").unwrap();
    let second = store.add_figure_plan("1").unwrap();
    assert_eq!((first, second), (0, 1));

    store
        .update_figure_plan("1", 1, FigurePlanField::Title("Architecture".to_string()))
        .unwrap();
    store
        .update_figure_plan("1", 1, FigurePlanField::Focus("modules".to_string()))
        .unwrap();
    store
        .update_figure_plan("1", 0, FigurePlanField::Enabled(false))
        .unwrap();

    let plan = &store.entry("1").unwrap().plan.figure_plan;
    assert!(!plan[0].enabled);
    assert!(plan[1].enabled);
    assert_eq!(plan[1].figure_title, "Architecture");
    assert_eq!(plan[1].figure_focus, "modules");
    assert_eq!(plan[1].prompt_template, "Draw {{figureFocus}}");

    let removed = store.remove_figure_plan("1", 0).unwrap();
    assert!(!removed.enabled);
    assert_eq!(store.entry("1").unwrap().plan.figure_plan.len(), 1);
}

#[test]
fn table_plan_out_of_range_reports_index_and_len() {
    let mut store = store();
    store.add_table_plan("1").unwrap();
    store
        .update_table_plan(
            "1",
            0,
            TablePlanField::Schema(vec!["Field".to_string(), "Type".to_string()]),
        )
        .unwrap();
    let before = store.clone();

    let err = store
        .update_table_plan("1", 3, TablePlanField::Enabled(false))
        .unwrap_err();
    assert_eq!(
        err,
        ContentError::IndexOutOfRange {
            section_id: "1".to_string(),
            index: 3,
            len: 1,
        }
    );
    assert!(matches!(
        store.remove_table_plan("1", 1),
        Err(ContentError::IndexOutOfRange { index: 1, len: 1, .. })
    ));
    assert_eq!(store, before);
    assert_eq!(
        store.entry("1").unwrap().plan.table_plan[0].schema,
        vec!["Field", "Type"]
    );
}

#[test]
fn artifact_records_are_managed_by_index() {
    let mut store = store();

    let index = store
        .add_figure(
            "1",
            FigureRecord {
                label: "Figure 1-1 Overview".to_string(),
                title: "Overview".to_string(),
                status: RecordStatus::Pending,
                ..FigureRecord::default()
            },
        )
        .unwrap();
    store
        .update_figure(
            "1",
            index,
            FigureRecord {
                label: "Figure 1-1 Overview".to_string(),
                title: "Overview".to_string(),
                image_path: Some("figures/overview.png".to_string()),
                status: RecordStatus::Success,
                ..FigureRecord::default()
            },
        )
        .unwrap();
    assert_eq!(
        store.entry("1").unwrap().figures[0].image_path.as_deref(),
        Some("figures/overview.png")
    );

    store.add_table("1", TableRecord::default()).unwrap();
    assert!(matches!(
        store.update_table("1", 5, TableRecord::default()),
        Err(ContentError::IndexOutOfRange { index: 5, len: 1, .. })
    ));
    store.remove_table("1", 0).unwrap();
    let removed = store.remove_figure("1", 0).unwrap();
    assert_eq!(removed.status, RecordStatus::Success);

    let entry = store.entry("1").unwrap();
    assert!(entry.figures.is_empty());
    assert!(entry.tables.is_empty());
}

#[test]
fn apply_renames_moves_chained_keys_without_clobbering() {
    let mut store = store();
    for (id, title) in [("2", "B"), ("3", "C")] {
        let entry = store.create_default_entry(title);
        store.contents.insert(id.to_string(), entry);
    }

    let moved = store.apply_renames(&[rename("2", "3"), rename("3", "4"), rename("7", "8")]);

    assert_eq!(moved, 2);
    assert_eq!(store.section_ids(), vec!["1", "3", "4"]);
    assert_eq!(store.entry("3").unwrap().section_title, "B");
    assert_eq!(store.entry("4").unwrap().section_title, "C");
}

#[test]
fn apply_renames_never_moves_the_sentinel() {
    let mut store = store();
    let sentinel = store.create_default_entry("");
    store
        .contents
        .insert(TEMPLATE_SECTION_KEY.to_string(), sentinel);

    let moved = store.apply_renames(&[
        rename(TEMPLATE_SECTION_KEY, "5"),
        rename("1", TEMPLATE_SECTION_KEY),
    ]);

    assert_eq!(moved, 0);
    assert!(store.template_entry().is_some());
    assert!(store.entry("1").is_some());
}

#[test]
fn store_uses_camel_case_wire_format() {
    let mut store = store();
    store.set_plan_field("1", PlanField::WantTable(true)).unwrap();
    store.add_table_plan("1").unwrap();

    let value = serde_json::to_value(&store).unwrap();
    let entry = &value["contents"]["1"];
    assert_eq!(
        value["defaults"]["textPromptTemplate"],
        json!("Write {{sectionTitle}} for {{theme}}")
    );
    assert_eq!(entry["status"], json!("planning"));
    assert_eq!(entry["sectionTitle"], json!("Intro"));
    assert_eq!(entry["length"], json!({ "unit": "char", "target": 900 }));
    assert_eq!(entry["plan"]["wantTable"], json!(true));
    assert_eq!(entry["plan"]["tablePlan"][0]["enabled"], json!(true));
    assert_eq!(entry["textPrompt"], json!("Write Intro for robots"));

    let decoded: ContentStore = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, store);
}

#[test]
fn sparse_documents_fill_in_defaults() {
    let store: ContentStore = serde_json::from_value(json!({
        "contents": {
            "1": { "sectionTitle": "Intro", "figures": [ { "label": "Figure 1-1", "status": "error" } ] }
        }
    }))
    .unwrap();

    let entry = store.entry("1").unwrap();
    assert_eq!(entry.status, SectionStatus::Planning);
    assert_eq!(entry.length, SectionLength::default());
    assert!(entry.plan.want_text);
    assert_eq!(entry.figures[0].status, RecordStatus::Error);
    assert_eq!(store.theme(), DEFAULT_THEME);
}
