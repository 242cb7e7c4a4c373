//! Command dispatch.
//!
//! Every mutating command opens an edit session, applies one edit and saves.

use crate::args::{Cli, Commands, ContentCommands, OutlineCommands, ProjectCommands};
use crate::error::CliError;
use crate::render::{render_content_summary, render_outline};
use paper_outline_core::{
    open_db, BuiltinTemplates, DirectoryTemplates, EditSession, FigurePlanField, OutlineConfig,
    PlanField, Project, ProjectRepository, ProjectService, SessionError, SqliteProjectRepository,
    TablePlanField, TemplateProvider,
};

/// Runs the parsed command against the configured database.
pub fn execute(cli: &Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => OutlineConfig::load(path)?,
        None => OutlineConfig::default(),
    };

    let conn = open_db(&cli.db)?;
    let repo = SqliteProjectRepository::try_new(&conn)?;
    let builtin = BuiltinTemplates;
    let directory = cli.templates.as_ref().map(DirectoryTemplates::new);
    let templates: &dyn TemplateProvider = match &directory {
        Some(directory) => directory,
        None => &builtin,
    };
    let service = ProjectService::new(repo, templates).with_id_strategy(config.id_strategy);

    match &cli.command {
        Commands::Project { command } => project(&service, command),
        Commands::Outline { project, command } => outline(&service, project, command),
        Commands::Content { project, command } => content(&service, &config, project, command),
        Commands::Validate { project } => validate(&service, project),
    }
}

fn project<R: ProjectRepository, T: TemplateProvider>(
    service: &ProjectService<R, T>,
    command: &ProjectCommands,
) -> Result<(), CliError> {
    match command {
        ProjectCommands::New { name, title, theme } => {
            let project = service.create_project(name, title, theme)?;
            println!("created {} ({})", project.name, project.id);
        }
        ProjectCommands::List => {
            for project in service.list_projects()? {
                println!(
                    "{}\tv{}\t{}\t{}",
                    project.name, project.version, project.title, project.id
                );
            }
        }
        ProjectCommands::Delete { name } => {
            let project = resolve(service, name)?;
            service.delete_project(project.id)?;
            println!("deleted {}", project.name);
        }
    }
    Ok(())
}

fn outline<R: ProjectRepository, T: TemplateProvider>(
    service: &ProjectService<R, T>,
    name: &str,
    command: &OutlineCommands,
) -> Result<(), CliError> {
    let project = resolve(service, name)?;
    let mut session = service.open_session(project.id)?;

    match command {
        OutlineCommands::Show { ids } => {
            print!("{}", render_outline(session.tree(), *ids));
            return Ok(());
        }
        OutlineCommands::AddRoot { title } => {
            let node = session.insert_root(title.as_str());
            println!("added {}", node.id);
        }
        OutlineCommands::AddChild { parent, title } => {
            let node = session.insert_child(parent, title.as_str())?;
            println!("added {}", node.id);
        }
        OutlineCommands::AddSibling { after, title } => {
            let node = session.insert_sibling(after, title.as_str())?;
            println!("added {}", node.id);
        }
        OutlineCommands::Delete { id } => {
            if !session.delete_subtree(id) {
                return Err(CliError::UnknownSection(id.clone()));
            }
        }
        OutlineCommands::Move { source, target } => session.move_node(source, target)?,
        OutlineCommands::Rename { id, title } => session.rename_node(id, title.as_str())?,
        OutlineCommands::Retitle { title } => session.rename_tree(title.as_str()),
        OutlineCommands::Collapse { id } => set_collapsed(&mut session, id.as_deref(), true)?,
        OutlineCommands::Expand { id } => set_collapsed(&mut session, id.as_deref(), false)?,
    }

    save(&mut session)
}

fn content<R: ProjectRepository, T: TemplateProvider>(
    service: &ProjectService<R, T>,
    config: &OutlineConfig,
    name: &str,
    command: &ContentCommands,
) -> Result<(), CliError> {
    let project = resolve(service, name)?;
    let mut session = service.open_session(project.id)?;

    match command {
        ContentCommands::Show { id: None } => {
            print!("{}", render_content_summary(session.tree(), session.store()));
            return Ok(());
        }
        ContentCommands::Show { id: Some(id) } => {
            let entry = session
                .store()
                .entry(id)
                .ok_or_else(|| CliError::UnknownSection(id.clone()))?;
            println!("{}", serde_json::to_string_pretty(entry)?);
            return Ok(());
        }
        ContentCommands::Sync => {
            let report = session.sync();
            println!(
                "created={} retitled={} pruned={}",
                report.created.len(),
                report.retitled.len(),
                report.pruned.len()
            );
        }
        ContentCommands::Prefill => {
            let report = session.prefill(&config.prefill);
            println!(
                "planned={} figures={} tables={}",
                report.planned.len(),
                report.with_figures.len(),
                report.with_tables.len()
            );
        }
        ContentCommands::SetText { id, text } => {
            session.edit_content(|store| store.set_text(id, text.as_str()))?;
        }
        ContentCommands::SetPrompt { id, prompt } => {
            session.edit_content(|store| store.set_text_prompt(id, prompt.as_str()))?;
        }
        ContentCommands::SetLength { id, target } => {
            session.edit_content(|store| store.set_length(id, *target))?;
        }
        ContentCommands::Plan {
            id,
            want_text,
            want_figure,
            want_table,
            add_figure,
            add_table,
        } => {
            session.edit_content(|store| {
                if let Some(value) = want_text {
                    store.set_plan_field(id, PlanField::WantText(*value))?;
                }
                if let Some(value) = want_figure {
                    store.set_plan_field(id, PlanField::WantFigure(*value))?;
                }
                if let Some(value) = want_table {
                    store.set_plan_field(id, PlanField::WantTable(*value))?;
                }
                if let Some(title) = add_figure {
                    let index = store.add_figure_plan(id)?;
                    store.update_figure_plan(id, index, FigurePlanField::Title(title.clone()))?;
                    store.set_plan_field(id, PlanField::WantFigure(true))?;
                }
                if let Some(title) = add_table {
                    let index = store.add_table_plan(id)?;
                    store.update_table_plan(id, index, TablePlanField::Title(title.clone()))?;
                    store.set_plan_field(id, PlanField::WantTable(true))?;
                }
                Ok(())
            })?;
        }
    }

    save(&mut session)
}

fn validate<R: ProjectRepository, T: TemplateProvider>(
    service: &ProjectService<R, T>,
    name: &str,
) -> Result<(), CliError> {
    let project = resolve(service, name)?;
    let session = service.open_session(project.id)?;
    let report = session.validate();
    if !report.is_valid() {
        return Err(SessionError::ValidationFailed(report).into());
    }
    println!("outline is valid ({} sections)", session.tree().node_count());
    Ok(())
}

fn resolve<R: ProjectRepository, T: TemplateProvider>(
    service: &ProjectService<R, T>,
    name: &str,
) -> Result<Project, CliError> {
    service
        .find_project(name)?
        .ok_or_else(|| CliError::UnknownProject(name.to_string()))
}

fn set_collapsed<R: ProjectRepository>(
    session: &mut EditSession<R>,
    id: Option<&str>,
    collapsed: bool,
) -> Result<(), CliError> {
    match id {
        Some(id) => session.set_collapsed(id, collapsed)?,
        None => session.set_all_collapsed(collapsed),
    }
    Ok(())
}

fn save<R: ProjectRepository>(session: &mut EditSession<R>) -> Result<(), CliError> {
    let report = session.save()?;
    println!(
        "saved version {} (created={} retitled={} pruned={})",
        report.version,
        report.sync.created.len(),
        report.sync.retitled.len(),
        report.sync.pruned.len()
    );
    Ok(())
}
