use paper_outline_core::db::open_db_in_memory;
use paper_outline_core::repo::project_repo::{NewProject, StoredDocument};
use paper_outline_core::{
    IdStrategy, OutlineTree, ProjectDocument, ProjectRepository, RepoError,
    SqliteProjectRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn document(title: &str) -> ProjectDocument {
    let mut outline = OutlineTree::new(title).with_id_strategy(IdStrategy::Hierarchical);
    outline.insert_root("Introduction");
    let mut document = ProjectDocument {
        outline,
        ..ProjectDocument::default()
    };
    document.content.meta.theme = "robots".to_string();
    document
}

fn new_project(name: &str) -> NewProject {
    NewProject {
        name: name.to_string(),
        document: document("Thesis"),
    }
}

#[test]
fn try_new_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteProjectRepository::try_new(&conn).unwrap_err();
    match err {
        RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        } => {
            assert!(expected_version > 0);
            assert_eq!(actual_version, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn create_then_get_and_find_by_name() {
    let conn = setup();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();

    let created = repo.create_project(&new_project("thesis")).unwrap();
    assert_eq!(created.name, "thesis");
    assert_eq!(created.title, "Thesis");
    assert_eq!(created.theme, "robots");
    assert_eq!(created.version, 1);
    assert_eq!(created.created_at, created.updated_at);

    let by_id = repo.get_project(created.id).unwrap();
    assert_eq!(by_id, Some(created.clone()));
    let by_name = repo.find_project_by_name("thesis").unwrap();
    assert_eq!(by_name, Some(created));

    assert_eq!(repo.get_project(Uuid::new_v4()).unwrap(), None);
    assert_eq!(repo.find_project_by_name("missing").unwrap(), None);
}

#[test]
fn duplicate_name_is_rejected() {
    let conn = setup();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    repo.create_project(&new_project("thesis")).unwrap();

    let err = repo.create_project(&new_project("thesis")).unwrap_err();
    match err {
        RepoError::DuplicateName(name) => assert_eq!(name, "thesis"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn list_orders_by_updated_at_desc_then_name() {
    let conn = setup();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let alpha = repo.create_project(&new_project("alpha")).unwrap();
    let beta = repo.create_project(&new_project("beta")).unwrap();
    let gamma = repo.create_project(&new_project("gamma")).unwrap();

    set_updated_at(&conn, alpha.id, 100);
    set_updated_at(&conn, beta.id, 100);
    set_updated_at(&conn, gamma.id, 200);

    let names = repo
        .list_projects()
        .unwrap()
        .into_iter()
        .map(|project| project.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["gamma", "alpha", "beta"]);
}

#[test]
fn load_returns_stored_document_at_version_one() {
    let conn = setup();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let created = repo.create_project(&new_project("thesis")).unwrap();

    let StoredDocument { version, document } = repo.load_document(created.id).unwrap();
    assert_eq!(version, 1);
    assert_eq!(document, self::document("Thesis"));
    assert_eq!(document.outline.nodes[0].id, "1");
}

#[test]
fn save_bumps_version_and_mirrors_title_and_theme() {
    let conn = setup();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let created = repo.create_project(&new_project("thesis")).unwrap();

    let mut updated = document("Final thesis");
    updated.content.meta.theme = "drones".to_string();
    updated.outline.insert_root("Design");

    let version = repo.save_document(created.id, 1, &updated).unwrap();
    assert_eq!(version, 2);

    let stored = repo.load_document(created.id).unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.document, updated);

    let project = repo.get_project(created.id).unwrap().unwrap();
    assert_eq!(project.version, 2);
    assert_eq!(project.title, "Final thesis");
    assert_eq!(project.theme, "drones");
    assert!(project.updated_at >= project.created_at);
}

#[test]
fn stale_base_version_conflicts_without_writing() {
    let conn = setup();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let created = repo.create_project(&new_project("thesis")).unwrap();
    repo.save_document(created.id, 1, &document("First"))
        .unwrap();

    let err = repo
        .save_document(created.id, 1, &document("Second"))
        .unwrap_err();
    match err {
        RepoError::VersionConflict {
            project_id,
            expected,
            actual,
        } => {
            assert_eq!(project_id, created.id);
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    let stored = repo.load_document(created.id).unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.document.outline.title, "First");
}

#[test]
fn missing_project_reports_not_found() {
    let conn = setup();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let id = Uuid::new_v4();

    assert!(matches!(
        repo.load_document(id),
        Err(RepoError::NotFound(missing)) if missing == id
    ));
    assert!(matches!(
        repo.save_document(id, 1, &document("x")),
        Err(RepoError::NotFound(_))
    ));
    assert!(matches!(
        repo.delete_project(id),
        Err(RepoError::NotFound(_))
    ));
}

#[test]
fn delete_removes_project_and_frees_name() {
    let conn = setup();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let created = repo.create_project(&new_project("thesis")).unwrap();

    repo.delete_project(created.id).unwrap();
    assert_eq!(repo.get_project(created.id).unwrap(), None);
    assert!(repo.list_projects().unwrap().is_empty());

    repo.create_project(&new_project("thesis")).unwrap();
}

#[test]
fn corrupted_document_surfaces_serialization_error() {
    let conn = setup();
    let repo = SqliteProjectRepository::try_new(&conn).unwrap();
    let created = repo.create_project(&new_project("thesis")).unwrap();
    conn.execute(
        "UPDATE projects SET outline_json = 'not json' WHERE project_uuid = ?1;",
        [created.id.to_string()],
    )
    .unwrap();

    assert!(matches!(
        repo.load_document(created.id),
        Err(RepoError::Serialization(_))
    ));
}

fn set_updated_at(conn: &Connection, id: Uuid, updated_at: i64) {
    conn.execute(
        "UPDATE projects SET updated_at = ?1 WHERE project_uuid = ?2;",
        rusqlite::params![updated_at, id.to_string()],
    )
    .unwrap();
}
