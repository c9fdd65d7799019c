use rusqlite::{params, Connection};
use worktally_core::db::open_db_in_memory;
use worktally_core::{
    CreateProjectRequest, ProjectPhase, ProjectRepoError, ProjectService, ProjectServiceError,
    SqliteProjectRepository, UserId,
};

fn seed_user(conn: &Connection, email: &str) -> UserId {
    conn.execute(
        "INSERT INTO users (name, email, credential_hash) VALUES ('Dana', ?1, 'hash');",
        params![email],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn create_request(user_id: UserId, name: &str) -> CreateProjectRequest {
    CreateProjectRequest {
        user_id,
        project_name: name.to_string(),
        gap: "daily".to_string(),
        total_numbers: 40,
        current_state: 0,
        image1: None,
        image2: None,
    }
}

#[test]
fn create_project_persists_fields_and_defaults() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");
    let repo = SqliteProjectRepository::try_new(&mut conn).unwrap();
    let mut service = ProjectService::new(repo);

    let project = service
        .create_project(CreateProjectRequest {
            user_id,
            project_name: "Inventory".to_string(),
            gap: "daily".to_string(),
            total_numbers: 40,
            current_state: 3,
            image1: Some("http://localhost:4000/uploads/cover.png".to_string()),
            image2: None,
        })
        .unwrap();

    assert!(project.id >= 1);
    assert_eq!(project.user_id, user_id);
    assert_eq!(project.project_name, "Inventory");
    assert_eq!(project.gap, "daily");
    assert_eq!(project.total_numbers, 40);
    assert_eq!(project.current_state, 3);
    assert!(project.handled_by.is_none());
    assert!(project.passed_time.is_none());
    assert_eq!(project.phase, ProjectPhase::Running);
    assert_eq!(project.version, 1);
    assert_eq!(
        project.image1.as_deref(),
        Some("http://localhost:4000/uploads/cover.png")
    );
    assert!(project.created_at > 0);
    assert_eq!(project.created_at, project.updated_at);
}

#[test]
fn create_project_rejects_unknown_owner() {
    let mut conn = open_db_in_memory().unwrap();

    {
        let repo = SqliteProjectRepository::try_new(&mut conn).unwrap();
        let mut service = ProjectService::new(repo);
        let err = service.create_project(create_request(42, "Orphan")).unwrap_err();
        assert!(matches!(err, ProjectServiceError::UnknownUser(42)));
    }

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM projects;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn create_project_rejects_blank_name_and_gap() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");
    let repo = SqliteProjectRepository::try_new(&mut conn).unwrap();
    let mut service = ProjectService::new(repo);

    let err = service
        .create_project(create_request(user_id, "   "))
        .unwrap_err();
    assert!(matches!(err, ProjectServiceError::Validation(_)));

    let err = service
        .create_project(CreateProjectRequest {
            gap: String::new(),
            ..create_request(user_id, "Inventory")
        })
        .unwrap_err();
    assert!(matches!(err, ProjectServiceError::Validation(_)));
}

#[test]
fn get_project_returns_stored_record_or_none() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");
    let repo = SqliteProjectRepository::try_new(&mut conn).unwrap();
    let mut service = ProjectService::new(repo);
    let created = service
        .create_project(create_request(user_id, "Inventory"))
        .unwrap();

    let found = service.get_project(created.id).unwrap().unwrap();
    assert_eq!(found, created);
    assert!(service.get_project(created.id + 100).unwrap().is_none());
}

#[test]
fn project_ids_follow_creation_order() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");
    let repo = SqliteProjectRepository::try_new(&mut conn).unwrap();
    let mut service = ProjectService::new(repo);

    let first = service
        .create_project(create_request(user_id, "First"))
        .unwrap();
    let second = service
        .create_project(create_request(user_id, "Second"))
        .unwrap();

    assert!(second.id > first.id);
}

#[test]
fn project_repo_rejects_unmigrated_connection() {
    let mut conn = Connection::open_in_memory().unwrap();

    let err = SqliteProjectRepository::try_new(&mut conn).unwrap_err();
    assert!(matches!(
        err,
        ProjectRepoError::UninitializedConnection { .. }
    ));
}
