use rusqlite::{params, Connection};
use worktally_core::db::open_db_in_memory;
use worktally_core::{
    list_projects, CreateProjectRequest, ListingError, PauseProjectRequest, ProjectListQuery,
    ProjectPatch, ProjectService, SqliteProjectRepository, UserId,
};

fn seed_user(conn: &Connection, email: &str) -> UserId {
    conn.execute(
        "INSERT INTO users (name, email, credential_hash) VALUES ('Dana', ?1, 'hash');",
        params![email],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn seed_projects(conn: &mut Connection, user_id: UserId, names: &[&str]) -> Vec<i64> {
    let repo = SqliteProjectRepository::try_new(conn).unwrap();
    let mut service = ProjectService::new(repo);
    names
        .iter()
        .map(|name| {
            service
                .create_project(CreateProjectRequest {
                    user_id,
                    project_name: name.to_string(),
                    gap: "daily".to_string(),
                    total_numbers: 40,
                    current_state: 0,
                    image1: None,
                    image2: None,
                })
                .unwrap()
                .id
        })
        .collect()
}

#[test]
fn listing_returns_newest_first_with_embedded_history() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");
    let ids = seed_projects(&mut conn, user_id, &["Oldest", "Middle", "Newest"]);

    {
        let repo = SqliteProjectRepository::try_new(&mut conn).unwrap();
        let mut service = ProjectService::new(repo);
        service
            .pause_project(PauseProjectRequest {
                id: ids[1],
                expected_version: 1,
                paused_at: "15".to_string(),
                note: "material shortage".to_string(),
                patch: ProjectPatch::default(),
            })
            .unwrap();
    }

    let page = list_projects(&conn, &ProjectListQuery::new(user_id)).unwrap();

    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 1);
    let names: Vec<&str> = page
        .items
        .iter()
        .map(|item| item.project.project_name.as_str())
        .collect();
    assert_eq!(names, vec!["Newest", "Middle", "Oldest"]);

    let middle = &page.items[1];
    assert_eq!(middle.pause_notes.len(), 1);
    assert_eq!(middle.pause_notes[0].note, "material shortage");
    assert!(page.items[0].pause_notes.is_empty());
    assert!(page.items[2].pause_notes.is_empty());
}

#[test]
fn listing_paginates_with_full_set_totals() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");
    let names: Vec<String> = (0..25).map(|idx| format!("Batch {idx:02}")).collect();
    let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
    seed_projects(&mut conn, user_id, &name_refs);

    let first = list_projects(
        &conn,
        &ProjectListQuery {
            page: Some(1),
            ..ProjectListQuery::new(user_id)
        },
    )
    .unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.page, 1);
    assert_eq!(first.page_size, 10);
    assert_eq!(first.total_items, 25);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.items[0].project.project_name, "Batch 24");

    let last = list_projects(
        &conn,
        &ProjectListQuery {
            page: Some(3),
            ..ProjectListQuery::new(user_id)
        },
    )
    .unwrap();
    assert_eq!(last.items.len(), 5);
    assert_eq!(last.items[4].project.project_name, "Batch 00");

    let past_end = list_projects(
        &conn,
        &ProjectListQuery {
            page: Some(4),
            ..ProjectListQuery::new(user_id)
        },
    )
    .unwrap();
    assert!(past_end.items.is_empty());
    assert_eq!(past_end.total_items, 25);
    assert_eq!(past_end.total_pages, 3);
}

#[test]
fn page_zero_and_none_resolve_to_first_page() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");
    seed_projects(&mut conn, user_id, &["Solo"]);

    let defaulted = list_projects(&conn, &ProjectListQuery::new(user_id)).unwrap();
    assert_eq!(defaulted.page, 1);
    assert_eq!(defaulted.page_size, 10);

    let zeroed = list_projects(
        &conn,
        &ProjectListQuery {
            page: Some(0),
            page_size: Some(0),
            ..ProjectListQuery::new(user_id)
        },
    )
    .unwrap();
    assert_eq!(zeroed.page, 1);
    assert_eq!(zeroed.page_size, 10);
}

#[test]
fn search_matches_name_substring_case_insensitively() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");
    seed_projects(&mut conn, user_id, &["ALPHA Bridge", "bridgex", "Gamma"]);

    let hits = list_projects(
        &conn,
        &ProjectListQuery {
            search: Some("bridge".to_string()),
            ..ProjectListQuery::new(user_id)
        },
    )
    .unwrap();
    assert_eq!(hits.total_items, 2);
    let names: Vec<&str> = hits
        .items
        .iter()
        .map(|item| item.project.project_name.as_str())
        .collect();
    assert_eq!(names, vec!["bridgex", "ALPHA Bridge"]);

    let upper = list_projects(
        &conn,
        &ProjectListQuery {
            search: Some("BRIDGE".to_string()),
            ..ProjectListQuery::new(user_id)
        },
    )
    .unwrap();
    assert_eq!(upper.total_items, 2);
}

#[test]
fn search_treats_like_wildcards_literally() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");
    seed_projects(&mut conn, user_id, &["100% done", "100x done", "a_b", "axb"]);

    let percent = list_projects(
        &conn,
        &ProjectListQuery {
            search: Some("100%".to_string()),
            ..ProjectListQuery::new(user_id)
        },
    )
    .unwrap();
    assert_eq!(percent.total_items, 1);
    assert_eq!(percent.items[0].project.project_name, "100% done");

    let underscore = list_projects(
        &conn,
        &ProjectListQuery {
            search: Some("a_b".to_string()),
            ..ProjectListQuery::new(user_id)
        },
    )
    .unwrap();
    assert_eq!(underscore.total_items, 1);
    assert_eq!(underscore.items[0].project.project_name, "a_b");
}

#[test]
fn blank_search_is_ignored() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");
    seed_projects(&mut conn, user_id, &["First", "Second"]);

    let page = list_projects(
        &conn,
        &ProjectListQuery {
            search: Some("   ".to_string()),
            ..ProjectListQuery::new(user_id)
        },
    )
    .unwrap();

    assert_eq!(page.total_items, 2);
}

#[test]
fn listing_scopes_to_requested_owner() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "dana@example.com");
    let other = seed_user(&conn, "riley@example.com");
    seed_projects(&mut conn, owner, &["Mine"]);
    seed_projects(&mut conn, other, &["Theirs A", "Theirs B"]);

    let page = list_projects(&conn, &ProjectListQuery::new(owner)).unwrap();

    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].project.project_name, "Mine");
    assert_eq!(page.items[0].project.user_id, owner);

    let cross = list_projects(
        &conn,
        &ProjectListQuery {
            search: Some("Theirs".to_string()),
            ..ProjectListQuery::new(owner)
        },
    )
    .unwrap();
    assert_eq!(cross.total_items, 0);
}

#[test]
fn unknown_owner_is_rejected() {
    let conn = open_db_in_memory().unwrap();

    let err = list_projects(&conn, &ProjectListQuery::new(77)).unwrap_err();
    assert!(matches!(err, ListingError::UnknownUser(77)));
}

#[test]
fn empty_set_reports_zero_pages() {
    let conn = open_db_in_memory().unwrap();
    let user_id = seed_user(&conn, "dana@example.com");

    let page = list_projects(&conn, &ProjectListQuery::new(user_id)).unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 0);
    assert_eq!(page.total_pages, 0);
}
