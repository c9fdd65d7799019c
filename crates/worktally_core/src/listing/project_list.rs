//! Paginated per-user project listing with name search.
//!
//! # Responsibility
//! - Resolve one page of a user's projects, newest first.
//! - Embed each project's pause history into the page items.
//!
//! # Invariants
//! - Result ordering is deterministic by `id DESC`.
//! - `total_items` always counts the full filtered set, not the page.
//! - Search input is matched as a literal substring; LIKE wildcards in the
//!   input never widen the match.

use crate::db::DbError;
use crate::model::pause_note::PauseNote;
use crate::model::project::Project;
use crate::model::user::UserId;
use crate::repo::project_repo::{
    list_pause_notes_for, parse_project_row, ProjectRepoError, PROJECT_SELECT_SQL,
};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_PAGE_SIZE: u32 = 10;

/// Result type for listing APIs.
pub type ListingResult<T> = Result<T, ListingError>;

/// Listing-layer error for owner resolution, DB interaction and row decoding.
#[derive(Debug)]
pub enum ListingError {
    /// Requested owner does not resolve to a stored account.
    UnknownUser(UserId),
    Db(DbError),
    InvalidData(String),
}

impl Display for ListingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUser(user_id) => write!(f, "unknown user: {user_id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid list row: {message}"),
        }
    }
}

impl Error for ListingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for ListingError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ListingError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ProjectRepoError> for ListingError {
    fn from(value: ProjectRepoError) -> Self {
        match value {
            ProjectRepoError::Db(err) => Self::Db(err),
            ProjectRepoError::InvalidData(message) => Self::InvalidData(message),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Query options for one listing page.
#[derive(Debug, Clone)]
pub struct ProjectListQuery {
    /// Owner whose projects are listed.
    pub user_id: UserId,
    /// Optional name filter, matched as a literal substring.
    pub search: Option<String>,
    /// 1-based page number. `None` and `0` resolve to the first page.
    pub page: Option<u32>,
    /// Page length. `None` and `0` resolve to the default of 10.
    pub page_size: Option<u32>,
}

impl ProjectListQuery {
    /// Creates a first-page query with default page size and no filter.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            search: None,
            page: None,
            page_size: None,
        }
    }
}

/// One list item: the project plus its full pause history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectWithPauseNotes {
    pub project: Project,
    /// Pause history, oldest entry first.
    pub pause_notes: Vec<PauseNote>,
}

/// One resolved listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPage {
    /// Page items sorted by `id DESC`.
    pub items: Vec<ProjectWithPauseNotes>,
    /// Effective 1-based page number.
    pub page: u32,
    /// Effective page length.
    pub page_size: u32,
    /// Count of the full filtered set.
    pub total_items: u64,
    /// Page count for the filtered set; zero when nothing matches.
    pub total_pages: u32,
}

/// Resolves one page of the owner's projects, newest first.
///
/// A page past the end of the set returns empty items with the real totals.
pub fn list_projects(conn: &Connection, query: &ProjectListQuery) -> ListingResult<ProjectPage> {
    if !owner_exists(conn, query.user_id)? {
        return Err(ListingError::UnknownUser(query.user_id));
    }

    let page = normalize_page(query.page);
    let page_size = normalize_page_size(query.page_size);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty());

    let mut filter = String::from("WHERE user_id = ?");
    let mut filter_values: Vec<Value> = vec![Value::Integer(query.user_id)];
    if let Some(text) = search {
        filter.push_str(" AND project_name LIKE ? ESCAPE '\\'");
        filter_values.push(Value::Text(format!("%{}%", escape_like(text))));
    }

    let total_items = count_projects(conn, &filter, &filter_values)?;
    let total_pages = page_count(total_items, page_size);

    let sql = format!("{PROJECT_SELECT_SQL} {filter} ORDER BY id DESC LIMIT ? OFFSET ?");
    let mut bind_values = filter_values;
    bind_values.push(Value::Integer(i64::from(page_size)));
    bind_values.push(Value::Integer(i64::from(page - 1) * i64::from(page_size)));

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut projects: Vec<Project> = Vec::new();
    while let Some(row) = rows.next()? {
        projects.push(parse_project_row(row)?);
    }

    let mut items = Vec::with_capacity(projects.len());
    for project in projects {
        let pause_notes = list_pause_notes_for(conn, project.id)?;
        items.push(ProjectWithPauseNotes {
            project,
            pause_notes,
        });
    }

    Ok(ProjectPage {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    })
}

fn owner_exists(conn: &Connection, user_id: UserId) -> ListingResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn count_projects(
    conn: &Connection,
    filter: &str,
    filter_values: &[Value],
) -> ListingResult<u64> {
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM projects {filter};"),
        params_from_iter(filter_values.iter().cloned()),
        |row| row.get(0),
    )?;
    Ok(total.max(0) as u64)
}

fn normalize_page(page: Option<u32>) -> u32 {
    match page {
        Some(0) | None => 1,
        Some(value) => value,
    }
}

fn normalize_page_size(page_size: Option<u32>) -> u32 {
    match page_size {
        Some(0) | None => DEFAULT_PAGE_SIZE,
        Some(value) => value,
    }
}

fn page_count(total_items: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size);
    ((total_items + page_size - 1) / page_size) as u32
}

/// Escapes LIKE wildcards so user input matches literally.
///
/// The produced pattern must be bound with `ESCAPE '\'`.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_like, normalize_page, normalize_page_size, page_count};

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(normalize_page(None), 1);
        assert_eq!(normalize_page(Some(0)), 1);
        assert_eq!(normalize_page(Some(3)), 3);
    }

    #[test]
    fn page_size_defaults_to_ten() {
        assert_eq!(normalize_page_size(None), 10);
        assert_eq!(normalize_page_size(Some(0)), 10);
        assert_eq!(normalize_page_size(Some(25)), 25);
    }

    #[test]
    fn page_count_rounds_up_and_handles_empty_sets() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(25, 10), 3);
    }

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
