//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide project persistence APIs over `projects` and `pause_notes`.
//! - Own the update protocol: sparse patches, version checks and phase
//!   transitions run inside one immediate transaction per mutation.
//!
//! # Invariants
//! - Every mutation checks the caller's `expected_version` against storage
//!   and writes nothing on a mismatch.
//! - Every successful mutation bumps `version` by one and refreshes
//!   `updated_at` in the same UPDATE statement.
//! - A pause appends exactly one `pause_notes` row; no other path writes
//!   that table.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::pause_note::{NewPauseNote, PauseNote};
use crate::model::project::{
    FieldUpdate, NewProject, Project, ProjectId, ProjectPatch, ProjectPhase,
    ProjectValidationError,
};
use crate::model::user::UserId;
use crate::repo::{schema_version, table_exists, table_has_column};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub(crate) const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    project_name,
    gap,
    total_numbers,
    current_state,
    handled_by,
    passed_time,
    phase,
    version,
    image1,
    image2,
    created_at,
    updated_at
FROM projects";

const PAUSE_NOTE_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    paused_at,
    note,
    created_at
FROM pause_notes";

const PROJECT_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "project_name",
    "gap",
    "total_numbers",
    "current_state",
    "handled_by",
    "passed_time",
    "phase",
    "version",
    "image1",
    "image2",
    "created_at",
    "updated_at",
];

pub type ProjectRepoResult<T> = Result<T, ProjectRepoError>;

/// Repository error for project persistence and query operations.
#[derive(Debug)]
pub enum ProjectRepoError {
    Validation(ProjectValidationError),
    Db(DbError),
    /// Project owner does not resolve to a stored account.
    UnknownUser(UserId),
    NotFound(ProjectId),
    /// The caller's version token does not match storage; nothing was
    /// written.
    VersionConflict {
        id: ProjectId,
        expected: i64,
        actual: i64,
    },
    /// Pause requested while the project is not running.
    AlreadyPaused(ProjectId),
    /// Resume requested while the project is not paused.
    NotPaused(ProjectId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for ProjectRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownUser(user_id) => write!(f, "unknown project owner: {user_id}"),
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::VersionConflict {
                id,
                expected,
                actual,
            } => write!(
                f,
                "project {id} version conflict: expected {expected}, actual {actual}"
            ),
            Self::AlreadyPaused(id) => write!(f, "project {id} is already paused"),
            Self::NotPaused(id) => write!(f, "project {id} is not paused"),
            Self::InvalidData(message) => write!(f, "invalid persisted project data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection not migrated: expected schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for ProjectRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProjectValidationError> for ProjectRepoError {
    fn from(value: ProjectValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for ProjectRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ProjectRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for project operations.
///
/// Mutations take `&mut self` because they run inside an immediate
/// transaction on the underlying connection.
pub trait ProjectRepository {
    /// Persists one project for an existing owner and returns the stored
    /// record.
    fn create_project(&mut self, project: &NewProject) -> ProjectRepoResult<Project>;
    /// Loads one project by id.
    fn get_project(&self, id: ProjectId) -> ProjectRepoResult<Option<Project>>;
    /// Applies a sparse field patch without touching the phase.
    fn update_fields(
        &mut self,
        id: ProjectId,
        expected_version: i64,
        patch: &ProjectPatch,
    ) -> ProjectRepoResult<Project>;
    /// Flips `Running -> Paused`, appends one pause note and applies the
    /// patch, all in one transaction.
    fn pause_project(
        &mut self,
        id: ProjectId,
        expected_version: i64,
        pause: &NewPauseNote,
        patch: &ProjectPatch,
    ) -> ProjectRepoResult<Project>;
    /// Flips `Paused -> Running` and applies the patch. Appends nothing.
    fn resume_project(
        &mut self,
        id: ProjectId,
        expected_version: i64,
        patch: &ProjectPatch,
    ) -> ProjectRepoResult<Project>;
    /// Returns the project's pause history in chronological order.
    fn list_pause_notes(&self, project_id: ProjectId) -> ProjectRepoResult<Vec<PauseNote>>;
}

/// SQLite-backed project repository.
#[derive(Debug)]
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> ProjectRepoResult<Self> {
        ensure_project_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&mut self, project: &NewProject) -> ProjectRepoResult<Project> {
        project.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !user_exists(&tx, project.user_id)? {
            return Err(ProjectRepoError::UnknownUser(project.user_id));
        }

        tx.execute(
            "INSERT INTO projects (
                user_id,
                project_name,
                gap,
                total_numbers,
                current_state,
                image1,
                image2
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                project.user_id,
                project.project_name.as_str(),
                project.gap.as_str(),
                project.total_numbers,
                project.current_state,
                project.image1.as_deref(),
                project.image2.as_deref(),
            ],
        )?;

        let id = tx.last_insert_rowid();
        let created = load_required_project(&tx, id)?;
        tx.commit()?;
        Ok(created)
    }

    fn get_project(&self, id: ProjectId) -> ProjectRepoResult<Option<Project>> {
        load_project(self.conn, id)
    }

    fn update_fields(
        &mut self,
        id: ProjectId,
        expected_version: i64,
        patch: &ProjectPatch,
    ) -> ProjectRepoResult<Project> {
        patch.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = load_required_project(&tx, id)?;
        ensure_expected_version(&current, expected_version)?;

        write_project_row(&tx, id, patch, None)?;
        let updated = load_required_project(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn pause_project(
        &mut self,
        id: ProjectId,
        expected_version: i64,
        pause: &NewPauseNote,
        patch: &ProjectPatch,
    ) -> ProjectRepoResult<Project> {
        pause.validate()?;
        patch.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = load_required_project(&tx, id)?;
        ensure_expected_version(&current, expected_version)?;
        if current.phase != ProjectPhase::Running {
            return Err(ProjectRepoError::AlreadyPaused(id));
        }

        tx.execute(
            "INSERT INTO pause_notes (project_id, paused_at, note)
             VALUES (?1, ?2, ?3);",
            params![id, pause.paused_at.as_str(), pause.note.as_str()],
        )?;
        write_project_row(&tx, id, patch, Some(ProjectPhase::Paused))?;

        let updated = load_required_project(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn resume_project(
        &mut self,
        id: ProjectId,
        expected_version: i64,
        patch: &ProjectPatch,
    ) -> ProjectRepoResult<Project> {
        patch.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = load_required_project(&tx, id)?;
        ensure_expected_version(&current, expected_version)?;
        if current.phase != ProjectPhase::Paused {
            return Err(ProjectRepoError::NotPaused(id));
        }

        write_project_row(&tx, id, patch, Some(ProjectPhase::Running))?;
        let updated = load_required_project(&tx, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn list_pause_notes(&self, project_id: ProjectId) -> ProjectRepoResult<Vec<PauseNote>> {
        if load_project(self.conn, project_id)?.is_none() {
            return Err(ProjectRepoError::NotFound(project_id));
        }
        list_pause_notes_for(self.conn, project_id)
    }
}

/// Loads the pause history for one project, oldest first.
///
/// Shared with the listing module, which embeds histories into list items.
pub(crate) fn list_pause_notes_for(
    conn: &Connection,
    project_id: ProjectId,
) -> ProjectRepoResult<Vec<PauseNote>> {
    let mut stmt = conn.prepare(&format!(
        "{PAUSE_NOTE_SELECT_SQL} WHERE project_id = ?1 ORDER BY id ASC;"
    ))?;
    let mut rows = stmt.query([project_id])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(parse_pause_note_row(row)?);
    }
    Ok(notes)
}

fn load_project(conn: &Connection, id: ProjectId) -> ProjectRepoResult<Option<Project>> {
    let mut stmt = conn.prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_project_row(row)?));
    }
    Ok(None)
}

fn load_required_project(conn: &Connection, id: ProjectId) -> ProjectRepoResult<Project> {
    load_project(conn, id)?.ok_or(ProjectRepoError::NotFound(id))
}

fn ensure_expected_version(current: &Project, expected: i64) -> ProjectRepoResult<()> {
    if current.version != expected {
        return Err(ProjectRepoError::VersionConflict {
            id: current.id,
            expected,
            actual: current.version,
        });
    }
    Ok(())
}

/// Writes one mutation as a single UPDATE: patched fields, optional phase
/// flip, version bump and `updated_at` refresh.
fn write_project_row(
    conn: &Connection,
    id: ProjectId,
    patch: &ProjectPatch,
    phase: Option<ProjectPhase>,
) -> ProjectRepoResult<()> {
    let mut assignments: Vec<&'static str> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(name) = patch.project_name.as_ref() {
        assignments.push("project_name = ?");
        bind_values.push(Value::Text(name.clone()));
    }
    if let Some(gap) = patch.gap.as_ref() {
        assignments.push("gap = ?");
        bind_values.push(Value::Text(gap.clone()));
    }
    if let Some(state) = patch.current_state {
        assignments.push("current_state = ?");
        bind_values.push(Value::Integer(state));
    }
    match &patch.handled_by {
        FieldUpdate::Keep => {}
        FieldUpdate::Clear => assignments.push("handled_by = NULL"),
        FieldUpdate::Set(value) => {
            assignments.push("handled_by = ?");
            bind_values.push(Value::Text(value.clone()));
        }
    }
    match &patch.passed_time {
        FieldUpdate::Keep => {}
        FieldUpdate::Clear => assignments.push("passed_time = NULL"),
        FieldUpdate::Set(value) => {
            assignments.push("passed_time = ?");
            bind_values.push(Value::Text(value.clone()));
        }
    }
    if let Some(phase) = phase {
        assignments.push("phase = ?");
        bind_values.push(Value::Text(phase.as_str().to_string()));
    }

    assignments.push("version = version + 1");
    assignments.push("updated_at = (strftime('%s', 'now') * 1000)");

    let sql = format!(
        "UPDATE projects SET {} WHERE id = ?;",
        assignments.join(", ")
    );
    bind_values.push(Value::Integer(id));

    let changed = conn.execute(&sql, params_from_iter(bind_values))?;
    if changed == 0 {
        return Err(ProjectRepoError::NotFound(id));
    }
    Ok(())
}

fn user_exists(conn: &Connection, user_id: UserId) -> ProjectRepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn parse_project_row(row: &Row<'_>) -> ProjectRepoResult<Project> {
    let phase_text: String = row.get("phase")?;
    let phase = ProjectPhase::parse(&phase_text).ok_or_else(|| {
        ProjectRepoError::InvalidData(format!(
            "invalid phase value `{phase_text}` in projects.phase"
        ))
    })?;

    Ok(Project {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        project_name: row.get("project_name")?,
        gap: row.get("gap")?,
        total_numbers: row.get("total_numbers")?,
        current_state: row.get("current_state")?,
        handled_by: row.get("handled_by")?,
        passed_time: row.get("passed_time")?,
        phase,
        version: row.get("version")?,
        image1: row.get("image1")?,
        image2: row.get("image2")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_pause_note_row(row: &Row<'_>) -> ProjectRepoResult<PauseNote> {
    Ok(PauseNote {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        paused_at: row.get("paused_at")?,
        note: row.get("note")?,
        created_at: row.get("created_at")?,
    })
}

fn ensure_project_connection_ready(conn: &Connection) -> ProjectRepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(ProjectRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in ["users", "projects", "pause_notes"] {
        if !table_exists(conn, table)? {
            return Err(ProjectRepoError::MissingRequiredTable(table));
        }
    }
    for &column in PROJECT_COLUMNS {
        if !table_has_column(conn, "projects", column)? {
            return Err(ProjectRepoError::MissingRequiredColumn {
                table: "projects",
                column,
            });
        }
    }
    for column in ["id", "project_id", "paused_at", "note", "created_at"] {
        if !table_has_column(conn, "pause_notes", column)? {
            return Err(ProjectRepoError::MissingRequiredColumn {
                table: "pause_notes",
                column,
            });
        }
    }

    Ok(())
}
