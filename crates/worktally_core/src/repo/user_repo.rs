//! User account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide account persistence APIs over canonical `users` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `NewUser::validate()` before SQL mutations.
//! - `email` uniqueness is enforced by storage, not trusted from callers.
//! - Email lookup is byte-for-byte; `A@x` and `a@x` are different accounts.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::user::{NewUser, User, UserId, UserValidationError};
use crate::repo::{schema_version, table_exists, table_has_column};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    credential_hash,
    image1,
    image2,
    created_at
FROM users";

const USER_COLUMNS: &[&str] = &[
    "id",
    "name",
    "email",
    "credential_hash",
    "image1",
    "image2",
    "created_at",
];

pub type UserRepoResult<T> = Result<T, UserRepoError>;

/// Repository error for account persistence and query operations.
#[derive(Debug)]
pub enum UserRepoError {
    Validation(UserValidationError),
    Db(DbError),
    /// The email column's UNIQUE constraint fired.
    DuplicateEmail(String),
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

impl Display for UserRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateEmail(email) => write!(f, "account already exists for `{email}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted account data: {message}"),
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

impl Error for UserRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserValidationError> for UserRepoError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for UserRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for UserRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for account operations.
pub trait UserRepository {
    /// Persists one account and returns the stored record.
    fn create_user(&self, user: &NewUser) -> UserRepoResult<User>;
    /// Finds one account by exact email.
    fn find_by_email(&self, email: &str) -> UserRepoResult<Option<User>>;
    /// Finds one account by id.
    fn find_by_id(&self, id: UserId) -> UserRepoResult<Option<User>>;
}

/// SQLite-backed account repository.
#[derive(Debug)]
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> UserRepoResult<Self> {
        ensure_user_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn load_required_user(&self, id: UserId) -> UserRepoResult<User> {
        self.find_by_id(id)?.ok_or_else(|| {
            UserRepoError::InvalidData(format!("user {id} missing right after insert"))
        })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> UserRepoResult<User> {
        user.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO users (name, email, credential_hash, image1, image2)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.name.as_str(),
                user.email.as_str(),
                user.credential_hash.as_str(),
                user.image1.as_deref(),
                user.image2.as_deref(),
            ],
        );

        if let Err(err) = inserted {
            if is_unique_violation(&err) {
                return Err(UserRepoError::DuplicateEmail(user.email.clone()));
            }
            return Err(err.into());
        }

        self.load_required_user(self.conn.last_insert_rowid())
    }

    fn find_by_email(&self, email: &str) -> UserRepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1;"))?;
        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_by_id(&self, id: UserId) -> UserRepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }
}

fn parse_user_row(row: &Row<'_>) -> UserRepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        credential_hash: row.get("credential_hash")?,
        image1: row.get("image1")?,
        image2: row.get("image2")?,
        created_at: row.get("created_at")?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn ensure_user_connection_ready(conn: &Connection) -> UserRepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(UserRepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "users")? {
        return Err(UserRepoError::MissingRequiredTable("users"));
    }
    for &column in USER_COLUMNS {
        if !table_has_column(conn, "users", column)? {
            return Err(UserRepoError::MissingRequiredColumn {
                table: "users",
                column,
            });
        }
    }

    Ok(())
}
