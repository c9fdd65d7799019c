//! User account domain model.
//!
//! # Responsibility
//! - Define the canonical account record and its creation input shape.
//! - Validate account fields before they reach persistence.
//!
//! # Invariants
//! - `email` is unique across accounts and matched byte-for-byte.
//! - `credential_hash` holds a PHC-format Argon2 string, never a raw
//!   password.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier for one user account.
///
/// Assigned by storage from an autoincrement column, so ids grow with
/// creation order and are never reused.
pub type UserId = i64;

/// Canonical account record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Display name, submitted as one string at signup.
    pub name: String,
    /// Unique login identifier.
    pub email: String,
    /// PHC-format Argon2 hash. Outward surfaces must never expose it.
    pub credential_hash: String,
    /// Public URL of the first profile image, when one was uploaded.
    pub image1: Option<String>,
    /// Public URL of the second profile image, when one was uploaded.
    pub image2: Option<String>,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

/// Input shape for account creation.
///
/// Carries the already-hashed credential; hashing happens in the account
/// service before this struct is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub credential_hash: String,
    pub image1: Option<String>,
    pub image2: Option<String>,
}

impl NewUser {
    /// Checks field shape before persistence.
    ///
    /// # Invariants
    /// - `name`, `email` and `credential_hash` must be non-blank.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        for (field, value) in [
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("credential_hash", self.credential_hash.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(UserValidationError::BlankField(field));
            }
        }
        Ok(())
    }
}

/// Validation error for account input shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserValidationError {
    BlankField(&'static str),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "user field `{field}` cannot be blank"),
        }
    }
}

impl Error for UserValidationError {}
