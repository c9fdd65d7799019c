//! Account use-case service.
//!
//! # Responsibility
//! - Provide signup, login and profile lookup over the user repository.
//! - Hash and verify credentials with Argon2id so raw passwords never
//!   reach storage.
//!
//! # Invariants
//! - `credential_hash` always holds a PHC-format Argon2 hash string.
//! - Unknown email and wrong password both surface as `InvalidCredentials`.
//!
//! # See also
//! - docs/architecture/http-api.md

use crate::model::user::{NewUser, User, UserId};
use crate::repo::user_repo::{UserRepoError, UserRepoResult, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for account use-cases.
#[derive(Debug)]
pub enum AccountServiceError {
    /// A required signup or login field is blank.
    MissingField(&'static str),
    /// Another account already uses this email.
    DuplicateEmail(String),
    /// Email/password pair does not match a stored account.
    InvalidCredentials,
    /// Credential hashing or stored-hash parsing failed.
    Hashing(String),
    /// Persistence-layer failure.
    Repo(UserRepoError),
}

impl Display for AccountServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field: `{field}`"),
            Self::DuplicateEmail(email) => write!(f, "email already registered: `{email}`"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Hashing(details) => write!(f, "credential hashing failed: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AccountServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserRepoError> for AccountServiceError {
    fn from(value: UserRepoError) -> Self {
        match value {
            UserRepoError::DuplicateEmail(email) => Self::DuplicateEmail(email),
            other => Self::Repo(other),
        }
    }
}

/// Signup input before hashing.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Public URL of the first stored upload, if any.
    pub image1: Option<String>,
    /// Public URL of the second stored upload, if any.
    pub image2: Option<String>,
}

/// Account service facade over repository implementations.
pub struct AccountService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccountService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers one account, hashing the password before storage.
    pub fn sign_up(&self, request: SignupRequest) -> Result<User, AccountServiceError> {
        require_field("name", &request.name)?;
        require_field("email", &request.email)?;
        require_field("password", &request.password)?;

        let credential_hash = hash_password(&request.password)?;
        let user = self.repo.create_user(&NewUser {
            name: request.name,
            email: request.email,
            credential_hash,
            image1: request.image1,
            image2: request.image2,
        })?;
        Ok(user)
    }

    /// Checks an email/password pair and returns the matching account.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, AccountServiceError> {
        require_field("email", email)?;
        require_field("password", password)?;

        let Some(user) = self.repo.find_by_email(email)? else {
            return Err(AccountServiceError::InvalidCredentials);
        };
        if !verify_password(password, &user.credential_hash)? {
            return Err(AccountServiceError::InvalidCredentials);
        }
        Ok(user)
    }

    /// Gets one account by stable ID.
    pub fn get_user(&self, id: UserId) -> UserRepoResult<Option<User>> {
        self.repo.find_by_id(id)
    }
}

fn require_field(field: &'static str, value: &str) -> Result<(), AccountServiceError> {
    if value.trim().is_empty() {
        return Err(AccountServiceError::MissingField(field));
    }
    Ok(())
}

/// Hashes a password with a fresh random salt into a PHC-format string.
pub fn hash_password(password: &str) -> Result<String, AccountServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AccountServiceError::Hashing(err.to_string()))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC-format hash string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AccountServiceError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| AccountServiceError::Hashing(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_produces_phc_string_with_unique_salts() {
        let first = hash_password("hunter2").unwrap();
        let second = hash_password("hunter2").unwrap();
        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second);
    }

    #[test]
    fn verify_accepts_matching_password_only() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
