//! API error type shared by all route handlers.
//!
//! # Responsibility
//! - Map domain errors onto HTTP statuses and caller-facing messages.
//! - Keep internal failure detail out of responses; it goes to the log.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;
use std::fmt::Display;
use thiserror::Error;
use worktally_core::{
    AccountServiceError, ListingError, ProjectRepoError, ProjectServiceError, UserRepoError,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Missing email or password")]
    MissingCredentials,
    #[error("User already exists")]
    DuplicateEmail,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error("Project not found")]
    ProjectNotFound,
    #[error("Version conflict: expected {expected}, actual {actual}")]
    VersionConflict { expected: i64, actual: i64 },
    #[error("Project is already paused")]
    AlreadyPaused,
    #[error("Project is not paused")]
    NotPaused,
    #[error("Malformed multipart body")]
    Multipart,
    #[error("{0}")]
    InvalidField(String),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Logs the cause and returns the caller-safe 500 error.
    pub fn internal(cause: impl Display) -> Self {
        error!("event=internal_error module=server status=error detail={cause}");
        Self::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingFields
            | Self::MissingCredentials
            | Self::DuplicateEmail
            | Self::Multipart
            | Self::InvalidField(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UserNotFound | Self::ProjectNotFound => StatusCode::NOT_FOUND,
            Self::VersionConflict { .. } | Self::AlreadyPaused | Self::NotPaused => {
                StatusCode::CONFLICT
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<AccountServiceError> for ApiError {
    fn from(value: AccountServiceError) -> Self {
        match value {
            AccountServiceError::MissingField(_) => Self::MissingFields,
            AccountServiceError::DuplicateEmail(_) => Self::DuplicateEmail,
            AccountServiceError::InvalidCredentials => Self::InvalidCredentials,
            AccountServiceError::Hashing(detail) => Self::internal(detail),
            AccountServiceError::Repo(err) => err.into(),
        }
    }
}

impl From<UserRepoError> for ApiError {
    fn from(value: UserRepoError) -> Self {
        match value {
            UserRepoError::DuplicateEmail(_) => Self::DuplicateEmail,
            UserRepoError::Validation(_) => Self::MissingFields,
            other => Self::internal(other),
        }
    }
}

impl From<ProjectServiceError> for ApiError {
    fn from(value: ProjectServiceError) -> Self {
        match value {
            ProjectServiceError::UnknownUser(_) => Self::UserNotFound,
            ProjectServiceError::ProjectNotFound(_) => Self::ProjectNotFound,
            ProjectServiceError::VersionConflict {
                expected, actual, ..
            } => Self::VersionConflict { expected, actual },
            ProjectServiceError::AlreadyPaused(_) => Self::AlreadyPaused,
            ProjectServiceError::NotPaused(_) => Self::NotPaused,
            ProjectServiceError::Validation(_) => Self::MissingFields,
            ProjectServiceError::Repo(err) => Self::internal(err),
        }
    }
}

impl From<ProjectRepoError> for ApiError {
    fn from(value: ProjectRepoError) -> Self {
        ProjectServiceError::from(value).into()
    }
}

impl From<ListingError> for ApiError {
    fn from(value: ListingError) -> Self {
        match value {
            ListingError::UnknownUser(_) => Self::UserNotFound,
            other => Self::internal(other),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(_: MultipartError) -> Self {
        Self::Multipart
    }
}
