//! Project use-case service.
//!
//! # Responsibility
//! - Provide create/get/update/pause/resume/history APIs over the project
//!   repository.
//! - Map repository outcomes into caller-facing error variants.
//!
//! # Invariants
//! - Every mutation carries the caller's `expected_version`; the service
//!   never retries a conflicted write.
//! - Pause and resume are the only paths that change the project phase.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::model::pause_note::{NewPauseNote, PauseNote};
use crate::model::project::{NewProject, Project, ProjectId, ProjectPatch, ProjectValidationError};
use crate::model::user::UserId;
use crate::repo::project_repo::{ProjectRepoError, ProjectRepoResult, ProjectRepository};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for project use-cases.
#[derive(Debug)]
pub enum ProjectServiceError {
    /// Project owner does not resolve to a stored account.
    UnknownUser(UserId),
    /// Target project does not exist.
    ProjectNotFound(ProjectId),
    /// Caller's version token is stale; nothing was written.
    VersionConflict {
        id: ProjectId,
        expected: i64,
        actual: i64,
    },
    /// Pause requested while the project is not running.
    AlreadyPaused(ProjectId),
    /// Resume requested while the project is not paused.
    NotPaused(ProjectId),
    /// Input failed validation.
    Validation(ProjectValidationError),
    /// Persistence-layer failure.
    Repo(ProjectRepoError),
}

impl Display for ProjectServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUser(user_id) => write!(f, "unknown project owner: {user_id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
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
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProjectRepoError> for ProjectServiceError {
    fn from(value: ProjectRepoError) -> Self {
        match value {
            ProjectRepoError::UnknownUser(user_id) => Self::UnknownUser(user_id),
            ProjectRepoError::NotFound(id) => Self::ProjectNotFound(id),
            ProjectRepoError::VersionConflict {
                id,
                expected,
                actual,
            } => Self::VersionConflict {
                id,
                expected,
                actual,
            },
            ProjectRepoError::AlreadyPaused(id) => Self::AlreadyPaused(id),
            ProjectRepoError::NotPaused(id) => Self::NotPaused(id),
            ProjectRepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

/// Input for project creation.
#[derive(Debug, Clone)]
pub struct CreateProjectRequest {
    pub user_id: UserId,
    pub project_name: String,
    pub gap: String,
    pub total_numbers: i64,
    pub current_state: i64,
    /// Public URL of the first stored upload, if any.
    pub image1: Option<String>,
    /// Public URL of the second stored upload, if any.
    pub image2: Option<String>,
}

/// Input for a plain field update.
#[derive(Debug, Clone)]
pub struct UpdateProjectRequest {
    pub id: ProjectId,
    pub expected_version: i64,
    pub patch: ProjectPatch,
}

/// Input for pausing a project. Carries the annotation pair plus an
/// optional field patch applied in the same write.
#[derive(Debug, Clone)]
pub struct PauseProjectRequest {
    pub id: ProjectId,
    pub expected_version: i64,
    pub paused_at: String,
    pub note: String,
    pub patch: ProjectPatch,
}

/// Input for resuming a paused project.
#[derive(Debug, Clone)]
pub struct ResumeProjectRequest {
    pub id: ProjectId,
    pub expected_version: i64,
    pub patch: ProjectPatch,
}

/// Project service facade over repository implementations.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one project owned by an existing account.
    pub fn create_project(
        &mut self,
        request: CreateProjectRequest,
    ) -> Result<Project, ProjectServiceError> {
        let project = self.repo.create_project(&NewProject {
            user_id: request.user_id,
            project_name: request.project_name,
            gap: request.gap,
            total_numbers: request.total_numbers,
            current_state: request.current_state,
            image1: request.image1,
            image2: request.image2,
        })?;
        Ok(project)
    }

    /// Gets one project by stable ID.
    pub fn get_project(&self, id: ProjectId) -> ProjectRepoResult<Option<Project>> {
        self.repo.get_project(id)
    }

    /// Applies a sparse field patch to a running or paused project.
    pub fn update_project(
        &mut self,
        request: UpdateProjectRequest,
    ) -> Result<Project, ProjectServiceError> {
        let project =
            self.repo
                .update_fields(request.id, request.expected_version, &request.patch)?;
        Ok(project)
    }

    /// Pauses a running project, recording one annotation entry.
    pub fn pause_project(
        &mut self,
        request: PauseProjectRequest,
    ) -> Result<Project, ProjectServiceError> {
        let pause = NewPauseNote {
            paused_at: request.paused_at,
            note: request.note,
        };
        let project = self.repo.pause_project(
            request.id,
            request.expected_version,
            &pause,
            &request.patch,
        )?;
        Ok(project)
    }

    /// Resumes a paused project. The pause history is left untouched.
    pub fn resume_project(
        &mut self,
        request: ResumeProjectRequest,
    ) -> Result<Project, ProjectServiceError> {
        let project =
            self.repo
                .resume_project(request.id, request.expected_version, &request.patch)?;
        Ok(project)
    }

    /// Returns the project's pause history, oldest entry first.
    pub fn pause_history(&self, project_id: ProjectId) -> Result<Vec<PauseNote>, ProjectServiceError> {
        let notes = self.repo.list_pause_notes(project_id)?;
        Ok(notes)
    }
}
