//! Core domain logic for Worktally.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod listing;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use listing::project_list::{
    list_projects, ListingError, ListingResult, ProjectListQuery, ProjectPage,
    ProjectWithPauseNotes,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::pause_note::{NewPauseNote, PauseNote, PauseNoteId};
pub use model::project::{
    FieldUpdate, NewProject, Project, ProjectId, ProjectPatch, ProjectPhase,
    ProjectValidationError,
};
pub use model::user::{NewUser, User, UserId, UserValidationError};
pub use repo::project_repo::{
    ProjectRepoError, ProjectRepoResult, ProjectRepository, SqliteProjectRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepoError, UserRepoResult, UserRepository};
pub use service::account_service::{AccountService, AccountServiceError, SignupRequest};
pub use service::project_service::{
    CreateProjectRequest, PauseProjectRequest, ProjectService, ProjectServiceError,
    ResumeProjectRequest, UpdateProjectRequest,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
