//! Project domain model and update protocol types.
//!
//! # Responsibility
//! - Define the canonical project record and its lifecycle phase.
//! - Define the sparse patch shape shared by every mutation.
//! - Validate project fields before they reach persistence.
//!
//! # Invariants
//! - `phase` is the only source of truth for run/pause state.
//! - `version` increases by exactly one per successful mutation.
//! - `gap` and `passed_time` are opaque caller text; core never parses them.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::user::UserId;

/// Stable identifier for one project.
///
/// Assigned by storage from an autoincrement column, so ids grow with
/// creation order; descending id approximates recency.
pub type ProjectId = i64;

/// Run/pause lifecycle phase of a project.
///
/// `Running -> Paused` happens only through a pause, which records exactly
/// one [`crate::model::pause_note::PauseNote`]. `Paused -> Running` happens
/// only through a resume. There is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectPhase {
    Running,
    Paused,
}

impl ProjectPhase {
    /// Returns the stored text form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Paused => "paused",
        }
    }

    /// Parses the stored text form.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "running" => Some(Self::Running),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

/// Canonical project record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Owning account. Every project belongs to exactly one user.
    pub user_id: UserId,
    pub project_name: String,
    /// Opaque caller-defined cadence text, stored verbatim.
    pub gap: String,
    /// Total number of tracked units.
    pub total_numbers: i64,
    /// Progress counter, advanced through field patches.
    pub current_state: i64,
    /// Free-text holder annotation.
    pub handled_by: Option<String>,
    /// Opaque caller-defined elapsed-time text, stored verbatim.
    pub passed_time: Option<String>,
    pub phase: ProjectPhase,
    /// Optimistic concurrency token. Starts at 1.
    pub version: i64,
    /// Public URL of the first project image, when one was uploaded.
    pub image1: Option<String>,
    /// Public URL of the second project image, when one was uploaded.
    pub image2: Option<String>,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
    /// Last mutation timestamp in epoch milliseconds.
    pub updated_at: i64,
}

/// Input shape for project creation.
///
/// New projects always start `Running` at version 1 with empty holder and
/// elapsed-time annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub user_id: UserId,
    pub project_name: String,
    pub gap: String,
    pub total_numbers: i64,
    pub current_state: i64,
    pub image1: Option<String>,
    pub image2: Option<String>,
}

impl NewProject {
    /// Checks field shape before persistence.
    ///
    /// # Invariants
    /// - `project_name` and `gap` must be non-blank.
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.project_name.trim().is_empty() {
            return Err(ProjectValidationError::BlankField("project_name"));
        }
        if self.gap.trim().is_empty() {
            return Err(ProjectValidationError::BlankField("gap"));
        }
        Ok(())
    }
}

/// Update intent for a nullable column.
///
/// `Keep` leaves the stored value untouched, `Clear` writes NULL and `Set`
/// writes the payload. The three states let a patch erase `handled_by` or
/// `passed_time` without forcing callers to resend unrelated fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Returns whether applying this update would write the column.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Keep)
    }
}

/// Sparse mutation shape shared by update, pause and resume operations.
///
/// Absent fields keep their stored values. Phase is never part of a patch;
/// it only changes through the dedicated pause/resume operations. An empty
/// patch is legal and still advances `version` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectPatch {
    pub project_name: Option<String>,
    pub gap: Option<String>,
    pub current_state: Option<i64>,
    pub handled_by: FieldUpdate<String>,
    pub passed_time: FieldUpdate<String>,
}

impl ProjectPatch {
    /// Returns whether the patch writes no field at all.
    pub fn is_empty(&self) -> bool {
        self.project_name.is_none()
            && self.gap.is_none()
            && self.current_state.is_none()
            && !self.handled_by.is_write()
            && !self.passed_time.is_write()
    }

    /// Checks patch shape before persistence.
    ///
    /// # Invariants
    /// - A patched `project_name` or `gap` must stay non-blank.
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if let Some(name) = self.project_name.as_deref() {
            if name.trim().is_empty() {
                return Err(ProjectValidationError::BlankField("project_name"));
            }
        }
        if let Some(gap) = self.gap.as_deref() {
            if gap.trim().is_empty() {
                return Err(ProjectValidationError::BlankField("gap"));
            }
        }
        Ok(())
    }
}

/// Validation error for project and pause-note input shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectValidationError {
    BlankField(&'static str),
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "project field `{field}` cannot be blank"),
        }
    }
}

impl Error for ProjectValidationError {}
