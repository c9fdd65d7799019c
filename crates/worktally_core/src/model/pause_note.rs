//! Pause annotation domain model.
//!
//! # Responsibility
//! - Define the append-only pause history record.
//!
//! # Invariants
//! - Pause notes are never mutated or deleted after insertion.
//! - Ascending id order is chronological pause order.
//!
//! # See also
//! - docs/architecture/data-model.md

use serde::{Deserialize, Serialize};

use crate::model::project::{ProjectId, ProjectValidationError};

/// Stable identifier for one pause annotation.
pub type PauseNoteId = i64;

/// One pause event in a project's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseNote {
    pub id: PauseNoteId,
    pub project_id: ProjectId,
    /// Opaque caller-defined pause marker, stored verbatim.
    pub paused_at: String,
    /// Free-text reason for the pause.
    pub note: String,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}

/// Input shape for the annotation recorded by a pause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPauseNote {
    pub paused_at: String,
    pub note: String,
}

impl NewPauseNote {
    /// Checks field shape before persistence.
    ///
    /// # Invariants
    /// - `paused_at` and `note` must be non-blank; a pause without both is
    ///   not a pause.
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.paused_at.trim().is_empty() {
            return Err(ProjectValidationError::BlankField("paused_at"));
        }
        if self.note.trim().is_empty() {
            return Err(ProjectValidationError::BlankField("note"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::NewPauseNote;
    use crate::model::project::ProjectValidationError;

    #[test]
    fn validate_requires_marker_and_note() {
        let complete = NewPauseNote {
            paused_at: "2025-08-01".to_string(),
            note: "crew rotation".to_string(),
        };
        assert!(complete.validate().is_ok());

        let missing_marker = NewPauseNote {
            paused_at: "  ".to_string(),
            note: "crew rotation".to_string(),
        };
        assert_eq!(
            missing_marker.validate(),
            Err(ProjectValidationError::BlankField("paused_at"))
        );

        let missing_note = NewPauseNote {
            paused_at: "2025-08-01".to_string(),
            note: String::new(),
        };
        assert_eq!(
            missing_note.validate(),
            Err(ProjectValidationError::BlankField("note"))
        );
    }
}
