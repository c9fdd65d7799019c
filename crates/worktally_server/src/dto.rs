//! Wire DTOs for the HTTP surface.
//!
//! # Responsibility
//! - Define camelCase request/response shapes and their conversions from
//!   core records.
//! - Interpret patch bodies: absent keeps a field, `null` clears the two
//!   nullable ones, a value overwrites.
//!
//! # Invariants
//! - User payloads never carry the credential hash.

use crate::error::ApiError;
use serde::{Deserialize, Deserializer, Serialize};
use worktally_core::{
    FieldUpdate, PauseNote, Project, ProjectPage, ProjectPatch, ProjectPhase,
    ProjectWithPauseNotes, User,
};

/// Client-safe user projection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image1: Option<String>,
    pub image2: Option<String>,
    pub created_at: i64,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            image1: user.image1,
            image2: user.image2,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: i64,
    pub user_id: i64,
    pub project_name: String,
    pub gap: String,
    pub total_numbers: i64,
    pub current_state: i64,
    pub handled_by: Option<String>,
    pub passed_time: Option<String>,
    pub phase: ProjectPhase,
    pub version: i64,
    pub image1: Option<String>,
    pub image2: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<Project> for ProjectDto {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            user_id: project.user_id,
            project_name: project.project_name,
            gap: project.gap,
            total_numbers: project.total_numbers,
            current_state: project.current_state,
            handled_by: project.handled_by,
            passed_time: project.passed_time,
            phase: project.phase,
            version: project.version,
            image1: project.image1,
            image2: project.image2,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseNoteDto {
    pub id: i64,
    pub project_id: i64,
    pub paused_at: String,
    pub note: String,
    pub created_at: i64,
}

impl From<PauseNote> for PauseNoteDto {
    fn from(note: PauseNote) -> Self {
        Self {
            id: note.id,
            project_id: note.project_id,
            paused_at: note.paused_at,
            note: note.note,
            created_at: note.created_at,
        }
    }
}

/// List item: project fields plus its embedded pause history.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedProjectDto {
    #[serde(flatten)]
    pub project: ProjectDto,
    pub pause_notes: Vec<PauseNoteDto>,
}

impl From<ProjectWithPauseNotes> for ListedProjectDto {
    fn from(item: ProjectWithPauseNotes) -> Self {
        Self {
            project: item.project.into(),
            pause_notes: item.pause_notes.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// Response envelope for `GET /projects/:userId`.
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ListedProjectDto>,
    pub pagination: PaginationDto,
}

impl From<ProjectPage> for ProjectListResponse {
    fn from(page: ProjectPage) -> Self {
        Self {
            projects: page.items.into_iter().map(Into::into).collect(),
            pagination: PaginationDto {
                total: page.total_items,
                page: page.page,
                page_size: page.page_size,
                total_pages: page.total_pages,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// `PATCH /project/:id` body.
///
/// `handledBy` and `passedTime` distinguish absent from `null`; the outer
/// `Option` is presence, the inner one the JSON value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectBody {
    pub expected_version: Option<i64>,
    pub project_name: Option<String>,
    pub gap: Option<String>,
    pub current_state: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub handled_by: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub passed_time: Option<Option<String>>,
    pub pause_at: Option<String>,
    pub note: Option<String>,
}

impl UpdateProjectBody {
    pub fn expected_version(&self) -> Result<i64, ApiError> {
        require_expected_version(self.expected_version)
    }

    pub fn to_patch(&self) -> ProjectPatch {
        ProjectPatch {
            project_name: self.project_name.clone(),
            gap: self.gap.clone(),
            current_state: self.current_state,
            handled_by: tri_state(&self.handled_by),
            passed_time: tri_state(&self.passed_time),
        }
    }

    /// Reads the pause pair: both present starts a pause, both absent is a
    /// plain field update, half a pair is a client error.
    pub fn pause_intent(&self) -> Result<Option<(String, String)>, ApiError> {
        let pause_at = self.pause_at.as_deref().and_then(non_empty);
        let note = self.note.as_deref().and_then(non_empty);
        match (pause_at, note) {
            (Some(pause_at), Some(note)) => Ok(Some((pause_at, note))),
            (None, None) => Ok(None),
            _ => Err(ApiError::InvalidField(
                "Both pauseAt and note are required to pause".to_string(),
            )),
        }
    }
}

/// `POST /project/:id/resume` body: version token plus an optional patch.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeProjectBody {
    pub expected_version: Option<i64>,
    pub project_name: Option<String>,
    pub gap: Option<String>,
    pub current_state: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub handled_by: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub passed_time: Option<Option<String>>,
}

impl ResumeProjectBody {
    pub fn expected_version(&self) -> Result<i64, ApiError> {
        require_expected_version(self.expected_version)
    }

    pub fn to_patch(&self) -> ProjectPatch {
        ProjectPatch {
            project_name: self.project_name.clone(),
            gap: self.gap.clone(),
            current_state: self.current_state,
            handled_by: tri_state(&self.handled_by),
            passed_time: tri_state(&self.passed_time),
        }
    }
}

/// Treats blank text the way the wire treats absent fields.
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

fn require_expected_version(value: Option<i64>) -> Result<i64, ApiError> {
    value.ok_or_else(|| {
        ApiError::InvalidField("Missing or invalid expectedVersion".to_string())
    })
}

fn tri_state(field: &Option<Option<String>>) -> FieldUpdate<String> {
    match field {
        None => FieldUpdate::Keep,
        Some(None) => FieldUpdate::Clear,
        Some(Some(value)) => FieldUpdate::Set(value.clone()),
    }
}

/// Keeps `null` distinguishable from an absent key.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{UpdateProjectBody, UserDto};
    use worktally_core::{FieldUpdate, User};

    #[test]
    fn patch_body_distinguishes_absent_null_and_value() {
        let body: UpdateProjectBody =
            serde_json::from_str(r#"{"expectedVersion": 2, "handledBy": null}"#).unwrap();
        let patch = body.to_patch();
        assert_eq!(patch.handled_by, FieldUpdate::Clear);
        assert_eq!(patch.passed_time, FieldUpdate::Keep);

        let body: UpdateProjectBody =
            serde_json::from_str(r#"{"expectedVersion": 2, "handledBy": "Riley"}"#).unwrap();
        assert_eq!(
            body.to_patch().handled_by,
            FieldUpdate::Set("Riley".to_string())
        );
    }

    #[test]
    fn patch_body_maps_camel_case_field_names() {
        let body: UpdateProjectBody = serde_json::from_str(
            r#"{"expectedVersion": 1, "projectName": "X", "currentState": 4, "passedTime": "2h"}"#,
        )
        .unwrap();
        assert_eq!(body.expected_version().unwrap(), 1);
        let patch = body.to_patch();
        assert_eq!(patch.project_name.as_deref(), Some("X"));
        assert_eq!(patch.current_state, Some(4));
        assert_eq!(patch.passed_time, FieldUpdate::Set("2h".to_string()));
    }

    #[test]
    fn missing_expected_version_is_a_client_error() {
        let body: UpdateProjectBody = serde_json::from_str(r#"{"currentState": 4}"#).unwrap();
        assert!(body.expected_version().is_err());
    }

    #[test]
    fn pause_intent_requires_the_full_pair() {
        let both: UpdateProjectBody =
            serde_json::from_str(r#"{"expectedVersion": 1, "pauseAt": "40", "note": "stop"}"#)
                .unwrap();
        assert_eq!(
            both.pause_intent().unwrap(),
            Some(("40".to_string(), "stop".to_string()))
        );

        let neither: UpdateProjectBody =
            serde_json::from_str(r#"{"expectedVersion": 1}"#).unwrap();
        assert_eq!(neither.pause_intent().unwrap(), None);

        let half: UpdateProjectBody =
            serde_json::from_str(r#"{"expectedVersion": 1, "pauseAt": "40"}"#).unwrap();
        assert!(half.pause_intent().is_err());

        let blank: UpdateProjectBody =
            serde_json::from_str(r#"{"expectedVersion": 1, "pauseAt": "", "note": ""}"#).unwrap();
        assert_eq!(blank.pause_intent().unwrap(), None);
    }

    #[test]
    fn user_payload_omits_credential_hash() {
        let dto = UserDto::from(User {
            id: 7,
            name: "Dana Reed".to_string(),
            email: "dana@example.com".to_string(),
            credential_hash: "$argon2id$secret".to_string(),
            image1: None,
            image2: None,
            created_at: 1000,
        });

        let rendered = serde_json::to_string(&dto).unwrap();
        assert!(!rendered.contains("argon2"));
        assert!(!rendered.contains("credential"));
        assert!(rendered.contains("\"createdAt\":1000"));
    }
}
