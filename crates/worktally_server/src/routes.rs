//! HTTP handlers for the public API.
//!
//! # Responsibility
//! - Decode multipart and JSON request bodies into core service inputs.
//! - Stage uploads before the database write and commit them only after it
//!   succeeds.
//! - Map service outcomes to the wire statuses and envelopes.
//!
//! # Invariants
//! - A failed request leaves no freshly written files in the upload
//!   directory.
//! - `PATCH /project/:id` pauses only when `pauseAt` and `note` arrive
//!   together.
//!
//! # See also
//! - docs/architecture/http-api.md

use crate::dto::{
    non_empty, LoginBody, ProjectDto, ProjectListResponse, ResumeProjectBody, UpdateProjectBody,
    UserDto,
};
use crate::error::ApiError;
use crate::media::UploadGuard;
use crate::state::{run_db, AppState};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::info;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use worktally_core::{
    AccountService, CreateProjectRequest, PauseProjectRequest, ProjectListQuery, ProjectService,
    ResumeProjectRequest, SignupRequest, SqliteProjectRepository, SqliteUserRepository,
    UpdateProjectRequest,
};

/// `POST /signup`. Multipart body with `firstName`, `lastName`, `email`,
/// `password` and up to two image files.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let started_at = Instant::now();
    let mut guard = state.uploads.begin();
    let form = read_form(&mut multipart, &mut guard).await?;

    let first_name = form.required("firstName")?;
    let last_name = form.required("lastName")?;
    let request = SignupRequest {
        name: format!("{first_name} {last_name}"),
        email: form.required("email")?,
        password: form.required("password")?,
        image1: form.file("image1"),
        image2: form.file("image2"),
    };

    let user = run_db(&state, move |conn| {
        let repo = SqliteUserRepository::try_new(conn)?;
        let service = AccountService::new(repo);
        Ok(service.sign_up(request)?)
    })
    .await?;

    guard.commit();
    info!(
        "event=signup module=server status=ok user_id={} duration_ms={}",
        user.id,
        started_at.elapsed().as_millis()
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Signup successful", "user": UserDto::from(user) })),
    )
        .into_response())
}

/// `POST /login`. JSON body with `email` and `password`.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginBody>,
) -> Result<Response, ApiError> {
    let started_at = Instant::now();
    let email = body
        .email
        .as_deref()
        .and_then(non_empty)
        .ok_or(ApiError::MissingCredentials)?;
    let password = body
        .password
        .as_deref()
        .and_then(non_empty)
        .ok_or(ApiError::MissingCredentials)?;

    let user = run_db(&state, move |conn| {
        let repo = SqliteUserRepository::try_new(conn)?;
        let service = AccountService::new(repo);
        Ok(service.authenticate(&email, &password)?)
    })
    .await?;

    info!(
        "event=login module=server status=ok user_id={} duration_ms={}",
        user.id,
        started_at.elapsed().as_millis()
    );
    Ok(Json(json!({ "message": "Login successful", "user": UserDto::from(user) })).into_response())
}

/// `POST /project`. Multipart body with `userId`, `projectName`, `gap`,
/// `totalNumbers`, `currentState` and up to two image files.
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let started_at = Instant::now();
    let mut guard = state.uploads.begin();
    let form = read_form(&mut multipart, &mut guard).await?;

    let request = CreateProjectRequest {
        user_id: form.numeric("userId")?,
        project_name: form.required("projectName")?,
        gap: form.required("gap")?,
        total_numbers: form.numeric("totalNumbers")?,
        current_state: form.numeric("currentState")?,
        image1: form.file("image1"),
        image2: form.file("image2"),
    };

    let project = run_db(&state, move |conn| {
        let repo = SqliteProjectRepository::try_new(conn)?;
        let mut service = ProjectService::new(repo);
        Ok(service.create_project(request)?)
    })
    .await?;

    guard.commit();
    info!(
        "event=project_create module=server status=ok project_id={} user_id={} duration_ms={}",
        project.id,
        project.user_id,
        started_at.elapsed().as_millis()
    );
    Ok(Json(
        json!({ "message": "Project creation successful", "project": ProjectDto::from(project) }),
    )
    .into_response())
}

/// `PATCH /project/:id`. Applies a sparse patch, or records a pause when the
/// body carries the `pauseAt`/`note` pair.
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateProjectBody>,
) -> Result<Response, ApiError> {
    let started_at = Instant::now();
    let expected_version = body.expected_version()?;
    let pause = body.pause_intent()?;
    let patch = body.to_patch();
    let event = if pause.is_some() {
        "project_pause"
    } else {
        "project_update"
    };

    let project = run_db(&state, move |conn| {
        let repo = SqliteProjectRepository::try_new(conn)?;
        let mut service = ProjectService::new(repo);
        let project = match pause {
            Some((paused_at, note)) => service.pause_project(PauseProjectRequest {
                id,
                expected_version,
                paused_at,
                note,
                patch,
            })?,
            None => service.update_project(UpdateProjectRequest {
                id,
                expected_version,
                patch,
            })?,
        };
        Ok(project)
    })
    .await?;

    info!(
        "event={event} module=server status=ok project_id={} version={} duration_ms={}",
        project.id,
        project.version,
        started_at.elapsed().as_millis()
    );
    Ok(Json(json!({ "project": ProjectDto::from(project) })).into_response())
}

/// `POST /project/:id/resume`. Returns the project to the running phase.
pub async fn resume_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<ResumeProjectBody>,
) -> Result<Response, ApiError> {
    let started_at = Instant::now();
    let expected_version = body.expected_version()?;
    let patch = body.to_patch();

    let project = run_db(&state, move |conn| {
        let repo = SqliteProjectRepository::try_new(conn)?;
        let mut service = ProjectService::new(repo);
        Ok(service.resume_project(ResumeProjectRequest {
            id,
            expected_version,
            patch,
        })?)
    })
    .await?;

    info!(
        "event=project_resume module=server status=ok project_id={} version={} duration_ms={}",
        project.id,
        project.version,
        started_at.elapsed().as_millis()
    );
    Ok(Json(json!({ "project": ProjectDto::from(project) })).into_response())
}

/// Query string for the listing endpoint. `page` arrives as raw text so a
/// non-numeric value can fall back to the first page.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<String>,
}

/// `GET /projects/:userId?search=&page=`. Paginated listing with embedded
/// pause history, newest project first.
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let started_at = Instant::now();
    let mut query = ProjectListQuery::new(user_id);
    query.search = params.search;
    query.page = Some(parse_page(params.page.as_deref()));

    let page = run_db(&state, move |conn| {
        Ok(worktally_core::list_projects(conn, &query)?)
    })
    .await?;

    info!(
        "event=project_list module=server status=ok user_id={} page={} total={} duration_ms={}",
        user_id,
        page.page,
        page.total_items,
        started_at.elapsed().as_millis()
    );
    Ok(Json(ProjectListResponse::from(page)).into_response())
}

/// Multipart payload split into trimmed text fields and stored upload URLs.
struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, String>,
}

impl UploadForm {
    fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).map(String::as_str).and_then(non_empty)
    }

    fn required(&self, name: &str) -> Result<String, ApiError> {
        self.text(name).ok_or(ApiError::MissingFields)
    }

    fn numeric(&self, name: &str) -> Result<i64, ApiError> {
        let raw = self.required(name)?;
        raw.parse()
            .map_err(|_| ApiError::InvalidField(format!("Invalid {name}")))
    }

    fn file(&self, name: &str) -> Option<String> {
        self.files.get(name).cloned()
    }
}

/// Drains a multipart stream. Image parts are written through the guard as
/// they arrive, so an error later in the request still rolls them back.
async fn read_form(
    multipart: &mut Multipart,
    guard: &mut UploadGuard<'_>,
) -> Result<UploadForm, ApiError> {
    let mut fields = HashMap::new();
    let mut files = HashMap::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                if name != "image1" && name != "image2" {
                    continue;
                }
                let bytes = field.bytes().await?;
                let url = guard.save(&file_name, &bytes)?;
                files.insert(name, url);
            }
            None => {
                let value = field.text().await?;
                fields.insert(name, value);
            }
        }
    }

    Ok(UploadForm { fields, files })
}

fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::{parse_page, UploadForm};
    use std::collections::HashMap;

    fn form(fields: &[(&str, &str)]) -> UploadForm {
        UploadForm {
            fields: fields
                .iter()
                .map(|&(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }

    #[test]
    fn page_parsing_falls_back_to_first_page() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some(" 2 ")), 2);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("-4")), 1);
    }

    #[test]
    fn blank_form_fields_count_as_missing() {
        let form = form(&[("email", "  "), ("password", "secret")]);
        assert!(form.required("email").is_err());
        assert_eq!(form.required("password").unwrap(), "secret");
    }

    #[test]
    fn numeric_fields_reject_non_numbers() {
        let form = form(&[("userId", "12"), ("totalNumbers", "many")]);
        assert_eq!(form.numeric("userId").unwrap(), 12);
        assert!(form.numeric("totalNumbers").is_err());
        assert!(form.numeric("currentState").is_err());
    }
}
