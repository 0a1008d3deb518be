/// Bug endpoints
///
/// - `POST   {prefix}/bug` - Create a bug on a task the caller owns
/// - `GET    {prefix}/bug/:id` - Read a bug (owner or participant of its task)
/// - `PUT    {prefix}/bug/:id` - Update title, description, status (task owner)
/// - `DELETE {prefix}/bug/:id` - Delete (task owner)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    routes::{tasks::validate_title, DataResponse, MessageResponse},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use bugboard_shared::{
    auth::{
        access::{require_bug_owner, require_bug_read, require_task_owner},
        middleware::AuthContext,
    },
    models::bug::{Bug, BugStatus, CreateBug, UpdateBug},
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Create bug request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBugRequest {
    #[serde(default)]
    pub title: String,

    pub description: Option<String>,

    #[serde(default)]
    pub task_id: Option<String>,
}

/// Update bug request; absent fields stay unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateBugRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

/// Parses the `taskId` of a create request
///
/// A missing id is a validation error; an id that is not a UUID cannot name
/// an existing task and is reported as not found.
fn parse_task_id(raw: Option<&str>) -> ApiResult<Uuid> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation("taskId", "Task id is required"))?;

    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Task not found".to_string()))
}

/// Creates a bug in `in_progress` state
///
/// # Errors
///
/// - `400 Bad Request`: Missing `title` or `taskId`
/// - `404 Not Found`: Task missing or not owned by the caller
pub async fn create_bug(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateBugRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<Bug>>)> {
    let title = validate_title(&req.title)?;
    let task_id = parse_task_id(req.task_id.as_deref())?;

    require_task_owner(&state.db, auth.user_id, task_id).await?;

    let bug = Bug::create(
        &state.db,
        CreateBug {
            task_id,
            title,
            description: req.description,
        },
    )
    .await?;

    info!(bug_id = %bug.id, %task_id, "Bug created");

    Ok((StatusCode::CREATED, Json(DataResponse::new("Bug created", bug))))
}

/// Reads one bug
pub async fn get_bug(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(bug_id): ApiPath<Uuid>,
) -> ApiResult<Json<DataResponse<Bug>>> {
    let (bug, _) = require_bug_read(&state.db, auth.user_id, bug_id).await?;

    Ok(Json(DataResponse::new("Bug found", bug)))
}

/// Partially updates a bug
///
/// An unknown `status` is rejected before anything is looked up.
pub async fn update_bug(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(bug_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateBugRequest>,
) -> ApiResult<Json<DataResponse<Bug>>> {
    let status = req
        .status
        .as_deref()
        .map(str::parse::<BugStatus>)
        .transpose()?;
    let title = req.title.as_deref().map(validate_title).transpose()?;

    require_bug_owner(&state.db, auth.user_id, bug_id).await?;

    let bug = Bug::update(
        &state.db,
        bug_id,
        UpdateBug {
            title,
            description: req.description,
            status,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Bug not found".to_string()))?;

    Ok(Json(DataResponse::new("Bug updated", bug)))
}

/// Deletes a bug
pub async fn delete_bug(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(bug_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    require_bug_owner(&state.db, auth.user_id, bug_id).await?;

    if !Bug::delete(&state.db, bug_id).await? {
        return Err(ApiError::NotFound("Bug not found".to_string()));
    }

    info!(%bug_id, user_id = %auth.user_id, "Bug deleted");

    Ok(Json(MessageResponse::new("Bug deleted")))
}
