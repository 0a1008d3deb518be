/// Task endpoints
///
/// # Endpoints
///
/// - `GET    {prefix}/task?status=active|completed|hidden` - List visible tasks
/// - `POST   {prefix}/task` - Create a task with participants
/// - `GET    {prefix}/task/:id` - Task with owner, participants and bugs
/// - `PUT    {prefix}/task/:id` - Update title / done (owner only)
/// - `DELETE {prefix}/task/:id` - Delete task and everything under it (owner only)
/// - `POST   {prefix}/task/:id/hide` - Hide for the caller
/// - `DELETE {prefix}/task/:id/hide` - Unhide for the caller
/// - `GET    {prefix}/task/:id/bugs?status=&q=` - Bugs of a task
///
/// Tasks the caller cannot read are reported as `404`, exactly like tasks
/// that do not exist.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::{DataResponse, MessageResponse},
};
use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use bugboard_shared::{
    auth::{
        access::{can_access_task, require_task_owner, require_task_read},
        middleware::AuthContext,
    },
    models::{
        bug::{Bug, BugFilter},
        hidden_task::HiddenTask,
        task::{CreateTask, Task, TaskDetail, TaskRef, UpdateTask},
        task_participant::normalize_participant_ids,
        user::User,
    },
    visibility::{self, TaskListing, TaskStatusFilter},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Longest accepted task title
pub const MAX_TITLE_LEN: usize = 255;

/// Task list query
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
}

/// Create task request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,

    pub description: Option<String>,

    /// User ids to attach; unknown, duplicate and own ids are dropped
    #[serde(default)]
    pub participant_ids: Vec<String>,
}

/// Update task request; absent fields stay unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub done: Option<bool>,
}

/// Bug list query
#[derive(Debug, Default, Deserialize)]
pub struct ListBugsQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

/// Single task response
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: TaskDetail,
}

/// Bugs of a task
#[derive(Debug, Serialize)]
pub struct TaskBugsResponse {
    pub task: TaskRef,
    pub bugs: Vec<Bug>,
}

/// Trims a title and checks it is present and not too long
pub(crate) fn validate_title(raw: &str) -> ApiResult<String> {
    let title = raw.trim();

    if title.is_empty() {
        return Err(ApiError::validation("title", "Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::validation(
            "title",
            format!("Title must be at most {} characters", MAX_TITLE_LEN),
        ));
    }

    Ok(title.to_string())
}

/// Lists the caller's visible tasks
///
/// # Response
///
/// ```json
/// { "ownedTasks": [...], "participatingTasks": [...], "hiddenTasks": [] }
/// ```
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ListTasksQuery>,
) -> ApiResult<Json<TaskListing>> {
    let filter = TaskStatusFilter::parse_optional(query.status.as_deref())?;

    let listing = visibility::list_tasks(&state.db, auth.user_id, filter).await?;

    Ok(Json(listing))
}

/// Gets one task with owner, participants and bugs
///
/// The participant list is loaded for the response anyway, so access is
/// decided on it directly.
pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = Task::find_by_id(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let detail = TaskDetail::load(&state.db, task).await?;

    let participant_ids: Vec<Uuid> = detail.participants.iter().map(|p| p.id).collect();
    if !can_access_task(auth.user_id, detail.task.user_id, &participant_ids) {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    Ok(Json(TaskResponse { task: detail }))
}

/// Creates a task owned by the caller
///
/// The task row and its participant rows are written in one transaction.
///
/// # Endpoint
///
/// ```text
/// POST {prefix}/task
///
/// { "title": "T1", "description": "...", "participantIds": ["uuid", ...] }
/// ```
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<DataResponse<TaskDetail>>)> {
    let title = validate_title(&req.title)?;

    let candidates = normalize_participant_ids(auth.user_id, &req.participant_ids);
    let participant_ids = User::existing_ids(&state.db, &candidates).await?;

    let task = Task::create_with_participants(
        &state.db,
        CreateTask {
            owner_id: auth.user_id,
            title,
            description: req.description,
        },
        &participant_ids,
    )
    .await?;

    info!(
        task_id = %task.id,
        owner_id = %auth.user_id,
        participants = participant_ids.len(),
        dropped = req.participant_ids.len() - participant_ids.len(),
        "Task created"
    );

    let detail = TaskDetail::load(&state.db, task).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new("Task created", detail)),
    ))
}

/// Updates title and/or completion (owner only)
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<DataResponse<Task>>> {
    let title = req.title.as_deref().map(validate_title).transpose()?;

    require_task_owner(&state.db, auth.user_id, task_id).await?;

    let task = Task::update(
        &state.db,
        task_id,
        UpdateTask {
            title,
            done: req.done,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(DataResponse::new("Task updated", task)))
}

/// Deletes a task with its bugs, participants and hidden markers (owner only)
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    require_task_owner(&state.db, auth.user_id, task_id).await?;

    if !Task::delete(&state.db, task_id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    info!(%task_id, owner_id = %auth.user_id, "Task deleted");

    Ok(Json(MessageResponse::new("Task deleted")))
}

/// Hides a visible task from the caller's active and completed lists
///
/// # Errors
///
/// - `404 Not Found`: Task missing or not visible to the caller
/// - `409 Conflict`: Already hidden
pub async fn hide_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    require_task_read(&state.db, auth.user_id, task_id).await?;

    if HiddenTask::create(&state.db, auth.user_id, task_id)
        .await?
        .is_none()
    {
        return Err(ApiError::Conflict("Task already hidden".to_string()));
    }

    info!(%task_id, user_id = %auth.user_id, "Task hidden");

    Ok(Json(MessageResponse::new("Task hidden")))
}

/// Reverses [`hide_task`]
pub async fn unhide_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !HiddenTask::delete(&state.db, auth.user_id, task_id).await? {
        return Err(ApiError::NotFound("Hidden task not found".to_string()));
    }

    info!(%task_id, user_id = %auth.user_id, "Task unhidden");

    Ok(Json(MessageResponse::new("Task unhidden")))
}

/// Lists the bugs of a readable task, optionally filtered
///
/// `status` must be one of `in_progress`, `testing`, `fixed`; `q` matches
/// titles case-insensitively.
pub async fn list_task_bugs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(task_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ListBugsQuery>,
) -> ApiResult<Json<TaskBugsResponse>> {
    let filter = BugFilter::parse(query.status.as_deref(), query.q.as_deref())?;

    let (task, _) = require_task_read(&state.db, auth.user_id, task_id).await?;
    let bugs = Bug::list_by_task(&state.db, task.id, &filter).await?;

    Ok(Json(TaskBugsResponse {
        task: TaskRef::from(&task),
        bugs,
    }))
}
