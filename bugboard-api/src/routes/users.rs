/// User directory endpoints
///
/// - `GET {prefix}/me` - Own profile with task counts and lists
/// - `GET {prefix}/users` - Everyone else, admins excluded

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Extension, Json};
use bugboard_shared::{
    auth::middleware::AuthContext,
    models::{
        task::Task,
        user::{User, UserRole, UserSummary},
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile of the authenticated user
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub job_role: Option<String>,
    pub created_at: DateTime<Utc>,

    /// Number of tasks the user owns
    pub tasks_created: usize,

    /// Number of other users' tasks the user participates in
    pub tasks_participating: usize,

    pub owned_tasks: Vec<Task>,
    pub participating_tasks: Vec<Task>,
}

impl ProfileResponse {
    fn new(user: User, owned_tasks: Vec<Task>, participating_tasks: Vec<Task>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            job_role: user.job_role,
            created_at: user.created_at,
            tasks_created: owned_tasks.len(),
            tasks_participating: participating_tasks.len(),
            owned_tasks,
            participating_tasks,
        }
    }
}

/// User directory response
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

/// Own profile
///
/// Tasks the user both owns and participates in are only counted as owned.
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let owned = Task::list_owned_by(&state.db, user.id).await?;
    let participating = Task::list_participating(&state.db, user.id).await?;

    Ok(Json(ProfileResponse::new(user, owned, participating)))
}

/// Lists all users except admins and the caller, newest first
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UsersResponse>> {
    let users = User::list_directory(&state.db, auth.user_id).await?;

    Ok(Json(UsersResponse { users }))
}
