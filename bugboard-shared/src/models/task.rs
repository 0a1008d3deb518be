/// Task model and database operations
///
/// A task is owned by the user who created it. Other users can be attached
/// as participants (read access only), and any user who can see a task may
/// hide it from their own listings.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     seq BIGINT GENERATED ALWAYS AS IDENTITY,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     done BOOLEAN NOT NULL DEFAULT FALSE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::models::task::{CreateTask, Task, TaskDetail};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner_id: Uuid, bob: Uuid) -> Result<(), sqlx::Error> {
/// let task = Task::create_with_participants(&pool, CreateTask {
///     owner_id,
///     title: "Release 1.2".to_string(),
///     description: None,
/// }, &[bob]).await?;
///
/// let detail = TaskDetail::load(&pool, task).await?;
/// assert_eq!(detail.participants.len(), 1);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::bug::{Bug, BugFilter};
use super::task_participant::TaskParticipant;
use super::user::{User, UserSummary};

/// Task row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    pub title: String,
    pub description: Option<String>,

    /// Completion flag
    pub done: bool,

    /// Owner (the creator)
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,
}

/// `{ id, title }` summary used when listing a task's bugs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: Uuid,
    pub title: String,
}

impl From<&Task> for TaskRef {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
        }
    }
}

/// Task with owner, participants and bugs embedded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,

    /// Owner profile; absent only if the owner row vanished mid-request
    pub owner: Option<UserSummary>,

    pub participants: Vec<UserSummary>,
    pub bugs: Vec<Bug>,
}

impl TaskDetail {
    /// Loads the embedded owner, participants and bugs for a task
    pub async fn load(pool: &PgPool, task: Task) -> Result<Self, sqlx::Error> {
        let owner = User::find_by_id(pool, task.user_id)
            .await?
            .map(UserSummary::from);
        let participants = TaskParticipant::list_users(pool, task.id).await?;
        let bugs = Bug::list_by_task(pool, task.id, &BugFilter::default()).await?;

        Ok(Self {
            task,
            owner,
            participants,
            bugs,
        })
    }
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// Partial update; only `Some` fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub done: Option<bool>,
}

impl UpdateTask {
    /// True when there is nothing to write
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.done.is_none()
    }
}

pub(crate) const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.done, t.user_id, t.created_at";

impl Task {
    /// Creates a task and attaches its participants in one transaction
    ///
    /// Either the task row and every participant row become visible
    /// together, or nothing is written. `participant_ids` must already be
    /// normalized and resolved to existing users.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; the transaction is rolled back
    /// when it is dropped uncommitted.
    pub async fn create_with_participants(
        pool: &PgPool,
        data: CreateTask,
        participant_ids: &[Uuid],
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks AS t (title, description, user_id) \
             VALUES ($1, $2, $3) RETURNING {TASK_COLUMNS}"
        ))
        .bind(data.title)
        .bind(data.description)
        .bind(data.owner_id)
        .fetch_one(&mut *tx)
        .await?;

        TaskParticipant::attach_all(&mut *tx, task.id, participant_ids).await?;

        tx.commit().await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(task)
    }

    /// Every task owned by `user_id`, newest first
    pub async fn list_owned_by(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t \
             WHERE t.user_id = $1 \
             ORDER BY t.created_at DESC, t.seq DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Tasks `user_id` participates in but does not own, newest first
    pub async fn list_participating(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t \
             JOIN task_participants tp ON tp.task_id = t.id \
             WHERE tp.user_id = $1 AND t.user_id <> $1 \
             ORDER BY t.created_at DESC, t.seq DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Applies a partial update
    ///
    /// Returns `None` if the task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        // Build the SET list from the fields that are present
        let mut assignments = Vec::new();
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            assignments.push(format!("title = ${}", bind_count));
        }
        if data.done.is_some() {
            bind_count += 1;
            assignments.push(format!("done = ${}", bind_count));
        }

        let query = format!(
            "UPDATE tasks AS t SET {} WHERE t.id = $1 RETURNING {TASK_COLUMNS}",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(done) = data.done {
            q = q.bind(done);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Bugs, participant rows and hidden-task rows go with it via
    /// `ON DELETE CASCADE`. Returns false if the task did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
