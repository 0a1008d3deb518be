/// Per-user hidden-task overlay
///
/// Hiding a task removes it from that user's active/completed listings only;
/// other users' view of the same task is unaffected.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE hidden_tasks (
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, task_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A task hidden by one user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HiddenTask {
    pub user_id: Uuid,
    pub task_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl HiddenTask {
    /// Hides a task for a user
    ///
    /// Returns `None` if the task was already hidden for that user.
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let hidden = sqlx::query_as::<_, HiddenTask>(
            r#"
            INSERT INTO hidden_tasks (user_id, task_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, task_id) DO NOTHING
            RETURNING user_id, task_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

        Ok(hidden)
    }

    /// Unhides a task for a user
    ///
    /// Returns false if there was nothing to unhide.
    pub async fn delete(pool: &PgPool, user_id: Uuid, task_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM hidden_tasks WHERE user_id = $1 AND task_id = $2")
            .bind(user_id)
            .bind(task_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ids of every task the user has hidden
    pub async fn task_ids_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT task_id FROM hidden_tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(ids)
    }
}
