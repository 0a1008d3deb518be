/// Task participants: users granted read access to someone else's task
///
/// # Schema
///
/// ```sql
/// CREATE TABLE task_participants (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (task_id, user_id)
/// );
/// ```
///
/// Rows are written when a task is created and removed by the cascade when
/// the task is deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::user::{UserSummary, SUMMARY_COLUMNS};

/// Task/user membership row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TaskParticipant {
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Cleans up a client-supplied participant list
///
/// Blank entries, entries that are not UUIDs and the owner's own id are
/// dropped, and duplicates collapse to their first occurrence. Whether the
/// remaining ids belong to real users is checked separately against the
/// database.
///
/// # Example
///
/// ```
/// use bugboard_shared::models::task_participant::normalize_participant_ids;
/// use uuid::Uuid;
///
/// let owner = Uuid::new_v4();
/// let bob = Uuid::new_v4();
///
/// let ids = normalize_participant_ids(owner, &[
///     owner.to_string(),
///     "unknown-id".to_string(),
///     bob.to_string(),
///     bob.to_string(),
///     "  ".to_string(),
/// ]);
///
/// assert_eq!(ids, vec![bob]);
/// ```
pub fn normalize_participant_ids(owner_id: Uuid, raw: &[String]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = Vec::with_capacity(raw.len());

    for candidate in raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let Ok(id) = Uuid::parse_str(candidate) else {
            continue;
        };

        if id != owner_id && !ids.contains(&id) {
            ids.push(id);
        }
    }

    ids
}

impl TaskParticipant {
    /// Attaches users to a task on an existing connection or transaction
    ///
    /// Pairs that already exist are skipped. Returns the number of rows
    /// inserted.
    pub async fn attach_all(
        conn: &mut PgConnection,
        task_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<u64, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO task_participants (task_id, user_id)
            SELECT $1, participant FROM UNNEST($2::uuid[]) AS participant
            ON CONFLICT (task_id, user_id) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(user_ids)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Checks whether `user_id` participates in `task_id`
    pub async fn is_participant(
        pool: &PgPool,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM task_participants WHERE task_id = $1 AND user_id = $2)",
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Public profiles of everyone participating in a task
    pub async fn list_users(pool: &PgPool, task_id: Uuid) -> Result<Vec<UserSummary>, sqlx::Error> {
        let users = sqlx::query_as::<_, UserSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM task_participants tp \
             JOIN users u ON u.id = tp.user_id \
             WHERE tp.task_id = $1 \
             ORDER BY tp.created_at, u.name"
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}
