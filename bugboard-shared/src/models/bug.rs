/// Bug model and database operations
///
/// Bugs always belong to a task and disappear with it.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE bug_status AS ENUM ('in_progress', 'testing', 'fixed');
///
/// CREATE TABLE bugs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     seq BIGINT GENERATED ALWAYS AS IDENTITY,
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status bug_status NOT NULL DEFAULT 'in_progress',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::models::bug::{Bug, BugFilter, CreateBug};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// Bug::create(&pool, CreateBug {
///     task_id,
///     title: "Crash on save".to_string(),
///     description: None,
/// }).await?;
///
/// let filter = BugFilter::parse(Some("in_progress"), Some("crash"))?;
/// let bugs = Bug::list_by_task(&pool, task_id, &filter).await?;
/// # Ok(())
/// # }
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Bug workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bug_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BugStatus {
    InProgress,
    Testing,
    Fixed,
}

/// Returned when a status string is not one of the known values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid bug status '{0}', expected one of: in_progress, testing, fixed")]
pub struct InvalidBugStatus(pub String);

impl BugStatus {
    pub const ALL: [BugStatus; 3] = [BugStatus::InProgress, BugStatus::Testing, BugStatus::Fixed];

    /// Converts status to its wire/database spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            BugStatus::InProgress => "in_progress",
            BugStatus::Testing => "testing",
            BugStatus::Fixed => "fixed",
        }
    }
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BugStatus {
    type Err = InvalidBugStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BugStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidBugStatus(s.to_string()))
    }
}

/// Bug attached to a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bug {
    pub id: Uuid,

    /// Parent task
    pub task_id: Uuid,

    pub title: String,
    pub description: Option<String>,
    pub status: BugStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a bug
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBug {
    pub task_id: Uuid,
    pub title: String,
    pub description: Option<String>,
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBug {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<BugStatus>,
}

/// Filters for listing the bugs of a task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BugFilter {
    /// Only bugs with this status
    pub status: Option<BugStatus>,

    /// Case-insensitive substring of the title
    pub q: Option<String>,
}

impl BugFilter {
    /// Builds a filter from raw query parameters
    ///
    /// A blank `q` means no title filter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBugStatus` if `status` is not a known status
    pub fn parse(status: Option<&str>, q: Option<&str>) -> Result<Self, InvalidBugStatus> {
        let status = status.map(str::parse::<BugStatus>).transpose()?;
        let q = q
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        Ok(Self { status, q })
    }
}

const BUG_COLUMNS: &str = "id, task_id, title, description, status, created_at";

impl Bug {
    /// Creates a bug in `in_progress` state
    pub async fn create(pool: &PgPool, data: CreateBug) -> Result<Self, sqlx::Error> {
        let bug = sqlx::query_as::<_, Bug>(&format!(
            "INSERT INTO bugs (task_id, title, description) \
             VALUES ($1, $2, $3) RETURNING {BUG_COLUMNS}"
        ))
        .bind(data.task_id)
        .bind(data.title)
        .bind(data.description)
        .fetch_one(pool)
        .await?;

        Ok(bug)
    }

    /// Finds a bug by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let bug = sqlx::query_as::<_, Bug>(&format!("SELECT {BUG_COLUMNS} FROM bugs WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(bug)
    }

    /// Lists the bugs of a task, newest first
    pub async fn list_by_task(
        pool: &PgPool,
        task_id: Uuid,
        filter: &BugFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let bugs = sqlx::query_as::<_, Bug>(&format!(
            "SELECT {BUG_COLUMNS} FROM bugs \
             WHERE task_id = $1 \
               AND ($2::bug_status IS NULL OR status = $2) \
               AND ($3::text IS NULL OR strpos(lower(title), lower($3)) > 0) \
             ORDER BY created_at DESC, seq DESC"
        ))
        .bind(task_id)
        .bind(filter.status)
        .bind(filter.q.as_deref())
        .fetch_all(pool)
        .await?;

        Ok(bugs)
    }

    /// Applies a partial update
    ///
    /// Returns `None` if the bug does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateBug,
    ) -> Result<Option<Self>, sqlx::Error> {
        let bug = sqlx::query_as::<_, Bug>(&format!(
            "UPDATE bugs SET \
                 title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 status = COALESCE($4, status) \
             WHERE id = $1 RETURNING {BUG_COLUMNS}"
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .fetch_optional(pool)
        .await?;

        Ok(bug)
    }

    /// Deletes a bug, returning false if it did not exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bugs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
