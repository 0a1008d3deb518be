//! Task visibility: what shows up in a user's task list
//!
//! A user sees every task they own or participate in. On top of that sits a
//! per-user overlay of hidden tasks:
//!
//! - `active`: visible, not done, not hidden
//! - `completed`: visible, done, not hidden
//! - `hidden`: visible and hidden, regardless of `done`
//!
//! Active and completed results are split into the tasks the user owns and
//! the ones they only participate in. The hidden view goes entirely into
//! `hidden_tasks`. Everything is ordered newest first.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::hidden_task::HiddenTask;
use crate::models::task::{Task, TASK_COLUMNS};

/// Which slice of the visible tasks to list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatusFilter {
    #[default]
    Active,
    Completed,
    Hidden,
}

/// Returned for an unknown `status` query value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status '{0}', expected one of: active, completed, hidden")]
pub struct InvalidStatusFilter(pub String);

impl TaskStatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatusFilter::Active => "active",
            TaskStatusFilter::Completed => "completed",
            TaskStatusFilter::Hidden => "hidden",
        }
    }

    /// Parses an optional query value; absent or blank means `Active`
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, InvalidStatusFilter> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(value) => value.parse(),
        }
    }

    /// SQL condition on top of the owner-or-participant predicate.
    /// `$2` is bound to the user's hidden task ids.
    fn sql_condition(&self) -> &'static str {
        match self {
            TaskStatusFilter::Active => "t.done = FALSE AND NOT (t.id = ANY($2))",
            TaskStatusFilter::Completed => "t.done = TRUE AND NOT (t.id = ANY($2))",
            TaskStatusFilter::Hidden => "t.id = ANY($2)",
        }
    }
}

impl fmt::Display for TaskStatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatusFilter {
    type Err = InvalidStatusFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(TaskStatusFilter::Active),
            "completed" => Ok(TaskStatusFilter::Completed),
            "hidden" => Ok(TaskStatusFilter::Hidden),
            other => Err(InvalidStatusFilter(other.to_string())),
        }
    }
}

/// Task list response body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListing {
    pub owned_tasks: Vec<Task>,
    pub participating_tasks: Vec<Task>,
    pub hidden_tasks: Vec<Task>,
}

/// Splits already-filtered tasks into the listing buckets
///
/// Input order is preserved within each bucket.
pub fn partition(actor_id: Uuid, tasks: Vec<Task>, filter: TaskStatusFilter) -> TaskListing {
    if filter == TaskStatusFilter::Hidden {
        return TaskListing {
            hidden_tasks: tasks,
            ..Default::default()
        };
    }

    let (owned_tasks, participating_tasks) =
        tasks.into_iter().partition(|task| task.user_id == actor_id);

    TaskListing {
        owned_tasks,
        participating_tasks,
        hidden_tasks: Vec::new(),
    }
}

/// Lists the tasks `actor_id` can see, filtered by `filter`
///
/// # Errors
///
/// Returns an error if a database query fails
pub async fn list_tasks(
    pool: &PgPool,
    actor_id: Uuid,
    filter: TaskStatusFilter,
) -> Result<TaskListing, sqlx::Error> {
    let hidden_ids = HiddenTask::task_ids_for_user(pool, actor_id).await?;

    let query = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t \
         WHERE (t.user_id = $1 OR EXISTS ( \
                   SELECT 1 FROM task_participants tp \
                   WHERE tp.task_id = t.id AND tp.user_id = $1)) \
           AND {} \
         ORDER BY t.created_at DESC, t.seq DESC",
        filter.sql_condition()
    );

    let tasks = sqlx::query_as::<_, Task>(&query)
        .bind(actor_id)
        .bind(&hidden_ids)
        .fetch_all(pool)
        .await?;

    debug!(
        %actor_id,
        filter = %filter,
        hidden = hidden_ids.len(),
        matched = tasks.len(),
        "Listed tasks"
    );

    Ok(partition(actor_id, tasks, filter))
}
