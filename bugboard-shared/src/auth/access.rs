/// Access control for tasks and bugs
///
/// # Permission Model
///
/// Every task has exactly one owner (its creator) and any number of
/// participants. Bugs inherit the permissions of their parent task.
///
/// | Action                                   | Owner | Participant |
/// |------------------------------------------|-------|-------------|
/// | Read task, list its bugs, read a bug     | yes   | yes         |
/// | Hide / unhide a task for oneself         | yes   | yes         |
/// | Update / delete task                     | yes   | no          |
/// | Create / update / delete bug             | yes   | no          |
///
/// A denied check is indistinguishable from a missing entity: both surface
/// as [`AccessError::NotFound`], so callers cannot probe for ids they have
/// no access to.
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::auth::access::{require_task_owner, require_task_read};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, actor: Uuid, task_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let (task, access) = require_task_read(&pool, actor, task_id).await?;
/// println!("{} is {:?} of {}", actor, access, task.title);
///
/// // Stricter: only the owner passes
/// let task = require_task_owner(&pool, actor, task_id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::bug::Bug;
use crate::models::task::Task;
use crate::models::task_participant::TaskParticipant;

/// Error type for access checks
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The entity does not exist or the actor may not see it
    #[error("Not found")]
    NotFound,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// How an actor relates to a task they can see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAccess {
    Owner,
    Participant,
}

impl TaskAccess {
    /// Resolves the actor's relation to a task, or `None` for no access
    pub fn resolve(actor_id: Uuid, owner_id: Uuid, is_participant: bool) -> Option<Self> {
        if actor_id == owner_id {
            Some(TaskAccess::Owner)
        } else if is_participant {
            Some(TaskAccess::Participant)
        } else {
            None
        }
    }

    /// Whether this relation allows modifying the task and its bugs
    pub fn can_write(&self) -> bool {
        matches!(self, TaskAccess::Owner)
    }
}

/// True iff `actor_id` owns the task or is among its participants
pub fn can_access_task(actor_id: Uuid, owner_id: Uuid, participant_ids: &[Uuid]) -> bool {
    TaskAccess::resolve(actor_id, owner_id, participant_ids.contains(&actor_id)).is_some()
}

/// Loads a task the actor may read
///
/// # Errors
///
/// Returns `AccessError::NotFound` if the task is missing or the actor is
/// neither owner nor participant
pub async fn require_task_read(
    pool: &PgPool,
    actor_id: Uuid,
    task_id: Uuid,
) -> Result<(Task, TaskAccess), AccessError> {
    let task = Task::find_by_id(pool, task_id)
        .await?
        .ok_or(AccessError::NotFound)?;

    let access = task_access(pool, actor_id, &task).await?;

    match access {
        Some(access) => Ok((task, access)),
        None => {
            debug!(%actor_id, %task_id, "Task read denied");
            Err(AccessError::NotFound)
        }
    }
}

/// Loads a task only if the actor owns it
///
/// # Errors
///
/// Returns `AccessError::NotFound` if the task is missing or owned by
/// someone else
pub async fn require_task_owner(
    pool: &PgPool,
    actor_id: Uuid,
    task_id: Uuid,
) -> Result<Task, AccessError> {
    let task = Task::find_by_id(pool, task_id)
        .await?
        .ok_or(AccessError::NotFound)?;

    let writable = TaskAccess::resolve(actor_id, task.user_id, false)
        .is_some_and(|access| access.can_write());
    if !writable {
        debug!(%actor_id, %task_id, "Task write denied");
        return Err(AccessError::NotFound);
    }

    Ok(task)
}

/// Loads a bug and its parent task if the actor may read the task
pub async fn require_bug_read(
    pool: &PgPool,
    actor_id: Uuid,
    bug_id: Uuid,
) -> Result<(Bug, Task), AccessError> {
    let bug = Bug::find_by_id(pool, bug_id)
        .await?
        .ok_or(AccessError::NotFound)?;

    let (task, _) = require_task_read(pool, actor_id, bug.task_id).await?;

    Ok((bug, task))
}

/// Loads a bug and its parent task if the actor owns the task
pub async fn require_bug_owner(
    pool: &PgPool,
    actor_id: Uuid,
    bug_id: Uuid,
) -> Result<(Bug, Task), AccessError> {
    let bug = Bug::find_by_id(pool, bug_id)
        .await?
        .ok_or(AccessError::NotFound)?;

    let task = require_task_owner(pool, actor_id, bug.task_id).await?;

    Ok((bug, task))
}

async fn task_access(
    pool: &PgPool,
    actor_id: Uuid,
    task: &Task,
) -> Result<Option<TaskAccess>, sqlx::Error> {
    // Owners skip the participant lookup
    if task.user_id == actor_id {
        return Ok(Some(TaskAccess::Owner));
    }

    let is_participant = TaskParticipant::is_participant(pool, task.id, actor_id).await?;

    Ok(TaskAccess::resolve(actor_id, task.user_id, is_participant))
}
