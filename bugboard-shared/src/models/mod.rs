/// Database models for Bugboard
///
/// Each model owns its table and the queries against it.
///
/// # Models
///
/// - `user`: User accounts, bootstrap admin role, user directory
/// - `task`: Tasks and their embedded detail view
/// - `task_participant`: Users granted read access to a task
/// - `hidden_task`: Per-user hidden-task overlay
/// - `bug`: Bugs attached to a task
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::models::user::{CreateUser, Registration, User};
/// use bugboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let outcome = User::register(&pool, CreateUser {
///     name: "alice".to_string(),
///     email: Some("alice@example.com".to_string()),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// assert!(matches!(outcome, Registration::Created(_)));
/// # Ok(())
/// # }
/// ```

pub mod bug;
pub mod hidden_task;
pub mod task;
pub mod task_participant;
pub mod user;
