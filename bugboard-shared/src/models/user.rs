/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'user');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     seq BIGINT GENERATED ALWAYS AS IDENTITY,
///     name VARCHAR(100) NOT NULL UNIQUE,
///     email VARCHAR(255),
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     job_role VARCHAR(100),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The first user ever registered becomes `admin`; everyone after that is
/// a plain `user`. [`User::register`] makes that decision inside the same
/// transaction as the insert, so two concurrent first registrations cannot
/// both become admin.
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::models::user::{CreateUser, Registration, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let outcome = User::register(&pool, CreateUser {
///     name: "alice".to_string(),
///     email: None,
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
///
/// if let Registration::Created(user) = outcome {
///     println!("{} registered as {}", user.name, user.role.as_str());
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// System-wide user role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Bootstrap administrator, hidden from the user directory
    Admin,

    /// Regular user
    User,
}

impl UserRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }

    /// Role for a new registrant given how many admins already exist
    pub fn for_new_registrant(existing_admins: i64) -> Self {
        if existing_admins == 0 {
            UserRole::Admin
        } else {
            UserRole::User
        }
    }
}

/// User account
///
/// The password hash never leaves the server: it is skipped on serialization.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name, unique across all users
    pub name: String,

    /// Optional e-mail address
    pub email: Option<String>,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// System role
    pub role: UserRole,

    /// Free-form job title
    pub job_role: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Public view of a user, embedded in task and directory responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
    pub job_role: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            role: user.role,
            job_role: user.job_role,
            created_at: user.created_at,
        }
    }
}

/// Input for registering a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Display name (must be unique)
    pub name: String,

    /// Optional e-mail address
    pub email: Option<String>,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

/// Outcome of [`User::register`]
#[derive(Debug, Clone)]
pub enum Registration {
    /// The user was inserted
    Created(User),

    /// Another user already holds the requested name
    NameTaken,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, job_role, created_at";
pub(crate) const SUMMARY_COLUMNS: &str = "u.id, u.name, u.role, u.job_role, u.created_at";

impl User {
    /// Registers a new user, assigning the bootstrap role atomically
    ///
    /// Inside one transaction the `users` table is locked against concurrent
    /// registrations, the name is checked, the admin count is read and the
    /// row is inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn register(pool: &PgPool, data: CreateUser) -> Result<Registration, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let name_taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE name = $1)")
                .bind(&data.name)
                .fetch_one(&mut *tx)
                .await?;

        if name_taken {
            tx.rollback().await?;
            return Ok(Registration::NameTaken);
        }

        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&mut *tx)
            .await?;
        let role = UserRole::for_new_registrant(admins);

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Registration::Created(user))
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(user)
    }

    /// Finds a user by display name (exact match)
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        let user =
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE name = $1"))
                .bind(name)
                .fetch_optional(pool)
                .await?;

        Ok(user)
    }

    /// Lists the user directory as seen by `viewer_id`
    ///
    /// Admins and the viewer themself are excluded. Newest first.
    pub async fn list_directory(
        pool: &PgPool,
        viewer_id: Uuid,
    ) -> Result<Vec<UserSummary>, sqlx::Error> {
        let users = sqlx::query_as::<_, UserSummary>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM users u \
             WHERE u.role <> 'admin' AND u.id <> $1 \
             ORDER BY u.created_at DESC, u.seq DESC"
        ))
        .bind(viewer_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Returns the subset of `ids` that belong to existing users
    ///
    /// Order of the input is preserved.
    pub async fn existing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;

        Ok(ids.iter().copied().filter(|id| found.contains(id)).collect())
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
