/// PostgreSQL connection pool
///
/// The pool is created once at startup, verified with a `SELECT 1`, shared
/// by every request through the application state and closed on shutdown.
///
/// # Example
///
/// ```no_run
/// use bugboard_shared::db::pool::{close_pool, create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), sqlx::Error> {
/// let pool = create_pool(DatabaseConfig::from_url("postgresql://localhost/bugboard", 10)).await?;
/// close_pool(pool).await;
/// # Ok(())
/// # }
/// ```

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Pool sizing and connection lifetimes
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,

    pub max_connections: u32,

    /// Connections kept open while idle
    pub min_connections: u32,

    /// How long a query waits for a free connection
    pub acquire_timeout: Duration,

    pub idle_timeout: Option<Duration>,

    /// Connections are recycled after this long
    pub max_lifetime: Option<Duration>,

    /// Ping connections before handing them out
    pub test_before_acquire: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(10 * 60)),
            max_lifetime: Some(Duration::from_secs(30 * 60)),
            test_before_acquire: true,
        }
    }
}

impl DatabaseConfig {
    /// Default lifetimes with the given URL and pool size
    ///
    /// `min_connections` never exceeds `max_connections`.
    pub fn from_url(url: impl Into<String>, max_connections: u32) -> Self {
        let defaults = Self::default();

        Self {
            url: url.into(),
            max_connections,
            min_connections: defaults.min_connections.min(max_connections),
            ..defaults
        }
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .test_before_acquire(self.test_before_acquire)
    }
}

/// Connects the pool and checks that the database answers
///
/// # Errors
///
/// Returns an error if the URL is invalid or the database cannot be reached
pub async fn create_pool(config: DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_ms = config.acquire_timeout.as_millis() as u64,
        "Connecting to database"
    );

    let pool = config.pool_options().connect(&config.url).await?;
    health_check(&pool).await?;

    info!("Database pool ready");
    Ok(pool)
}

/// Runs `SELECT 1` on a pooled connection
///
/// # Errors
///
/// Returns the query error if no connection could be acquired or the
/// database did not answer
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    debug!(result = one, "Database ping");

    Ok(())
}

/// Closes every connection; call once during shutdown
pub async fn close_pool(pool: PgPool) {
    pool.close().await;
    info!("Database pool closed");
}
