/// Configuration management for the API server
///
/// Configuration is read once at startup and shared read-only through
/// [`AppState`](crate::app::AppState). Handlers never look at the process
/// environment themselves.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 3000)
/// - `API_PREFIX`: Path prefix for the JSON API (default: /api)
/// - `APP_ENV`: `production` enables HSTS and `Secure` cookies
/// - `CORS_ORIGIN`, `CORS_ORIGIN_SECONDARY`: Allowed browser origins
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for token signing (required, 32+ chars)
/// - `JWT_TTL_SECONDS`: Token lifetime (default: 3600, at most 30 days)
/// - `RUST_LOG`: Log filter (default: bugboard_api=debug,bugboard_shared=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use bugboard_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

use bugboard_shared::auth::jwt::DEFAULT_TTL_SECONDS;

/// Minimum accepted length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Longest accepted `JWT_TTL_SECONDS` (30 days)
pub const MAX_JWT_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Prefix every JSON endpoint is mounted under, e.g. `/api`
    pub prefix: String,

    /// Allowed CORS origins; `*` allows any origin
    pub cors_origins: Vec<String>,

    /// Production mode (HSTS, `Secure` cookies)
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    /// Token lifetime in seconds
    pub ttl_seconds: i64,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// A `.env` file in the working directory is loaded first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match var("API_PORT") {
            Some(raw) => raw.parse::<u16>().context("API_PORT must be a port number")?,
            None => 3000,
        };
        let prefix = normalize_prefix(&var("API_PREFIX").unwrap_or_else(|| "/api".to_string()));
        let production = var("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production"));

        let cors_origins = ["CORS_ORIGIN", "CORS_ORIGIN_SECONDARY"]
            .into_iter()
            .filter_map(|key| var(key))
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .collect();

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            None => 10,
        };

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }

        let ttl_seconds = match var("JWT_TTL_SECONDS") {
            Some(raw) => raw.parse::<i64>().context("JWT_TTL_SECONDS must be an integer")?,
            None => DEFAULT_TTL_SECONDS,
        };
        if !(1..=MAX_JWT_TTL_SECONDS).contains(&ttl_seconds) {
            anyhow::bail!(
                "JWT_TTL_SECONDS must be between 1 and {}",
                MAX_JWT_TTL_SECONDS
            );
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                prefix,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                ttl_seconds,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// `api/` and `/api/` both become `/api`; `/` and blank become empty
fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');

    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
