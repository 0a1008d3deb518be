/// Health check endpoint
///
/// ```text
/// GET /health
/// ```
///
/// ```json
/// { "status": "healthy", "version": "0.1.0", "database": "connected" }
/// ```
///
/// The endpoint is public, sits outside the API prefix and always answers
/// `200`; a database that does not respond turns the status `degraded`.

use crate::app::AppState;
use axum::{extract::State, Json};
use bugboard_shared::db::pool::health_check as db_health_check;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long the database ping may take before it counts as down
const DB_PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    /// Application version
    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,
}

impl HealthResponse {
    fn new(database_up: bool) -> Self {
        let (status, database) = if database_up {
            ("healthy", "connected")
        } else {
            ("degraded", "disconnected")
        };

        Self {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }
    }
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_up = matches!(
        tokio::time::timeout(DB_PING_TIMEOUT, db_health_check(&state.db)).await,
        Ok(Ok(()))
    );

    if !database_up {
        tracing::warn!("Health check: database unreachable");
    }

    Json(HealthResponse::new(database_up))
}
