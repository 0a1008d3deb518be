/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use bugboard_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = bugboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use bugboard_shared::auth::middleware::{authenticate, extract_token};
use sqlx::PgPool;
use std::{sync::Arc, time::Duration};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via `State`; the config sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET /health                     # Health check (public)
/// └── {API_PREFIX}/                   # default /api
///     ├── POST /auth/register         # public
///     ├── POST /auth/login            # public
///     ├── GET  /me                    # everything below: authenticated
///     ├── GET  /users
///     ├── GET|POST /task
///     ├── GET|PUT|DELETE /task/:id
///     ├── POST|DELETE /task/:id/hide
///     ├── GET  /task/:id/bugs
///     ├── POST /bug
///     └── GET|PUT|DELETE /bug/:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first):
/// 1. Security headers
/// 2. CORS (tower-http CorsLayer)
/// 3. Logging (tower-http TraceLayer)
/// 4. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/me", get(routes::users::me))
        .route("/users", get(routes::users::list_users))
        .route(
            "/task",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/task/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/task/:id/hide",
            post(routes::tasks::hide_task).delete(routes::tasks::unhide_task),
        )
        .route("/task/:id/bugs", get(routes::tasks::list_task_bugs))
        .route("/bug", post(routes::bugs::create_bug))
        .route(
            "/bug/:id",
            get(routes::bugs::get_bug)
                .put(routes::bugs::update_bug)
                .delete(routes::bugs::delete_bug),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    // axum refuses to nest at the root, so an empty prefix merges instead
    let prefix = state.config.api.prefix.clone();
    let router = if prefix.is_empty() {
        Router::new().merge(health_routes).merge(api_routes)
    } else {
        Router::new().merge(health_routes).nest(&prefix, api_routes)
    };

    let cors = cors_layer(&state.config.api.cors_origins);

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS for the configured browser origins
///
/// Cookies are allowed cross-origin, so origins are listed explicitly
/// unless `*` is configured (development only).
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

/// Authentication middleware layer
///
/// Reads the token from the `token` cookie or the `Authorization` header,
/// validates it and inserts the resulting `AuthContext` into request
/// extensions. Missing token is a 401, a bad one a 403.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(extract_token(req.headers()), state.jwt_secret())?;

    tracing::debug!(user_id = %auth_context.user_id, "Request authenticated");
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
