/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use uptask_api::{app::AppState, config::Config};
/// use uptask_shared::mail::LogMailer;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let mailer = Arc::new(LogMailer::new(config.mail.from.clone()));
/// let state = AppState::new(pool, config, mailer);
/// let app = uptask_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::require_session};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uptask_shared::mail::{self, Email, Mailer};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,

    pub config: Arc<Config>,

    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    pub fn frontend_url(&self) -> &str {
        &self.config.api.frontend_url
    }

    /// Hands an email to the mailer without waiting for delivery
    pub fn send_email(&self, email: Email) {
        mail::dispatch(self.mailer.clone(), email);
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                  (public)
/// ├── /auth/
/// │   ├── POST /create-account                 (public)
/// │   ├── POST /confirm-account                (public)
/// │   ├── POST /login                          (public)
/// │   ├── POST /request-code                   (public)
/// │   ├── POST /forgot-password                (public)
/// │   ├── POST /validate-token                 (public)
/// │   ├── POST /update-password/:token         (public)
/// │   ├── GET  /user                           (session)
/// │   ├── PUT  /profile                        (session)
/// │   ├── POST /update-password                (session)
/// │   └── POST /check-password                 (session)
/// └── /projects/                               (session)
///     ├── GET, POST /
///     ├── GET, PUT, DELETE /:project_id
///     ├── GET, POST /:project_id/tasks
///     ├── GET, PUT, DELETE /:project_id/tasks/:task_id
///     ├── POST /:project_id/tasks/:task_id/status
///     ├── GET, POST /:project_id/tasks/:task_id/notes
///     ├── DELETE /:project_id/tasks/:task_id/notes/:note_id
///     ├── POST /:project_id/team/find
///     ├── GET, POST /:project_id/team
///     └── DELETE /:project_id/team/:user_id
/// ```
///
/// # Middleware Stack
///
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session verification (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/create-account", post(routes::auth::create_account))
        .route("/confirm-account", post(routes::auth::confirm_account))
        .route("/login", post(routes::auth::login))
        .route("/request-code", post(routes::auth::request_code))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/validate-token", post(routes::auth::validate_token))
        .route(
            "/update-password/:token",
            post(routes::auth::update_password_with_token),
        );

    let session_auth_routes = Router::new()
        .route("/user", get(routes::auth::current_user))
        .route("/profile", put(routes::auth::update_profile))
        .route("/update-password", post(routes::auth::update_current_password))
        .route("/check-password", post(routes::auth::check_password))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:project_id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:project_id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:project_id/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/:project_id/tasks/:task_id/status",
            post(routes::tasks::update_status),
        )
        .route(
            "/:project_id/tasks/:task_id/notes",
            get(routes::notes::list_notes).post(routes::notes::create_note),
        )
        .route(
            "/:project_id/tasks/:task_id/notes/:note_id",
            delete(routes::notes::delete_note),
        )
        .route("/:project_id/team/find", post(routes::team::find_member))
        .route(
            "/:project_id/team",
            get(routes::team::list_members).post(routes::team::add_member),
        )
        .route("/:project_id/team/:user_id", delete(routes::team::remove_member))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
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
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/auth", public_auth_routes.merge(session_auth_routes))
        .nest("/projects", project_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
