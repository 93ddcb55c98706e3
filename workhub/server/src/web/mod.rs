use axum::Router;
use axum::http::header;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use workhub_core::{Clock, SystemClock, WorkdayPolicy};

use crate::attendance::AttendanceService;
use crate::auth::{AuthState, FilteredMakeSpan};
use crate::config::Config;
use crate::employee::EmployeeService;

pub mod api;
pub mod error;
pub mod extract;

/// Shared state handed to every API handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub clock: Arc<dyn Clock>,
    pub policy: WorkdayPolicy,
    /// Attendance window used when a request does not name one.
    pub attendance_history_days: u32,
    pub auth: Arc<AuthState>,
}

impl AppState {
    pub fn attendance(&self) -> AttendanceService<'_> {
        AttendanceService::new(&self.db, self.clock.as_ref(), &self.policy)
    }
}

/// Builds the complete application router: health check, OpenAPI document and
/// the versioned JSON API.
pub fn create_app(state: AppState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(api::create_api_router(state))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new([header::AUTHORIZATION]))
                .layer(TraceLayer::new_for_http().make_span_with(FilteredMakeSpan))
                .layer(CorsLayer::new()),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let policy = config.workday_policy()?;

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let admin = EmployeeService::new(&db)
        .ensure_admin(
            &config.admin_name,
            &config.admin_email,
            &config.admin_password,
            clock.now(),
        )
        .await?;
    tracing::info!("Bootstrap manager account is employee {}", admin.id());

    let state = AppState {
        db: Arc::new(db),
        clock,
        policy,
        attendance_history_days: config.attendance_history_days,
        auth: Arc::new(AuthState::from_config(&config)),
    };
    let app = create_app(state);

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}
