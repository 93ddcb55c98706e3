#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use workhub_core::{Actor, Clock, Role, WorkdayPolicy};
use workhub_server::auth::{AuthState, encode_jwt};
use workhub_server::employee::{Employee, EmployeeService, NewEmployee};
use workhub_server::web::{AppState, create_app};

pub const JWT_SECRET: &str = "test_secret";
pub const PASSWORD: &str = "password";

/// Fresh in-memory SQLite database with every migration applied.
///
/// The pool is pinned to a single connection because every SQLite memory
/// connection opens its own empty database.
pub async fn setup_db() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Clock that only moves when a test moves it.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// UTC+05:30 with a 09:00 late threshold.
pub fn policy() -> WorkdayPolicy {
    WorkdayPolicy::parse(330, "09:00").unwrap()
}

/// Builds an instant from a wall-clock time in the business timezone.
pub fn ist(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    FixedOffset::east_opt(330 * 60)
        .unwrap()
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub async fn create_employee(
    db: &DatabaseConnection,
    name: &str,
    role: Role,
    team_leader_id: Option<i32>,
) -> Employee {
    EmployeeService::new(db)
        .register(
            NewEmployee {
                name: name.to_string(),
                email: format!("{}@example.com", name),
                password: PASSWORD.to_string(),
                role,
                team_leader_id,
            },
            ist(2025, 9, 1, 8, 0),
        )
        .await
        .unwrap()
}

pub fn actor_of(employee: &Employee) -> Actor {
    Actor::new(employee.id(), employee.role())
}

pub fn token_for(employee: &Employee) -> String {
    encode_jwt(employee.id(), employee.role(), JWT_SECRET).unwrap()
}

pub fn create_test_app(db: DatabaseConnection, clock: Arc<FixedClock>) -> Router {
    create_app(AppState {
        db: Arc::new(db),
        clock,
        policy: policy(),
        attendance_history_days: 30,
        auth: Arc::new(AuthState {
            jwt_secret: JWT_SECRET.to_string(),
        }),
    })
}

/// Sends one request through the app and decodes the JSON response body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| serde_json::Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, json)
}
