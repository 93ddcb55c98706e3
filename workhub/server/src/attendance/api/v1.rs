use crate::attendance::{AttendanceSummary, MAX_HISTORY_DAYS};
use crate::auth::CurrentUser;
use crate::web::AppState;
use crate::web::error::{ApiError, ErrorResponse};
use crate::web::extract::{ApiPath, ApiQuery};
use axum::{
    Router,
    extract::{Extension, State},
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use workhub_core::{EmployeeId, PunchRecord};

/// JSON representation of one business day of attendance.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PunchRecordJson {
    pub employee_id: i32,
    /// Business day in the configured timezone
    pub day: NaiveDate,
    pub punch_in: DateTime<Utc>,
    pub punch_out: Option<DateTime<Utc>>,
    /// Hours between punch-in and punch-out, rounded to two decimals
    pub hours_worked: f64,
    /// One of Present, Late, Absent
    pub status: String,
}

impl From<PunchRecord> for PunchRecordJson {
    fn from(record: PunchRecord) -> Self {
        Self {
            employee_id: record.employee_id,
            day: record.day,
            punch_in: record.punch_in,
            punch_out: record.punch_out,
            hours_worked: record.hours_worked,
            status: record.status.to_string(),
        }
    }
}

/// API response for an attendance query.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponse {
    pub today: Option<PunchRecordJson>,
    /// Records of the requested window, newest first
    pub history: Vec<PunchRecordJson>,
    pub days: u32,
}

impl AttendanceResponse {
    fn new(summary: AttendanceSummary, days: u32) -> Self {
        Self {
            today: summary.today.map(PunchRecordJson::from),
            history: summary
                .history
                .into_iter()
                .map(PunchRecordJson::from)
                .collect(),
            days,
        }
    }
}

/// Query parameters for the attendance history window.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceQuery {
    /// Number of business days to include, today included
    #[serde(default)]
    pub days: Option<u32>,
}

/// Handler for POST /api/v1/attendance/punch-in - Starts the caller's shift.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/attendance/punch-in",
    responses(
        (status = 200, description = "Punched in", body = PunchRecordJson),
        (status = 400, description = "Already punched in today", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn punch_in_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<PunchRecordJson>, ApiError> {
    let record = state.attendance().punch_in(current_user.id).await?;
    Ok(Json(record.into()))
}

/// Handler for POST /api/v1/attendance/punch-out - Ends the caller's shift.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/attendance/punch-out",
    responses(
        (status = 200, description = "Punched out", body = PunchRecordJson),
        (status = 400, description = "No active punch-in today", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn punch_out_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<PunchRecordJson>, ApiError> {
    let record = state.attendance().punch_out(current_user.id).await?;
    Ok(Json(record.into()))
}

/// Handler for GET /api/v1/attendance - Returns the caller's attendance.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(("days" = Option<u32>, Query, description = "History window in days (1-366)")),
    responses(
        (status = 200, description = "Successfully retrieved attendance", body = AttendanceResponse)
    ),
    tag = "Attendance"
)]
pub async fn get_own_attendance_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<AttendanceQuery>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    attendance_for(&state, current_user.id, query).await
}

/// Handler for GET /api/v1/employees/{id}/attendance - Returns another employee's
/// attendance. Managers and team-leaders only.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}/attendance",
    params(
        ("id" = i32, Path, description = "Employee ID"),
        ("days" = Option<u32>, Query, description = "History window in days (1-366)")
    ),
    responses(
        (status = 200, description = "Successfully retrieved attendance", body = AttendanceResponse),
        (status = 403, description = "Caller may not view other employees", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn get_employee_attendance_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiQuery(query): ApiQuery<AttendanceQuery>,
) -> Result<Json<AttendanceResponse>, ApiError> {
    if id != current_user.id && !current_user.role.is_elevated() {
        return Err(ApiError::Forbidden(
            "Only managers and team-leaders can view other employees' attendance".to_string(),
        ));
    }
    attendance_for(&state, id, query).await
}

async fn attendance_for(
    state: &AppState,
    employee_id: EmployeeId,
    query: AttendanceQuery,
) -> Result<Json<AttendanceResponse>, ApiError> {
    let days = query
        .days
        .unwrap_or(state.attendance_history_days)
        .clamp(1, MAX_HISTORY_DAYS);
    let summary = state.attendance().get_attendance(employee_id, days).await?;
    Ok(Json(AttendanceResponse::new(summary, days)))
}

/// Creates and returns the attendance API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/attendance", get(get_own_attendance_handler))
        .route("/attendance/punch-in", post(punch_in_handler))
        .route("/attendance/punch-out", post(punch_out_handler))
        .route(
            "/employees/{id}/attendance",
            get(get_employee_attendance_handler),
        )
        .with_state(state)
}
