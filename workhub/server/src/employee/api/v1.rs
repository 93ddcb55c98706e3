use crate::auth::CurrentUser;
use crate::employee::{Employee, EmployeeService, NewEmployee};
use crate::web::AppState;
use crate::web::error::{ApiError, ErrorResponse};
use crate::web::extract::{ApiJson, ApiPath};
use axum::{
    Router,
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use workhub_core::{Presence, Role};

/// JSON representation of an employee for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmployeeJson {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// One of manager, team-leader, developer, designer, employee, business
    pub role: String,
    /// The team-leader this employee reports to
    pub team_leader_id: Option<i32>,
    /// online while punched in today, offline otherwise
    pub presence: String,
}

impl EmployeeJson {
    fn new(employee: Employee, presence: Presence) -> Self {
        Self {
            id: employee.id(),
            name: employee.name().to_string(),
            email: employee.email().to_string(),
            role: employee.role().to_string(),
            team_leader_id: employee.team_leader_id(),
            presence: presence.to_string(),
        }
    }
}

/// API response for listing employees.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmployeesResponse {
    pub employees: Vec<EmployeeJson>,
    pub count: usize,
}

/// Request body for registering an employee.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterEmployeeRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub team_leader_id: Option<i32>,
}

/// Handler for POST /api/v1/employees - Registers an employee. Managers only.
#[tracing::instrument(skip(state, payload), fields(caller = current_user.id))]
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = RegisterEmployeeRequest,
    responses(
        (status = 201, description = "Employee registered", body = EmployeeJson),
        (status = 400, description = "Invalid employee details", body = ErrorResponse),
        (status = 403, description = "Caller is not a manager", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn register_employee_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<RegisterEmployeeRequest>,
) -> Result<(StatusCode, Json<EmployeeJson>), ApiError> {
    if current_user.role != Role::Manager {
        return Err(ApiError::Forbidden(
            "Only managers can register employees".to_string(),
        ));
    }
    let role = payload
        .role
        .parse::<Role>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let employee = EmployeeService::new(&state.db)
        .register(
            NewEmployee {
                name: payload.name,
                email: payload.email,
                password: payload.password,
                role,
                team_leader_id: payload.team_leader_id,
            },
            state.clock.now(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(EmployeeJson::new(employee, Presence::Offline)),
    ))
}

/// Handler for GET /api/v1/employees - Returns every employee with presence.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    responses(
        (status = 200, description = "Successfully retrieved employees", body = EmployeesResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn get_employees_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EmployeesResponse>, ApiError> {
    let employees = EmployeeService::new(&state.db).list_employees().await?;
    let on_shift = state.attendance().on_shift_today().await?;

    let employees: Vec<EmployeeJson> = employees
        .into_iter()
        .map(|employee| {
            let presence = if on_shift.contains(&employee.id()) {
                Presence::Online
            } else {
                Presence::Offline
            };
            EmployeeJson::new(employee, presence)
        })
        .collect();
    let count = employees.len();

    Ok(Json(EmployeesResponse { employees, count }))
}

/// Handler for GET /api/v1/employees/{id} - Returns one employee.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}",
    params(("id" = i32, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully retrieved employee", body = EmployeeJson),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    ),
    tag = "Employees"
)]
pub async fn get_employee_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<EmployeeJson>, ApiError> {
    let employee = EmployeeService::new(&state.db).get_employee(id).await?;
    let presence = state.attendance().presence(id).await?;
    Ok(Json(EmployeeJson::new(employee, presence)))
}

/// Creates and returns the employees API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/employees",
            get(get_employees_handler).post(register_employee_handler),
        )
        .route("/employees/{id}", get(get_employee_handler))
        .with_state(state)
}
