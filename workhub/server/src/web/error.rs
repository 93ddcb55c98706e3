use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::attendance::AttendanceServiceError;
use crate::employee::EmployeeServiceError;
use crate::project::ProjectServiceError;

/// JSON body returned for every failed API request.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine readable error code
    pub error: String,
    /// Human readable description
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: String) -> Self {
        Self {
            error: error.to_string(),
            message,
        }
    }
}

/// Error type shared by all JSON API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Attendance(#[from] AttendanceServiceError),
    #[error(transparent)]
    Employee(#[from] EmployeeServiceError),
    #[error(transparent)]
    Project(#[from] ProjectServiceError),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

const INTERNAL_MESSAGE: &str =
    "An unexpected error occurred while processing your request. Please try again later.";

impl ApiError {
    /// Status code and machine readable code for this error.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Attendance(err) => match err {
                AttendanceServiceError::AlreadyPunchedIn => {
                    (StatusCode::BAD_REQUEST, "ALREADY_PUNCHED_IN")
                }
                AttendanceServiceError::NoActivePunch => (StatusCode::BAD_REQUEST, "NO_ACTIVE_PUNCH"),
                AttendanceServiceError::EmployeeNotFound(_) => {
                    (StatusCode::NOT_FOUND, "EMPLOYEE_NOT_FOUND")
                }
                AttendanceServiceError::CorruptRecord(_) | AttendanceServiceError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::Employee(err) => match err {
                EmployeeServiceError::EmployeeNotFound(_) => {
                    (StatusCode::NOT_FOUND, "EMPLOYEE_NOT_FOUND")
                }
                EmployeeServiceError::EmailTaken(_) => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
                EmployeeServiceError::InvalidTeamLeader(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_TEAM_LEADER")
                }
                EmployeeServiceError::Invalid(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
                EmployeeServiceError::CorruptRecord(_) | EmployeeServiceError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::Project(err) => match err {
                ProjectServiceError::ProjectNotFound(_) => {
                    (StatusCode::NOT_FOUND, "PROJECT_NOT_FOUND")
                }
                ProjectServiceError::TaskNotFound(_) => (StatusCode::NOT_FOUND, "TASK_NOT_FOUND"),
                ProjectServiceError::EmployeeNotFound(_) => {
                    (StatusCode::NOT_FOUND, "EMPLOYEE_NOT_FOUND")
                }
                ProjectServiceError::NotAssignee => (StatusCode::FORBIDDEN, "NOT_ASSIGNEE"),
                ProjectServiceError::Forbidden(_, _) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                ProjectServiceError::AssigneeIneligible { .. } => {
                    (StatusCode::BAD_REQUEST, "ASSIGNEE_INELIGIBLE")
                }
                ProjectServiceError::Invalid(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
                ProjectServiceError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                ProjectServiceError::CorruptRecord(_) | ProjectServiceError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            INTERNAL_MESSAGE.to_string()
        } else {
            tracing::debug!("Request rejected: {}", self);
            self.to_string()
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
