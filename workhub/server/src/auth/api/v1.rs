use crate::auth::{AuthState, CurrentUser, decode_jwt, encode_jwt};
use crate::employee::EmployeeService;
use crate::web::AppState;
use crate::web::error::{ApiError, ErrorResponse};
use crate::web::extract::ApiJson;
use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// JSON request payload for API login
#[derive(Deserialize, Debug, ToSchema)]
pub struct JsonLoginRequest {
    pub email: String,
    pub password: String,
}

/// JSON response for successful API login
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct LoginResponse {
    /// Bearer token valid for 24 hours
    pub token: String,
    pub employee_id: i32,
    pub role: String,
}

/// Creates a JSON API router for authentication endpoints.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(json_login_handler))
        .with_state(state)
}

/// API authentication middleware that extracts the current user from Authorization Bearer header.
/// Sets the CurrentUser extension if a valid JWT token is found in the Authorization header.
pub async fn auth_user_middleware(
    State(state): State<Arc<AuthState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = token {
        match decode_jwt(token, &state.jwt_secret) {
            Ok(current_user) => {
                request.extensions_mut().insert(current_user);
            }
            Err(err) => tracing::debug!("Ignoring invalid bearer token: {}", err),
        }
    }

    next.run(request).await
}

/// Middleware that ensures the current user is authenticated.
/// Returns UNAUTHORIZED if the CurrentUser extension is not found in the request.
/// This middleware should be applied after auth_user_middleware.
pub async fn require_auth_middleware(request: Request, next: Next) -> Response {
    if request.extensions().get::<CurrentUser>().is_none() {
        let error_response = ErrorResponse::new(
            "UNAUTHORIZED",
            "Authentication required to access this resource".to_string(),
        );
        return (StatusCode::UNAUTHORIZED, Json(error_response)).into_response();
    }

    next.run(request).await
}

/// Handles JSON login requests and returns a JWT token.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = JsonLoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn json_login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<JsonLoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let employee = EmployeeService::new(&state.db)
        .authenticate(&payload.email, &payload.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let token = encode_jwt(employee.id(), employee.role(), &state.auth.jwt_secret)
        .map_err(|e| ApiError::Internal(format!("failed to issue token: {}", e)))?;
    tracing::info!("Employee {} logged in", employee.id());

    Ok(Json(LoginResponse {
        token,
        employee_id: employee.id(),
        role: employee.role().to_string(),
    }))
}
