use std::sync::Arc;

use crate::web::AppState;
use crate::{attendance, auth, employee, project};

use axum::{
    Json, Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower::ServiceBuilder;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::api::v1::json_login_handler,
        employee::api::v1::register_employee_handler,
        employee::api::v1::get_employees_handler,
        employee::api::v1::get_employee_handler,
        attendance::api::v1::punch_in_handler,
        attendance::api::v1::punch_out_handler,
        attendance::api::v1::get_own_attendance_handler,
        attendance::api::v1::get_employee_attendance_handler,
        project::api::v1::create_project_handler,
        project::api::v1::get_projects_handler,
        project::api::v1::get_project_handler,
        project::api::v1::set_project_status_handler,
        project::api::v1::set_task_status_handler,
        project::api::v1::assign_task_handler,
        project::api::v1::add_task_comment_handler,
    ),
    tags(
        (name = "Auth", description = "Login and bearer tokens"),
        (name = "Employees", description = "Employee accounts and presence"),
        (name = "Attendance", description = "Daily punch-in and punch-out"),
        (name = "Projects", description = "Projects and their progress"),
        (name = "Tasks", description = "Task status, assignment and comments")
    )
)]
pub struct ApiDoc;

async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    let login_router = auth::api::v1::create_api_router(state.clone());
    let protected_routes = employee::api::v1::create_api_router(state.clone())
        .merge(attendance::api::v1::create_api_router(state.clone()))
        .merge(project::api::v1::create_api_router(state.clone()))
        .layer(ServiceBuilder::new().layer(from_fn(auth::api::v1::require_auth_middleware)));
    let public_routes = login_router.route("/openapi.json", get(openapi_handler));
    let api_routes = public_routes.merge(protected_routes);
    Router::new()
        .nest("/api/v1", api_routes)
        .layer(ServiceBuilder::new().layer(from_fn_with_state(
            state.auth.clone(),
            auth::api::v1::auth_user_middleware,
        )))
}
