use crate::auth::CurrentUser;
use crate::project::{
    NewProject, NewStep, NewTask, ProjectService, ProjectWithProgress, TaskStatusUpdate,
};
use crate::web::AppState;
use crate::web::error::{ApiError, ErrorResponse};
use crate::web::extract::{ApiJson, ApiPath};
use axum::{
    Router,
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use workhub_core::{Comment, ProjectStatus, Step, Task, TaskStatus};

/// JSON representation of a task comment.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CommentJson {
    pub id: Uuid,
    pub author_id: i32,
    pub text: String,
    /// Names of attached files
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentJson {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            author_id: comment.author,
            text: comment.text,
            attachments: comment.attachments,
            created_at: comment.created_at,
        }
    }
}

/// JSON representation of a task.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskJson {
    pub id: Uuid,
    pub title: String,
    pub assignee_id: Option<i32>,
    /// One of pending, in-progress, completed
    pub status: String,
    pub comments: Vec<CommentJson>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            assignee_id: task.assignee,
            status: task.status.to_string(),
            comments: task.comments.into_iter().map(CommentJson::from).collect(),
        }
    }
}

/// JSON representation of a project step.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StepJson {
    pub name: String,
    pub tasks: Vec<TaskJson>,
}

impl From<Step> for StepJson {
    fn from(step: Step) -> Self {
        Self {
            name: step.name,
            tasks: step.tasks.into_iter().map(TaskJson::from).collect(),
        }
    }
}

/// JSON representation of a project with its computed progress.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectJson {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub status: String,
    pub deadline: Option<NaiveDate>,
    pub assignee_id: Option<i32>,
    pub steps: Vec<StepJson>,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Completed tasks as a rounded percentage of all tasks
    pub progress: u8,
}

impl From<ProjectWithProgress> for ProjectJson {
    fn from(value: ProjectWithProgress) -> Self {
        let ProjectWithProgress { project, summary } = value;
        Self {
            id: project.id,
            title: project.title,
            description: project.description,
            status: project.status.to_string(),
            deadline: project.deadline,
            assignee_id: project.assignee,
            steps: project.steps.into_iter().map(StepJson::from).collect(),
            total_tasks: summary.total_tasks,
            completed_tasks: summary.completed_tasks,
            progress: summary.progress,
        }
    }
}

/// API response for listing projects.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectsResponse {
    pub projects: Vec<ProjectJson>,
    pub count: usize,
}

/// API response for a task status change.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskStatusResponse {
    pub project: ProjectJson,
    pub updated_task_id: Uuid,
    pub new_status: String,
}

impl From<TaskStatusUpdate> for TaskStatusResponse {
    fn from(update: TaskStatusUpdate) -> Self {
        Self {
            project: update.project.into(),
            updated_task_id: update.updated_task_id,
            new_status: update.new_status.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub assignee_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStepRequest {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<CreateTaskRequest>,
}

/// Request body for creating a project.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    /// Primary assignee; a project with one starts as assigned
    #[serde(default)]
    pub assignee_id: Option<i32>,
    #[serde(default)]
    pub steps: Vec<CreateStepRequest>,
}

impl From<CreateProjectRequest> for NewProject {
    fn from(request: CreateProjectRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            deadline: request.deadline,
            assignee_id: request.assignee_id,
            steps: request
                .steps
                .into_iter()
                .map(|step| NewStep {
                    name: step.name,
                    tasks: step
                        .tasks
                        .into_iter()
                        .map(|task| NewTask {
                            title: task.title,
                            assignee_id: task.assignee_id,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Request body for status changes on projects and tasks.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTaskRequest {
    pub assignee_id: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCommentRequest {
    pub text: String,
    /// Names of attached files; the files themselves are not stored
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Handler for POST /api/v1/projects - Creates a project with its steps and tasks.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectJson),
        (status = 400, description = "Invalid project or ineligible assignee", body = ErrorResponse),
        (status = 403, description = "Caller may not create projects", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn create_project_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    ApiJson(payload): ApiJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectJson>), ApiError> {
    let project = ProjectService::new(&state.db)
        .create_project(&current_user.actor(), payload.into(), state.clock.now())
        .await?;
    Ok((StatusCode::CREATED, Json(project.into())))
}

/// Handler for GET /api/v1/projects - Returns every project with its progress.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    responses(
        (status = 200, description = "Successfully retrieved projects", body = ProjectsResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn get_projects_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProjectsResponse>, ApiError> {
    let projects: Vec<ProjectJson> = ProjectService::new(&state.db)
        .list_projects()
        .await?
        .into_iter()
        .map(ProjectJson::from)
        .collect();
    let count = projects.len();
    Ok(Json(ProjectsResponse { projects, count }))
}

/// Handler for GET /api/v1/projects/{id} - Returns one project with its progress.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Successfully retrieved project", body = ProjectJson),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn get_project_handler(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<ProjectJson>, ApiError> {
    let project = ProjectService::new(&state.db)
        .get_project_with_progress(id)
        .await?;
    Ok(Json(project.into()))
}

/// Handler for PUT /api/v1/projects/{id}/status - Sets a project's status. Managers only.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}/status",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Project status updated", body = ProjectJson),
        (status = 403, description = "Caller is not a manager", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn set_project_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> Result<Json<ProjectJson>, ApiError> {
    let status = payload
        .status
        .parse::<ProjectStatus>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let project = ProjectService::new(&state.db)
        .set_project_status(&current_user.actor(), id, status)
        .await?;
    Ok(Json(project.into()))
}

/// Handler for PUT /api/v1/tasks/{id}/status - Changes a task's status and
/// returns the project's recomputed progress.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}/status",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Task status updated", body = TaskStatusResponse),
        (status = 403, description = "Caller may not update this task", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Concurrent modification", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn set_task_status_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> Result<Json<TaskStatusResponse>, ApiError> {
    let status = payload
        .status
        .parse::<TaskStatus>()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let update = ProjectService::new(&state.db)
        .set_task_status(id, status, &current_user.actor())
        .await?;
    Ok(Json(update.into()))
}

/// Handler for PUT /api/v1/tasks/{id}/assignee - Assigns a task. Managers and
/// team-leaders only.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}/assignee",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = AssignTaskRequest,
    responses(
        (status = 200, description = "Task assigned", body = TaskJson),
        (status = 400, description = "Assignee role is not eligible", body = ErrorResponse),
        (status = 403, description = "Caller may not assign tasks", body = ErrorResponse),
        (status = 404, description = "Task or employee not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn assign_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AssignTaskRequest>,
) -> Result<Json<TaskJson>, ApiError> {
    let task = ProjectService::new(&state.db)
        .assign_task(&current_user.actor(), id, payload.assignee_id)
        .await?;
    Ok(Json(task.into()))
}

/// Handler for POST /api/v1/tasks/{id}/comments - Adds a comment to a task.
#[tracing::instrument(skip(state, payload))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/comments",
    params(("id" = Uuid, Path, description = "Task ID")),
    request_body = AddCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentJson),
        (status = 403, description = "Caller may not comment on this task", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn add_task_comment_handler(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<CurrentUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AddCommentRequest>,
) -> Result<(StatusCode, Json<CommentJson>), ApiError> {
    let comment = ProjectService::new(&state.db)
        .add_task_comment(
            id,
            &current_user.actor(),
            payload.text,
            payload.attachments,
            state.clock.now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

/// Creates and returns the projects and tasks API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/projects",
            get(get_projects_handler).post(create_project_handler),
        )
        .route("/projects/{id}", get(get_project_handler))
        .route("/projects/{id}/status", put(set_project_status_handler))
        .route("/tasks/{id}/status", put(set_task_status_handler))
        .route("/tasks/{id}/assignee", put(assign_task_handler))
        .route("/tasks/{id}/comments", post(add_task_comment_handler))
        .with_state(state)
}
