use crate::employee::{EmployeeService, EmployeeServiceError};
use crate::entities::*;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;
use workhub_core::{
    Actor, Comment, EmployeeId, ProgressSummary, Project, ProjectId, ProjectStatus, Role, Step,
    Task, TaskError, TaskStatus,
};

pub mod api;

/// How many times a project write is retried after losing a version race.
pub const MAX_WRITE_ATTEMPTS: usize = 5;

/// A stored project together with the progress computed from its tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectWithProgress {
    pub project: Project,
    pub summary: ProgressSummary,
}

impl ProjectWithProgress {
    pub fn progress(&self) -> u8 {
        self.summary.progress
    }
}

/// Result of a task status change.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatusUpdate {
    pub project: ProjectWithProgress,
    pub updated_task_id: Uuid,
    pub new_status: TaskStatus,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub assignee_id: Option<EmployeeId>,
}

#[derive(Debug, Clone)]
pub struct NewStep {
    pub name: String,
    pub tasks: Vec<NewTask>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub deadline: Option<NaiveDate>,
    pub assignee_id: Option<EmployeeId>,
    pub steps: Vec<NewStep>,
}

/// Error type for ProjectService operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    #[error("Project with ID {0} not found")]
    ProjectNotFound(ProjectId),
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),
    #[error("Only the task's assignee or their supervisor can update this task")]
    NotAssignee,
    #[error("Employee {assignee} has role '{role}' which cannot be assigned tasks")]
    AssigneeIneligible { assignee: EmployeeId, role: Role },
    #[error("Employee with ID {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("Role '{0}' is not allowed to {1}")]
    Forbidden(Role, &'static str),
    #[error("Invalid project details: {0}")]
    Invalid(String),
    #[error("Project {0} was modified concurrently, please retry")]
    Conflict(ProjectId),
    #[error("Stored project document is corrupt: {0}")]
    CorruptRecord(String),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl From<TaskError> for ProjectServiceError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::TaskNotFound(id) => ProjectServiceError::TaskNotFound(id),
            TaskError::NotAssignee => ProjectServiceError::NotAssignee,
            TaskError::AssigneeIneligible { assignee, role } => {
                ProjectServiceError::AssigneeIneligible { assignee, role }
            }
            TaskError::UnknownStatus(status) => {
                ProjectServiceError::Invalid(format!("unknown status '{}'", status))
            }
        }
    }
}

impl From<EmployeeServiceError> for ProjectServiceError {
    fn from(err: EmployeeServiceError) -> Self {
        match err {
            EmployeeServiceError::EmployeeNotFound(id) => ProjectServiceError::EmployeeNotFound(id),
            EmployeeServiceError::Database(e) => ProjectServiceError::Database(e),
            other => ProjectServiceError::CorruptRecord(other.to_string()),
        }
    }
}

impl TryFrom<project::Model> for Project {
    type Error = ProjectServiceError;

    fn try_from(model: project::Model) -> Result<Self, Self::Error> {
        let status = model.status.parse::<ProjectStatus>().map_err(|e| {
            ProjectServiceError::CorruptRecord(format!("project {}: {}", model.id, e))
        })?;
        let steps: Vec<Step> = serde_json::from_value(model.steps).map_err(|e| {
            ProjectServiceError::CorruptRecord(format!("project {} steps: {}", model.id, e))
        })?;
        Ok(Project {
            id: model.id,
            title: model.title,
            description: model.description,
            status,
            deadline: model.deadline,
            assignee: model.assignee_id,
            steps,
        })
    }
}

fn steps_to_json(project: &Project) -> Result<serde_json::Value, ProjectServiceError> {
    serde_json::to_value(&project.steps).map_err(|e| {
        ProjectServiceError::CorruptRecord(format!("project {} steps: {}", project.id, e))
    })
}

/// Projects embed their steps and tasks as one document. Every mutation is a
/// read, an in-memory change, a progress recompute and a write conditioned on
/// the version that was read.
pub struct ProjectService<'a> {
    db: &'a DatabaseConnection,
}

impl ProjectService<'_> {
    pub fn new(db: &DatabaseConnection) -> ProjectService<'_> {
        ProjectService { db }
    }

    /// Creates a project with its steps and tasks. Every task gets a fresh id.
    ///
    /// Only managers and team-leaders may create projects. Task assignees must
    /// exist and hold an assignable role.
    #[tracing::instrument(skip(self, new_project), fields(title = %new_project.title))]
    pub async fn create_project(
        &self,
        actor: &Actor,
        new_project: NewProject,
        now: DateTime<Utc>,
    ) -> Result<ProjectWithProgress, ProjectServiceError> {
        if !actor.role.is_elevated() {
            return Err(ProjectServiceError::Forbidden(actor.role, "create projects"));
        }
        if new_project.title.trim().is_empty() {
            return Err(ProjectServiceError::Invalid("title is required".to_string()));
        }

        let employees = EmployeeService::new(self.db);
        if let Some(assignee_id) = new_project.assignee_id {
            employees.get_employee(assignee_id).await?;
        }

        let mut steps = Vec::with_capacity(new_project.steps.len());
        for new_step in new_project.steps {
            let mut tasks = Vec::with_capacity(new_step.tasks.len());
            for new_task in new_step.tasks {
                if let Some(assignee_id) = new_task.assignee_id {
                    let assignee = employees.get_employee(assignee_id).await?;
                    if !assignee.role().is_assignable() {
                        return Err(ProjectServiceError::AssigneeIneligible {
                            assignee: assignee_id,
                            role: assignee.role(),
                        });
                    }
                }
                tasks.push(Task::new(new_task.title, new_task.assignee_id));
            }
            steps.push(Step::new(new_step.name, tasks));
        }

        let mut project = Project::new(
            0,
            new_project.title.trim().to_string(),
            new_project.description,
            new_project.deadline,
            new_project.assignee_id,
            steps,
        );

        let txn = self.db.begin().await?;
        let created_model = project::ActiveModel {
            title: ActiveValue::Set(project.title.clone()),
            description: ActiveValue::Set(project.description.clone()),
            status: ActiveValue::Set(project.status.to_string()),
            deadline: ActiveValue::Set(project.deadline),
            assignee_id: ActiveValue::Set(project.assignee),
            steps: ActiveValue::Set(steps_to_json(&project)?),
            version: ActiveValue::Set(0),
            created_at: ActiveValue::Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        project.id = created_model.id;

        let index_rows: Vec<task_index::ActiveModel> = project
            .tasks()
            .map(|task| task_index::ActiveModel {
                task_id: ActiveValue::Set(task.id.to_string()),
                project_id: ActiveValue::Set(project.id),
            })
            .collect();
        if !index_rows.is_empty() {
            task_index::Entity::insert_many(index_rows)
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;

        let summary = project.progress();
        tracing::info!(
            "Created project {} with {} tasks",
            project.id,
            summary.total_tasks
        );
        Ok(ProjectWithProgress { project, summary })
    }

    /// Reads a project and computes its progress.
    ///
    /// If every task is completed and the project is not yet, the completed
    /// status is persisted before returning.
    #[tracing::instrument(skip(self))]
    pub async fn get_project_with_progress(
        &self,
        project_id: ProjectId,
    ) -> Result<ProjectWithProgress, ProjectServiceError> {
        let (project, _) = self.load(project_id).await?;
        self.with_progress(project).await
    }

    /// Reads every project with its progress, ordered by ID.
    #[tracing::instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<ProjectWithProgress>, ProjectServiceError> {
        let models = project::Entity::find()
            .order_by_asc(project::Column::Id)
            .all(self.db)
            .await?;

        let mut projects = Vec::with_capacity(models.len());
        for model in models {
            projects.push(self.with_progress(Project::try_from(model)?).await?);
        }
        Ok(projects)
    }

    /// Changes a task's status on behalf of `actor` and recomputes progress.
    ///
    /// # Returns
    ///
    /// The project with its new progress, or `NotAssignee` when the actor is
    /// neither the assignee, the assignee's team-leader nor a manager.
    #[tracing::instrument(skip(self))]
    pub async fn set_task_status(
        &self,
        task_id: Uuid,
        new_status: TaskStatus,
        actor: &Actor,
    ) -> Result<TaskStatusUpdate, ProjectServiceError> {
        let project_id = self.project_for_task(task_id).await?;
        let authorization = self.authorization_context(project_id, task_id).await?;

        let project = self
            .update_project(project_id, |project| {
                authorization.check(project, task_id, actor)?;
                project.set_task_status(task_id, new_status)?;
                Ok(())
            })
            .await?;

        tracing::info!(
            "Task {} set to {} by employee {}; project {} is {}% complete",
            task_id,
            new_status,
            actor.id,
            project_id,
            project.progress()
        );
        Ok(TaskStatusUpdate {
            project,
            updated_task_id: task_id,
            new_status,
        })
    }

    /// Assigns a task to an employee, replacing any previous assignee.
    ///
    /// Only managers and team-leaders may assign tasks.
    #[tracing::instrument(skip(self))]
    pub async fn assign_task(
        &self,
        actor: &Actor,
        task_id: Uuid,
        assignee_id: EmployeeId,
    ) -> Result<Task, ProjectServiceError> {
        if !actor.role.is_elevated() {
            return Err(ProjectServiceError::Forbidden(actor.role, "assign tasks"));
        }
        let project_id = self.project_for_task(task_id).await?;
        let assignee = EmployeeService::new(self.db)
            .get_employee(assignee_id)
            .await?;

        let updated = self
            .update_project(project_id, |project| {
                project.assign_task(task_id, assignee.id(), assignee.role())?;
                Ok(())
            })
            .await?;

        tracing::info!("Task {} assigned to employee {}", task_id, assignee_id);
        updated
            .project
            .task(task_id)
            .cloned()
            .ok_or(ProjectServiceError::TaskNotFound(task_id))
    }

    /// Appends a comment to a task. Same authorization rule as status changes.
    #[tracing::instrument(skip(self, text, attachments))]
    pub async fn add_task_comment(
        &self,
        task_id: Uuid,
        actor: &Actor,
        text: String,
        attachments: Vec<String>,
        now: DateTime<Utc>,
    ) -> Result<Comment, ProjectServiceError> {
        if text.trim().is_empty() {
            return Err(ProjectServiceError::Invalid(
                "comment text is required".to_string(),
            ));
        }
        let project_id = self.project_for_task(task_id).await?;
        let authorization = self.authorization_context(project_id, task_id).await?;
        let comment = Comment::new(actor.id, text, attachments, now);

        self.update_project(project_id, |project| {
            authorization.check(project, task_id, actor)?;
            project.add_comment(task_id, comment.clone())?;
            Ok(())
        })
        .await?;

        Ok(comment)
    }

    /// Sets a project's status explicitly. Managers only.
    ///
    /// A project whose tasks are all completed stays completed.
    #[tracing::instrument(skip(self))]
    pub async fn set_project_status(
        &self,
        actor: &Actor,
        project_id: ProjectId,
        status: ProjectStatus,
    ) -> Result<ProjectWithProgress, ProjectServiceError> {
        if actor.role != Role::Manager {
            return Err(ProjectServiceError::Forbidden(
                actor.role,
                "change project status",
            ));
        }
        self.update_project(project_id, |project| {
            project.status = status;
            Ok(())
        })
        .await
    }

    /// Runs a read-modify-write cycle on a project, retrying when another
    /// writer bumped the version in between.
    async fn update_project<F>(
        &self,
        project_id: ProjectId,
        mut apply: F,
    ) -> Result<ProjectWithProgress, ProjectServiceError>
    where
        F: FnMut(&mut Project) -> Result<(), ProjectServiceError>,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (mut project, version) = self.load(project_id).await?;
            apply(&mut project)?;
            let summary = project.recompute_progress();

            if self.write(&project, version).await? {
                return Ok(ProjectWithProgress { project, summary });
            }
            tracing::warn!(
                "Project {} changed concurrently (attempt {} of {})",
                project_id,
                attempt,
                MAX_WRITE_ATTEMPTS
            );
        }
        Err(ProjectServiceError::Conflict(project_id))
    }

    async fn with_progress(
        &self,
        mut project: Project,
    ) -> Result<ProjectWithProgress, ProjectServiceError> {
        let stored_status = project.status;
        let summary = project.recompute_progress();
        if project.status == stored_status {
            return Ok(ProjectWithProgress { project, summary });
        }

        tracing::info!("Project {} completed, persisting status", project.id);
        self.update_project(project.id, |_| Ok(())).await
    }

    async fn load(&self, project_id: ProjectId) -> Result<(Project, i32), ProjectServiceError> {
        let model = project::Entity::find_by_id(project_id)
            .one(self.db)
            .await?
            .ok_or(ProjectServiceError::ProjectNotFound(project_id))?;
        let version = model.version;
        Ok((Project::try_from(model)?, version))
    }

    /// Writes the project if its stored version is still `version`.
    async fn write(&self, project: &Project, version: i32) -> Result<bool, ProjectServiceError> {
        let result = project::Entity::update_many()
            .col_expr(project::Column::Status, Expr::value(project.status.to_string()))
            .col_expr(project::Column::AssigneeId, Expr::value(project.assignee))
            .col_expr(project::Column::Steps, Expr::value(steps_to_json(project)?))
            .col_expr(project::Column::Version, Expr::value(version + 1))
            .filter(project::Column::Id.eq(project.id))
            .filter(project::Column::Version.eq(version))
            .exec(self.db)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn project_for_task(&self, task_id: Uuid) -> Result<ProjectId, ProjectServiceError> {
        task_index::Entity::find_by_id(task_id.to_string())
            .one(self.db)
            .await?
            .map(|row| row.project_id)
            .ok_or(ProjectServiceError::TaskNotFound(task_id))
    }

    /// Looks up who the task's current assignee reports to.
    async fn authorization_context(
        &self,
        project_id: ProjectId,
        task_id: Uuid,
    ) -> Result<TaskAuthorization, ProjectServiceError> {
        let (project, _) = self.load(project_id).await?;
        let assignee = project
            .task(task_id)
            .ok_or(ProjectServiceError::TaskNotFound(task_id))?
            .assignee;
        let reports_to = match assignee {
            Some(assignee_id) => employee::Entity::find_by_id(assignee_id)
                .one(self.db)
                .await?
                .and_then(|model| model.team_leader_id),
            None => None,
        };
        Ok(TaskAuthorization {
            assignee,
            reports_to,
        })
    }
}

/// Supervisor information captured before a write attempt.
struct TaskAuthorization {
    assignee: Option<EmployeeId>,
    reports_to: Option<EmployeeId>,
}

impl TaskAuthorization {
    fn check(
        &self,
        project: &Project,
        task_id: Uuid,
        actor: &Actor,
    ) -> Result<(), ProjectServiceError> {
        let task = project
            .task(task_id)
            .ok_or(ProjectServiceError::TaskNotFound(task_id))?;
        // A reassignment since the lookup voids the captured supervisor.
        let reports_to = if task.assignee == self.assignee {
            self.reports_to
        } else {
            None
        };
        task.ensure_actor_allowed(actor, reports_to)?;
        Ok(())
    }
}
