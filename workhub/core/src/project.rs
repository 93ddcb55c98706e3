use crate::employee::{Actor, EmployeeId, Role};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub type ProjectId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ProjectStatus {
    Pending,
    Active,
    Assigned,
    Completed,
    OnHold,
    Cancelled,
    Scheduled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 7] = [
        ProjectStatus::Pending,
        ProjectStatus::Active,
        ProjectStatus::Assigned,
        ProjectStatus::Completed,
        ProjectStatus::OnHold,
        ProjectStatus::Cancelled,
        ProjectStatus::Scheduled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::Active => "active",
            ProjectStatus::Assigned => "assigned",
            ProjectStatus::Completed => "completed",
            ProjectStatus::OnHold => "on-hold",
            ProjectStatus::Cancelled => "cancelled",
            ProjectStatus::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TaskError::UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(TaskError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),
    #[error("Only the task's assignee or their supervisor can update this task")]
    NotAssignee,
    #[error("Employee {assignee} has role '{role}' which cannot be assigned tasks")]
    AssigneeIneligible { assignee: EmployeeId, role: Role },
    #[error("Unknown status '{0}'")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Comment {
    pub id: Uuid,
    pub author: EmployeeId,
    pub text: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        author: EmployeeId,
        text: String,
        attachments: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            text,
            attachments,
            created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub assignee: Option<EmployeeId>,
    pub status: TaskStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub comments: Vec<Comment>,
}

impl Task {
    /// Creates a pending task with a fresh, globally unique id.
    pub fn new(title: String, assignee: Option<EmployeeId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            assignee,
            status: TaskStatus::Pending,
            comments: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Checks whether `actor` may change this task.
    ///
    /// `reports_to` is the team-leader of the task's current assignee. Managers
    /// may act on any task, team-leaders on tasks of their reports or on
    /// unassigned tasks, everyone else only on tasks assigned to them.
    pub fn ensure_actor_allowed(
        &self,
        actor: &Actor,
        reports_to: Option<EmployeeId>,
    ) -> Result<(), TaskError> {
        let allowed = match (actor.role, self.assignee) {
            (Role::Manager, _) => true,
            (_, Some(assignee)) if assignee == actor.id => true,
            (Role::TeamLeader, None) => true,
            (Role::TeamLeader, Some(_)) => reports_to == Some(actor.id),
            _ => false,
        };

        if allowed {
            Ok(())
        } else {
            Err(TaskError::NotAssignee)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Step {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tasks: Vec<Task>,
}

impl Step {
    pub fn new(name: String, tasks: Vec<Task>) -> Self {
        Self { name, tasks }
    }
}

/// Task counts and the completion percentage derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub progress: u8,
}

impl ProgressSummary {
    pub fn is_finished(&self) -> bool {
        self.total_tasks > 0 && self.completed_tasks == self.total_tasks
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    pub deadline: Option<NaiveDate>,
    pub assignee: Option<EmployeeId>,
    pub steps: Vec<Step>,
}

impl Project {
    /// Creates a project. It starts `assigned` when it has a primary assignee
    /// and `pending` otherwise.
    pub fn new(
        id: ProjectId,
        title: String,
        description: String,
        deadline: Option<NaiveDate>,
        assignee: Option<EmployeeId>,
        steps: Vec<Step>,
    ) -> Self {
        let status = if assignee.is_some() {
            ProjectStatus::Assigned
        } else {
            ProjectStatus::Pending
        };
        Self {
            id,
            title,
            description,
            status,
            deadline,
            assignee,
            steps,
        }
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.steps.iter().flat_map(|step| step.tasks.iter())
    }

    pub fn task(&self, task_id: Uuid) -> Option<&Task> {
        self.tasks().find(|task| task.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: Uuid) -> Result<&mut Task, TaskError> {
        self.steps
            .iter_mut()
            .flat_map(|step| step.tasks.iter_mut())
            .find(|task| task.id == task_id)
            .ok_or(TaskError::TaskNotFound(task_id))
    }

    /// Completion percentage over every task of every step. Has no side effects.
    pub fn progress(&self) -> ProgressSummary {
        let total_tasks = self.tasks().count();
        let completed_tasks = self.tasks().filter(|task| task.is_completed()).count();
        let progress = if total_tasks == 0 {
            0
        } else {
            (100.0 * completed_tasks as f64 / total_tasks as f64).round() as u8
        };

        ProgressSummary {
            total_tasks,
            completed_tasks,
            progress,
        }
    }

    /// Recomputes progress and marks the project completed once every task is.
    ///
    /// Completion is one-way: reopening a task lowers the progress but leaves
    /// a completed project completed.
    pub fn recompute_progress(&mut self) -> ProgressSummary {
        let summary = self.progress();
        if summary.is_finished() && self.status != ProjectStatus::Completed {
            self.status = ProjectStatus::Completed;
        }
        summary
    }

    /// Sets a task's status and recomputes the project's progress.
    pub fn set_task_status(
        &mut self,
        task_id: Uuid,
        status: TaskStatus,
    ) -> Result<ProgressSummary, TaskError> {
        self.task_mut(task_id)?.status = status;
        Ok(self.recompute_progress())
    }

    /// Overwrites a task's assignee after checking the assignee's role.
    pub fn assign_task(
        &mut self,
        task_id: Uuid,
        assignee: EmployeeId,
        role: Role,
    ) -> Result<&Task, TaskError> {
        if !role.is_assignable() {
            return Err(TaskError::AssigneeIneligible { assignee, role });
        }
        let task = self.task_mut(task_id)?;
        task.assignee = Some(assignee);
        Ok(task)
    }

    pub fn add_comment(&mut self, task_id: Uuid, comment: Comment) -> Result<&Comment, TaskError> {
        let task = self.task_mut(task_id)?;
        task.comments.push(comment);
        task.comments
            .last()
            .ok_or(TaskError::TaskNotFound(task_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_tasks(per_step: &[usize]) -> Project {
        let steps = per_step
            .iter()
            .enumerate()
            .map(|(i, &count)| {
                let tasks = (0..count)
                    .map(|t| Task::new(format!("Task {}.{}", i + 1, t + 1), Some(10)))
                    .collect();
                Step::new(format!("Step {}", i + 1), tasks)
            })
            .collect();
        Project::new(1, "Website".to_string(), String::new(), None, None, steps)
    }

    fn task_ids(project: &Project) -> Vec<Uuid> {
        project.tasks().map(|task| task.id).collect()
    }

    #[test]
    fn empty_project_has_zero_progress_and_keeps_status() {
        let mut project = project_with_tasks(&[]);
        let summary = project.recompute_progress();

        assert_eq!(
            summary,
            ProgressSummary {
                total_tasks: 0,
                completed_tasks: 0,
                progress: 0
            }
        );
        assert_eq!(project.status, ProjectStatus::Pending);
    }

    #[test]
    fn can_complete_project_when_last_task_completes() {
        let mut project = project_with_tasks(&[2, 2]);
        let ids = task_ids(&project);

        for id in &ids[..3] {
            project.set_task_status(*id, TaskStatus::Completed).unwrap();
        }
        assert_eq!(project.progress().progress, 75);
        assert_eq!(project.status, ProjectStatus::Pending);

        let summary = project.set_task_status(ids[3], TaskStatus::Completed).unwrap();
        assert_eq!(summary.progress, 100);
        assert_eq!(project.status, ProjectStatus::Completed);
    }

    #[test]
    fn completion_is_one_way() {
        let mut project = project_with_tasks(&[1]);
        let id = task_ids(&project)[0];
        project.set_task_status(id, TaskStatus::Completed).unwrap();

        let summary = project.set_task_status(id, TaskStatus::InProgress).unwrap();

        assert_eq!(summary.progress, 0);
        assert_eq!(project.status, ProjectStatus::Completed);
    }

    #[test]
    fn progress_rounds_to_nearest_integer() {
        let mut project = project_with_tasks(&[3]);
        let ids = task_ids(&project);
        project.set_task_status(ids[0], TaskStatus::Completed).unwrap();
        assert_eq!(project.progress().progress, 33);

        project.set_task_status(ids[1], TaskStatus::Completed).unwrap();
        assert_eq!(project.progress().progress, 67);
    }

    #[test]
    fn recomputing_is_idempotent() {
        let mut project = project_with_tasks(&[2, 1]);
        let id = task_ids(&project)[0];
        project.set_task_status(id, TaskStatus::Completed).unwrap();

        let first = project.recompute_progress();
        let second = project.recompute_progress();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_task_is_reported() {
        let mut project = project_with_tasks(&[1]);
        let missing = Uuid::new_v4();
        assert_eq!(
            project.set_task_status(missing, TaskStatus::Completed),
            Err(TaskError::TaskNotFound(missing))
        );
    }

    #[test]
    fn can_assign_task_to_eligible_roles_only() {
        let mut project = project_with_tasks(&[1]);
        let id = task_ids(&project)[0];

        let task = project.assign_task(id, 42, Role::Designer).unwrap();
        assert_eq!(task.assignee, Some(42));

        assert_eq!(
            project.assign_task(id, 43, Role::Business),
            Err(TaskError::AssigneeIneligible {
                assignee: 43,
                role: Role::Business
            })
        );
        assert_eq!(project.task(id).unwrap().assignee, Some(42));
    }

    #[test]
    fn only_assignee_or_supervisor_may_act() {
        let task = Task::new("Design".to_string(), Some(10));

        assert!(task.ensure_actor_allowed(&Actor::new(10, Role::Developer), None).is_ok());
        assert_eq!(
            task.ensure_actor_allowed(&Actor::new(11, Role::Developer), None),
            Err(TaskError::NotAssignee)
        );
        assert!(task.ensure_actor_allowed(&Actor::new(1, Role::Manager), None).is_ok());
        assert!(task.ensure_actor_allowed(&Actor::new(5, Role::TeamLeader), Some(5)).is_ok());
        assert_eq!(
            task.ensure_actor_allowed(&Actor::new(6, Role::TeamLeader), Some(5)),
            Err(TaskError::NotAssignee)
        );
    }

    #[test]
    fn can_add_comment_to_task() {
        let mut project = project_with_tasks(&[1]);
        let id = task_ids(&project)[0];
        let comment = Comment::new(10, "Done?".to_string(), vec![], Utc::now());

        let added = project.add_comment(id, comment.clone()).unwrap();
        assert_eq!(added, &comment);
        assert_eq!(project.task(id).unwrap().comments.len(), 1);
    }

    #[test]
    fn can_parse_statuses() {
        for status in ProjectStatus::ALL {
            assert_eq!(status.as_str().parse::<ProjectStatus>(), Ok(status));
        }
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!(
            "done".parse::<TaskStatus>(),
            Err(TaskError::UnknownStatus("done".to_string()))
        );
    }
}
