//! Core domain models and business rules for Workhub: the business-day clock,
//! the attendance punch state machine and project progress aggregation.
pub mod attendance;
pub mod clock;
pub mod employee;
pub mod project;

pub use attendance::{AttendanceError, AttendanceStatus, PunchRecord, PunchState};
pub use clock::{Clock, PolicyError, SystemClock, WorkdayPolicy};
pub use employee::{Actor, EmployeeId, Presence, Role, UnknownPresence, UnknownRole};
pub use project::{
    Comment, ProgressSummary, Project, ProjectId, ProjectStatus, Step, Task, TaskError, TaskStatus,
};
