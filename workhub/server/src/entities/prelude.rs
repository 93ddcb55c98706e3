pub use super::employee::Entity as Employee;
pub use super::project::Entity as Project;
pub use super::punch_record::Entity as PunchRecord;
pub use super::task_index::Entity as TaskIndex;
