pub mod prelude;

pub mod employee;
pub mod project;
pub mod punch_record;
pub mod task_index;
