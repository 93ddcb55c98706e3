pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_employee_table;
mod m20250901_000002_create_punch_record_table;
mod m20250901_000003_create_project_table;
mod m20250901_000004_create_task_index_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_employee_table::Migration),
            Box::new(m20250901_000002_create_punch_record_table::Migration),
            Box::new(m20250901_000003_create_project_table::Migration),
            Box::new(m20250901_000004_create_task_index_table::Migration),
        ]
    }
}
