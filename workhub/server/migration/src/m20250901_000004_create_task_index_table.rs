use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_TASK_INDEX_TO_PROJECT: &str = "fk-task_index-project_id";
const IDX_TASK_INDEX_PROJECT: &str = "idx_task_index_project_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TaskIndex::Table)
                    .if_not_exists()
                    .col(string(TaskIndex::TaskId).primary_key())
                    .col(integer(TaskIndex::ProjectId))
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_TASK_INDEX_TO_PROJECT)
                            .from(TaskIndex::Table, TaskIndex::ProjectId)
                            .to(Project::Table, Project::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_TASK_INDEX_PROJECT)
                    .table(TaskIndex::Table)
                    .col(TaskIndex::ProjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TaskIndex::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TaskIndex {
    Table,
    TaskId,
    ProjectId,
}

#[derive(DeriveIden)]
enum Project {
    Table,
    Id,
}
