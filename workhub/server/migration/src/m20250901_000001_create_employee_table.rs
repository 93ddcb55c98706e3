use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employee::Table)
                    .if_not_exists()
                    .col(pk_auto(Employee::Id))
                    .col(string(Employee::Name))
                    .col(string_uniq(Employee::Email))
                    .col(string(Employee::PasswordHash))
                    .col(string(Employee::PasswordSalt))
                    .col(string(Employee::Role))
                    .col(integer_null(Employee::TeamLeaderId))
                    .col(string(Employee::Presence))
                    .col(timestamp_with_time_zone(Employee::CreatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employee::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Employee {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    PasswordSalt,
    Role,
    TeamLeaderId,
    Presence,
    CreatedAt,
}
