use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const FK_PUNCH_RECORD_TO_EMPLOYEE: &str = "fk-punch_record-employee_id";
const IDX_EMPLOYEE_DAY_UNIQUE: &str = "punch_record_employee_id_day_unique";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PunchRecord::Table)
                    .if_not_exists()
                    .col(pk_auto(PunchRecord::Id))
                    .col(integer(PunchRecord::EmployeeId))
                    .col(date(PunchRecord::Day))
                    .col(timestamp_with_time_zone(PunchRecord::PunchIn))
                    .col(timestamp_with_time_zone_null(PunchRecord::PunchOut))
                    .col(double(PunchRecord::HoursWorked))
                    .col(string(PunchRecord::Status))
                    .foreign_key(
                        ForeignKey::create()
                            .name(FK_PUNCH_RECORD_TO_EMPLOYEE)
                            .from(PunchRecord::Table, PunchRecord::EmployeeId)
                            .to(Employee::Table, Employee::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one record per employee per business day.
        manager
            .create_index(
                Index::create()
                    .name(IDX_EMPLOYEE_DAY_UNIQUE)
                    .table(PunchRecord::Table)
                    .col(PunchRecord::EmployeeId)
                    .col(PunchRecord::Day)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_EMPLOYEE_DAY_UNIQUE)
                    .table(PunchRecord::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(PunchRecord::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PunchRecord {
    Table,
    Id,
    EmployeeId,
    Day,
    PunchIn,
    PunchOut,
    HoursWorked,
    Status,
}

#[derive(DeriveIden)]
enum Employee {
    Table,
    Id,
}
