use crate::entities::*;
use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use std::collections::HashSet;
use workhub_core::{
    AttendanceError, AttendanceStatus, Clock, EmployeeId, Presence, PunchRecord, PunchState,
    WorkdayPolicy,
};

pub mod api;

/// Longest history window a caller may request, in days.
pub const MAX_HISTORY_DAYS: u32 = 366;

/// Today's record plus the recent history it belongs to, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceSummary {
    pub today: Option<PunchRecord>,
    pub history: Vec<PunchRecord>,
}

/// Error type for AttendanceService operations.
#[derive(Debug, thiserror::Error)]
pub enum AttendanceServiceError {
    #[error("Already punched in for today")]
    AlreadyPunchedIn,
    #[error("No active punch-in found for today")]
    NoActivePunch,
    #[error("Employee with ID {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("Stored punch record is corrupt: {0}")]
    CorruptRecord(String),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl From<AttendanceError> for AttendanceServiceError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::AlreadyPunchedIn => AttendanceServiceError::AlreadyPunchedIn,
            AttendanceError::NoActivePunch => AttendanceServiceError::NoActivePunch,
            AttendanceError::UnknownStatus(status) => {
                AttendanceServiceError::CorruptRecord(format!("unknown status '{}'", status))
            }
        }
    }
}

impl TryFrom<punch_record::Model> for PunchRecord {
    type Error = AttendanceServiceError;

    fn try_from(model: punch_record::Model) -> Result<Self, Self::Error> {
        Ok(PunchRecord {
            employee_id: model.employee_id,
            day: model.day,
            punch_in: model.punch_in,
            punch_out: model.punch_out,
            hours_worked: model.hours_worked,
            status: model.status.parse::<AttendanceStatus>()?,
        })
    }
}

/// Punch-in/punch-out operations for the current business day.
///
/// Every "today" is derived from the clock through the workday policy.
pub struct AttendanceService<'a> {
    db: &'a DatabaseConnection,
    clock: &'a dyn Clock,
    policy: &'a WorkdayPolicy,
}

impl<'a> AttendanceService<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        clock: &'a dyn Clock,
        policy: &'a WorkdayPolicy,
    ) -> Self {
        Self { db, clock, policy }
    }

    /// Starts today's shift for an employee.
    ///
    /// # Returns
    ///
    /// The created `PunchRecord`, or `AlreadyPunchedIn` if a record for today
    /// exists. A concurrent insert that loses on the (employee, day) unique
    /// index reports the same error.
    #[tracing::instrument(skip(self))]
    pub async fn punch_in(
        &self,
        employee_id: EmployeeId,
    ) -> Result<PunchRecord, AttendanceServiceError> {
        self.ensure_employee_exists(employee_id).await?;

        let now = self.clock.now();
        let today = self.policy.business_day(now);
        let existing = self.find_record(employee_id, today).await?;
        let record = PunchRecord::punch_in(self.policy, employee_id, existing.as_ref(), now)?;

        let active_model = punch_record::ActiveModel {
            employee_id: ActiveValue::Set(record.employee_id),
            day: ActiveValue::Set(record.day),
            punch_in: ActiveValue::Set(record.punch_in),
            punch_out: ActiveValue::Set(None),
            hours_worked: ActiveValue::Set(record.hours_worked),
            status: ActiveValue::Set(record.status.to_string()),
            ..Default::default()
        };
        let txn = self.db.begin().await?;
        active_model.insert(&txn).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AttendanceServiceError::AlreadyPunchedIn
            } else {
                AttendanceServiceError::Database(e)
            }
        })?;
        store_presence(&txn, employee_id, Presence::Online).await?;
        txn.commit().await?;

        tracing::info!(
            "Employee {} punched in on {} ({})",
            employee_id,
            record.day,
            record.status
        );
        Ok(record)
    }

    /// Ends today's shift for an employee and records the hours worked.
    ///
    /// # Returns
    ///
    /// The completed `PunchRecord`, or `NoActivePunch` if the employee has not
    /// punched in today or has already punched out.
    #[tracing::instrument(skip(self))]
    pub async fn punch_out(
        &self,
        employee_id: EmployeeId,
    ) -> Result<PunchRecord, AttendanceServiceError> {
        let now = self.clock.now();
        let today = self.policy.business_day(now);
        let existing = self.find_record(employee_id, today).await?;
        let record = PunchRecord::punch_out(existing, now)?;

        let txn = self.db.begin().await?;
        // The punch_out IS NULL guard makes the transition happen at most once.
        let result = punch_record::Entity::update_many()
            .col_expr(punch_record::Column::PunchOut, Expr::value(now))
            .col_expr(
                punch_record::Column::HoursWorked,
                Expr::value(record.hours_worked),
            )
            .filter(punch_record::Column::EmployeeId.eq(employee_id))
            .filter(punch_record::Column::Day.eq(today))
            .filter(punch_record::Column::PunchOut.is_null())
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AttendanceServiceError::NoActivePunch);
        }
        store_presence(&txn, employee_id, Presence::Offline).await?;
        txn.commit().await?;

        tracing::info!(
            "Employee {} punched out on {} after {} hours",
            employee_id,
            record.day,
            record.hours_worked
        );
        Ok(record)
    }

    /// Returns today's record and the records of the last `days` business days.
    ///
    /// `days` is clamped to `1..=MAX_HISTORY_DAYS`.
    #[tracing::instrument(skip(self))]
    pub async fn get_attendance(
        &self,
        employee_id: EmployeeId,
        days: u32,
    ) -> Result<AttendanceSummary, AttendanceServiceError> {
        self.ensure_employee_exists(employee_id).await?;

        let now = self.clock.now();
        let today = self.policy.business_day(now);
        let since = self
            .policy
            .window_start(now, days.clamp(1, MAX_HISTORY_DAYS));

        let history = punch_record::Entity::find()
            .filter(punch_record::Column::EmployeeId.eq(employee_id))
            .filter(punch_record::Column::Day.gte(since))
            .filter(punch_record::Column::Day.lte(today))
            .order_by_desc(punch_record::Column::Day)
            .all(self.db)
            .await?
            .into_iter()
            .map(PunchRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let today = history.iter().find(|record| record.day == today).cloned();

        Ok(AttendanceSummary { today, history })
    }

    /// Presence derived from today's punch record.
    #[tracing::instrument(skip(self))]
    pub async fn presence(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Presence, AttendanceServiceError> {
        let today = self.policy.business_day(self.clock.now());
        let record = self.find_record(employee_id, today).await?;
        Ok(PunchState::of(record.as_ref()).presence())
    }

    /// IDs of every employee currently on shift today.
    #[tracing::instrument(skip(self))]
    pub async fn on_shift_today(&self) -> Result<HashSet<EmployeeId>, AttendanceServiceError> {
        let today = self.policy.business_day(self.clock.now());
        let on_shift = punch_record::Entity::find()
            .filter(punch_record::Column::Day.eq(today))
            .filter(punch_record::Column::PunchOut.is_null())
            .all(self.db)
            .await?
            .into_iter()
            .map(|model| model.employee_id)
            .collect();
        Ok(on_shift)
    }

    async fn find_record(
        &self,
        employee_id: EmployeeId,
        day: NaiveDate,
    ) -> Result<Option<PunchRecord>, AttendanceServiceError> {
        punch_record::Entity::find()
            .filter(punch_record::Column::EmployeeId.eq(employee_id))
            .filter(punch_record::Column::Day.eq(day))
            .one(self.db)
            .await?
            .map(PunchRecord::try_from)
            .transpose()
    }

    async fn ensure_employee_exists(
        &self,
        employee_id: EmployeeId,
    ) -> Result<(), AttendanceServiceError> {
        employee::Entity::find_by_id(employee_id)
            .one(self.db)
            .await?
            .map(|_| ())
            .ok_or(AttendanceServiceError::EmployeeNotFound(employee_id))
    }
}

/// Rewrites the cached presence column.
async fn store_presence<C: ConnectionTrait>(
    db: &C,
    employee_id: EmployeeId,
    presence: Presence,
) -> Result<(), AttendanceServiceError> {
    employee::Entity::update_many()
        .col_expr(employee::Column::Presence, Expr::value(presence.to_string()))
        .filter(employee::Column::Id.eq(employee_id))
        .exec(db)
        .await?;
    Ok(())
}
