use crate::clock::WorkdayPolicy;
use crate::employee::{EmployeeId, Presence};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Classification of a day's attendance, decided once at punch-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Absent => "Absent",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttendanceStatus {
    type Err = AttendanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Present" => Ok(AttendanceStatus::Present),
            "Late" => Ok(AttendanceStatus::Late),
            "Absent" => Ok(AttendanceStatus::Absent),
            other => Err(AttendanceError::UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttendanceError {
    #[error("Already punched in for today")]
    AlreadyPunchedIn,
    #[error("No active punch-in found for today")]
    NoActivePunch,
    #[error("Unknown attendance status '{0}'")]
    UnknownStatus(String),
}

/// Where an employee stands for a given business day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchState {
    NotPunched,
    PunchedIn,
    PunchedOut,
}

impl PunchState {
    pub fn of(record: Option<&PunchRecord>) -> Self {
        match record {
            None => PunchState::NotPunched,
            Some(record) if record.punch_out.is_none() => PunchState::PunchedIn,
            Some(_) => PunchState::PunchedOut,
        }
    }

    pub fn presence(&self) -> Presence {
        match self {
            PunchState::PunchedIn => Presence::Online,
            PunchState::NotPunched | PunchState::PunchedOut => Presence::Offline,
        }
    }
}

/// One employee's attendance for one business day.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PunchRecord {
    pub employee_id: EmployeeId,
    pub day: NaiveDate,
    pub punch_in: DateTime<Utc>,
    pub punch_out: Option<DateTime<Utc>>,
    pub hours_worked: f64,
    pub status: AttendanceStatus,
}

impl PunchRecord {
    /// Starts a shift for `employee_id` at `now`.
    ///
    /// `today` is the record already stored for the employee's current business
    /// day, if any. Any existing record blocks a second punch-in, including one
    /// that has already been punched out.
    pub fn punch_in(
        policy: &WorkdayPolicy,
        employee_id: EmployeeId,
        today: Option<&PunchRecord>,
        now: DateTime<Utc>,
    ) -> Result<Self, AttendanceError> {
        if today.is_some() {
            return Err(AttendanceError::AlreadyPunchedIn);
        }

        let status = if policy.is_late(now) {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        };

        Ok(Self {
            employee_id,
            day: policy.business_day(now),
            punch_in: now,
            punch_out: None,
            hours_worked: 0.0,
            status,
        })
    }

    /// Ends the shift recorded in `today`. This is the record's last transition.
    pub fn punch_out(today: Option<Self>, now: DateTime<Utc>) -> Result<Self, AttendanceError> {
        let mut record = today.ok_or(AttendanceError::NoActivePunch)?;
        if record.punch_out.is_some() {
            return Err(AttendanceError::NoActivePunch);
        }

        record.punch_out = Some(now);
        record.hours_worked = hours_between(record.punch_in, now);
        Ok(record)
    }

    pub fn state(&self) -> PunchState {
        PunchState::of(Some(self))
    }
}

/// Elapsed hours rounded to two decimal places. Never negative.
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let millis = (end - start).num_milliseconds().max(0) as f64;
    (millis / 3_600_000.0 * 100.0).round() / 100.0
}
