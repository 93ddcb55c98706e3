use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub type EmployeeId = i32;

/// Job role carried by every employee account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Role {
    Manager,
    TeamLeader,
    Developer,
    Designer,
    Employee,
    Business,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Manager,
        Role::TeamLeader,
        Role::Developer,
        Role::Designer,
        Role::Employee,
        Role::Business,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::TeamLeader => "team-leader",
            Role::Developer => "developer",
            Role::Designer => "designer",
            Role::Employee => "employee",
            Role::Business => "business",
        }
    }

    /// Roles allowed to act on tasks on behalf of other employees.
    pub fn is_elevated(&self) -> bool {
        matches!(self, Role::Manager | Role::TeamLeader)
    }

    /// Roles that may be the assignee of a task.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Role::Employee | Role::Developer | Role::Designer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Whether an employee is currently on shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Presence {
    Online,
    Offline,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown presence '{0}'")]
pub struct UnknownPresence(pub String);

impl Presence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Presence::Online => "online",
            Presence::Offline => "offline",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Presence {
    type Err = UnknownPresence;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Presence::Online),
            "offline" => Ok(Presence::Offline),
            other => Err(UnknownPresence(other.to_string())),
        }
    }
}

/// The authenticated identity performing an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: EmployeeId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: EmployeeId, role: Role) -> Self {
        Self { id, role }
    }
}
