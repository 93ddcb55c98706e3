use crate::auth::{hash_password, new_salt, verify_password};
use crate::entities::*;
use chrono::{DateTime, Utc};
use sea_orm::*;
use workhub_core::{EmployeeId, Presence, Role};

pub mod api;

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Employee {
    id: EmployeeId,
    name: String,
    email: String,
    role: Role,
    team_leader_id: Option<EmployeeId>,
}

impl Employee {
    pub fn new(
        id: EmployeeId,
        name: String,
        email: String,
        role: Role,
        team_leader_id: Option<EmployeeId>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            team_leader_id,
        }
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The team-leader this employee reports to, if any.
    pub fn team_leader_id(&self) -> Option<EmployeeId> {
        self.team_leader_id
    }
}

impl TryFrom<employee::Model> for Employee {
    type Error = EmployeeServiceError;

    fn try_from(model: employee::Model) -> Result<Self, Self::Error> {
        let role = model.role.parse::<Role>().map_err(|e| {
            EmployeeServiceError::CorruptRecord(format!("employee {}: {}", model.id, e))
        })?;
        Ok(Employee::new(
            model.id,
            model.name,
            model.email,
            role,
            model.team_leader_id,
        ))
    }
}

/// Details needed to register an employee account.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub team_leader_id: Option<EmployeeId>,
}

/// Error type for EmployeeService operations.
#[derive(Debug, thiserror::Error)]
pub enum EmployeeServiceError {
    #[error("Employee with ID {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("An employee with email '{0}' already exists")]
    EmailTaken(String),
    #[error("Employee {0} is not a team-leader")]
    InvalidTeamLeader(EmployeeId),
    #[error("Invalid employee details: {0}")]
    Invalid(String),
    #[error("Stored employee record is corrupt: {0}")]
    CorruptRecord(String),
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

pub struct EmployeeService<'a> {
    db: &'a DatabaseConnection,
}

impl EmployeeService<'_> {
    pub fn new(db: &DatabaseConnection) -> EmployeeService<'_> {
        EmployeeService { db }
    }

    /// Registers a new employee.
    ///
    /// # Arguments
    ///
    /// * `new_employee` - The account details; the password is stored salted and hashed.
    /// * `now` - Registration time.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Employee`, or `EmailTaken` if the
    /// email is already registered.
    #[tracing::instrument(skip(self, new_employee), fields(email = %new_employee.email, role = %new_employee.role))]
    pub async fn register(
        &self,
        new_employee: NewEmployee,
        now: DateTime<Utc>,
    ) -> Result<Employee, EmployeeServiceError> {
        let email = new_employee.email.trim().to_lowercase();
        if new_employee.name.trim().is_empty() || email.is_empty() {
            return Err(EmployeeServiceError::Invalid(
                "name and email are required".to_string(),
            ));
        }
        if new_employee.password.is_empty() {
            return Err(EmployeeServiceError::Invalid(
                "password must not be empty".to_string(),
            ));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(EmployeeServiceError::EmailTaken(email));
        }
        if let Some(leader_id) = new_employee.team_leader_id {
            let leader = self.get_employee(leader_id).await.map_err(|e| match e {
                EmployeeServiceError::EmployeeNotFound(id) => {
                    EmployeeServiceError::InvalidTeamLeader(id)
                }
                other => other,
            })?;
            if leader.role() != Role::TeamLeader {
                return Err(EmployeeServiceError::InvalidTeamLeader(leader_id));
            }
        }

        let salt = new_salt();
        let active_model = employee::ActiveModel {
            name: ActiveValue::Set(new_employee.name.trim().to_string()),
            email: ActiveValue::Set(email.clone()),
            password_hash: ActiveValue::Set(hash_password(&new_employee.password, &salt)),
            password_salt: ActiveValue::Set(salt),
            role: ActiveValue::Set(new_employee.role.to_string()),
            team_leader_id: ActiveValue::Set(new_employee.team_leader_id),
            presence: ActiveValue::Set(Presence::Offline.to_string()),
            created_at: ActiveValue::Set(now),
            ..Default::default()
        };
        let created_model = active_model.insert(self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                EmployeeServiceError::EmailTaken(email.clone())
            } else {
                EmployeeServiceError::Database(e)
            }
        })?;
        tracing::info!("Registered employee {}", created_model.id);
        Employee::try_from(created_model)
    }

    /// Creates the bootstrap manager account unless its email is already registered.
    #[tracing::instrument(skip(self, password))]
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Employee, EmployeeServiceError> {
        if let Some(existing) = self.find_by_email(email).await? {
            return Ok(existing);
        }
        self.register(
            NewEmployee {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                role: Role::Manager,
                team_leader_id: None,
            },
            now,
        )
        .await
    }

    /// Checks an email and password pair.
    ///
    /// # Returns
    ///
    /// `Some(Employee)` when the credentials match, `None` otherwise.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Employee>, EmployeeServiceError> {
        let email = email.trim().to_lowercase();
        let Some(model) = employee::Entity::find()
            .filter(employee::Column::Email.eq(email))
            .one(self.db)
            .await?
        else {
            return Ok(None);
        };

        if verify_password(password, &model.password_salt, &model.password_hash) {
            Employee::try_from(model).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Retrieves an employee by ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_employee(&self, id: EmployeeId) -> Result<Employee, EmployeeServiceError> {
        let model = employee::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or(EmployeeServiceError::EmployeeNotFound(id))?;
        Employee::try_from(model)
    }

    /// Retrieves all employees ordered by ID.
    #[tracing::instrument(skip(self))]
    pub async fn list_employees(&self) -> Result<Vec<Employee>, EmployeeServiceError> {
        employee::Entity::find()
            .order_by_asc(employee::Column::Id)
            .all(self.db)
            .await?
            .into_iter()
            .map(Employee::try_from)
            .collect()
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, EmployeeServiceError> {
        let email = email.trim().to_lowercase();
        employee::Entity::find()
            .filter(employee::Column::Email.eq(email))
            .one(self.db)
            .await?
            .map(Employee::try_from)
            .transpose()
    }
}
