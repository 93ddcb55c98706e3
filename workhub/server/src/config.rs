use serde::Deserialize;
use workhub_core::{PolicyError, WorkdayPolicy};

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub db_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub jwt_secret: String,
    /// Manager account created at start-up when no employee has this email.
    pub admin_email: String,
    pub admin_password: String,
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
    /// Business timezone as minutes east of UTC.
    #[serde(default = "default_utc_offset_minutes")]
    pub business_utc_offset_minutes: i32,
    /// Local clock time (HH:MM) from which a punch-in counts as late.
    #[serde(default = "default_late_after")]
    pub late_after: String,
    #[serde(default = "default_attendance_history_days")]
    pub attendance_history_days: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    pub fn workday_policy(&self) -> Result<WorkdayPolicy, PolicyError> {
        WorkdayPolicy::parse(self.business_utc_offset_minutes, &self.late_after)
    }
}

fn default_port() -> u16 {
    8080
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

fn default_utc_offset_minutes() -> i32 {
    330
}

fn default_late_after() -> String {
    "09:00".to_string()
}

fn default_attendance_history_days() -> u32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_apply_defaults_for_optional_settings() {
        let settings = config::Config::builder()
            .set_override("db_url", "sqlite::memory:")
            .unwrap()
            .set_override("jwt_secret", "secret")
            .unwrap()
            .set_override("admin_email", "admin@example.com")
            .unwrap()
            .set_override("admin_password", "password")
            .unwrap()
            .build()
            .unwrap();

        let config: Config = settings.try_deserialize().unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.business_utc_offset_minutes, 330);
        assert_eq!(config.late_after, "09:00");
        assert_eq!(config.attendance_history_days, 30);
        assert!(config.workday_policy().is_ok());
    }
}
