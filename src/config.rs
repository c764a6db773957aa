use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, ensure};
use config::{Config, Environment, File};
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use service::{AccountService, Argon2Hasher, CourseService, CredentialHasher, StudentService};

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://alumnos.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
/// Thirty days.
pub const MAX_SESSION_IDLE_MINUTES: u64 = 30 * 24 * 60;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

/// Runtime settings.
///
/// Layered lowest to highest: built-in defaults, the configuration file,
/// `ALUMNOS_*` environment variables (`.env` included). CLI flags are applied on top
/// by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// Sessions unused for this long are dropped.
    pub session_idle_minutes: u64,
    pub request_timeout_secs: u64,
}

impl Settings {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match config_path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name("alumnos").required(false),
        };

        let settings = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("session_idle_minutes", 30_i64)?
            .set_default("request_timeout_secs", 30_i64)?
            .add_source(file)
            .add_source(Environment::with_prefix("ALUMNOS"))
            .build()?
            .try_deserialize::<Settings>()?;
        settings.validate()
    }

    fn validate(self) -> Result<Self> {
        ensure!(
            (1..=MAX_SESSION_IDLE_MINUTES).contains(&self.session_idle_minutes),
            "session_idle_minutes must be between 1 and {MAX_SESSION_IDLE_MINUTES}, got {}",
            self.session_idle_minutes
        );
        ensure!(
            (1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs),
            "request_timeout_secs must be between 1 and {MAX_REQUEST_TIMEOUT_SECS}, got {}",
            self.request_timeout_secs
        );
        Ok(self)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_minutes.saturating_mul(60))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Connects to the database and wires the services together.
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    tracing::info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url).await?;

    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::default());
    Ok(build_app_state(
        db,
        hasher,
        settings.session_idle(),
        settings.request_timeout(),
    ))
}

pub fn build_app_state(
    db: sea_orm::DatabaseConnection,
    hasher: Arc<dyn CredentialHasher>,
    session_idle: Duration,
    request_timeout: Duration,
) -> AppState {
    let sessions = Cache::builder()
        .max_capacity(10_000)
        .time_to_idle(session_idle)
        .build();

    AppState {
        students: StudentService::new(db.clone()),
        courses: CourseService::new(db.clone()),
        accounts: AccountService::new(db.clone(), hasher),
        db,
        sessions,
        request_timeout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let settings = Settings::load(None).unwrap();
        // Environment may override, but the defaults must deserialize
        assert!(!settings.database_url.is_empty());
        assert!(!settings.bind_address.is_empty());
        assert!(settings.session_idle_minutes > 0);
        assert_eq!(
            settings.session_idle(),
            Duration::from_secs(settings.session_idle_minutes * 60)
        );
    }

    fn settings(session_idle_minutes: u64, request_timeout_secs: u64) -> Settings {
        Settings {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            session_idle_minutes,
            request_timeout_secs,
        }
    }

    #[test]
    fn test_out_of_range_durations_are_rejected() {
        assert!(settings(30, 30).validate().is_ok());
        assert!(settings(MAX_SESSION_IDLE_MINUTES, MAX_REQUEST_TIMEOUT_SECS).validate().is_ok());

        let err = settings(u64::MAX, 30).validate().unwrap_err();
        assert!(err.to_string().contains("session_idle_minutes"));
        assert!(settings(0, 30).validate().is_err());
        assert!(settings(30, 0).validate().is_err());
        assert!(settings(30, u64::MAX).validate().is_err());

        assert_eq!(settings(u64::MAX, 30).session_idle(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        assert!(Settings::load(Some("/nonexistent/alumnos-config")).is_err());
    }
}
