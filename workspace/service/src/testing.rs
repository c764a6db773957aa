//! Shared fixtures for the service tests.

use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};

use crate::account_service::NewAccount;
use crate::course_service::NewCourse;
use crate::password::{Argon2Hasher, CredentialHasher};
use crate::student_service::NewStudent;

/// Fresh in-memory SQLite database with every migration applied.
pub async fn setup_test_db() -> DatabaseConnection {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .try_init();

    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    db.execute_unprepared("PRAGMA foreign_keys = ON")
        .await
        .expect("Failed to enable foreign keys");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Argon2 with the smallest accepted costs, so tests stay fast in debug builds.
pub fn test_hasher() -> Arc<dyn CredentialHasher> {
    Arc::new(Argon2Hasher::with_costs(64, 1, 1).expect("valid argon2 params"))
}

pub fn new_student(id: &str) -> NewStudent {
    NewStudent {
        id: id.to_string(),
        name: "Ana".to_string(),
        last_name: "Pérez".to_string(),
        address: "Av. Amazonas 100".to_string(),
        phone: "0991234567".to_string(),
        course_id: None,
    }
}

pub fn new_course(code: &str) -> NewCourse {
    NewCourse {
        name: format!("Curso {code}"),
        description: None,
        code: code.to_string(),
    }
}

pub fn new_account(username: &str) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        password: format!("secret-{username}"),
        email: format!("{username}@example.com"),
        display_name: username.to_uppercase(),
    }
}
