use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::debug;

/// Error types for the student administration core
#[derive(Error, Debug)]
pub enum ServiceError {
    /// A referenced student, course or account does not exist
    #[error("{message}")]
    NotFound {
        entity: &'static str,
        message: String,
    },

    /// A create would break a uniqueness rule; `field` names the colliding field
    #[error("{message}")]
    DuplicateKey {
        field: &'static str,
        message: String,
    },

    /// Input that can never describe a valid record
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Error from the password hashing primitive
    #[error("Password hashing error: {0}")]
    Hashing(String),
}

impl ServiceError {
    pub fn student_not_found(id: &str) -> Self {
        ServiceError::NotFound {
            entity: "student",
            message: format!("Student not found with id: {id}"),
        }
    }

    pub fn course_not_found(id: i32) -> Self {
        ServiceError::NotFound {
            entity: "course",
            message: format!("Course not found with id: {id}"),
        }
    }

    pub fn unknown_user(username: &str) -> Self {
        ServiceError::NotFound {
            entity: "account",
            message: format!("Unknown user: {username}"),
        }
    }

    /// Maps a unique-index violation raised by `err` to `DuplicateKey`.
    /// Any other database error stays `Database`.
    pub fn duplicate_or_db(err: DbErr, field: &'static str, message: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                debug!("Unique violation on {}: {}", field, detail);
                ServiceError::DuplicateKey {
                    field,
                    message: message.into(),
                }
            }
            _ => ServiceError::Database(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

/// Type alias for Result with ServiceError
pub type Result<T> = std::result::Result<T, ServiceError>;
