use std::time::Duration;

use axum::{Json, http::StatusCode};
use chrono::{DateTime, Utc};
use model::entities::account::Role;
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use service::{
    AccountService, AccountView, CourseService, CourseSummary, CourseView, DashboardTotals,
    ServiceError, StudentService, StudentSummary, StudentView,
};
use tracing::error;
use utoipa::{
    Modify, OpenApi, ToSchema,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::handlers::{
    auth::{LoginRequest, LoginResponse, RegisterRequest, RegistrationStatus, SessionResponse},
    courses::{AssignStudentsRequest, BulkAssignResponse, CreateCourseRequest, UpdateCourseRequest},
    students::{CreateStudentRequest, UpdateStudentRequest},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Live sessions keyed by bearer token
    pub sessions: Cache<String, Session>,
    pub students: StudentService,
    pub courses: CourseService,
    pub accounts: AccountService,
    pub request_timeout: Duration,
}

/// A logged-in account, attached to every request that presents its token.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub role: Role,
    pub logged_in_at: DateTime<Utc>,
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps a core error to its HTTP status and error code.
pub fn error_response(err: ServiceError) -> ApiError {
    let (status, code) = match &err {
        ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND".to_string()),
        ServiceError::DuplicateKey { field, .. } => (
            StatusCode::CONFLICT,
            format!("DUPLICATE_{}", field.to_uppercase()),
        ),
        ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED".to_string()),
        ServiceError::Database(db_error) => {
            error!("Database error: {}", db_error);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "Internal server error while accessing the database",
                    "DATABASE_ERROR",
                )),
            );
        }
        ServiceError::Hashing(message) => {
            error!("Password hashing error: {}", message);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error", "HASHING_ERROR")),
            );
        }
    };
    (status, Json(ErrorResponse::new(err.to_string(), code)))
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::me,
        crate::handlers::auth::registration_status,
        crate::handlers::dashboard::get_dashboard,
        crate::handlers::students::get_students,
        crate::handlers::students::create_student,
        crate::handlers::students::search_students,
        crate::handlers::students::get_unassigned_students,
        crate::handlers::students::get_student,
        crate::handlers::students::update_student,
        crate::handlers::students::delete_student,
        crate::handlers::students::get_student_course,
        crate::handlers::students::set_student_course,
        crate::handlers::students::clear_student_course,
        crate::handlers::courses::get_courses,
        crate::handlers::courses::create_course,
        crate::handlers::courses::search_courses,
        crate::handlers::courses::get_course,
        crate::handlers::courses::update_course,
        crate::handlers::courses::delete_course,
        crate::handlers::courses::get_course_students,
        crate::handlers::courses::assign_students,
        crate::handlers::courses::assign_student,
        crate::handlers::courses::unassign_student,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            StudentView,
            StudentSummary,
            CourseSummary,
            CourseView,
            AccountView,
            DashboardTotals,
            CreateStudentRequest,
            UpdateStudentRequest,
            CreateCourseRequest,
            UpdateCourseRequest,
            AssignStudentsRequest,
            BulkAssignResponse,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            SessionResponse,
            RegistrationStatus,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and sessions"),
        (name = "dashboard", description = "Shared dashboard"),
        (name = "students", description = "Student management (ADMIN, SECRETARIA)"),
        (name = "courses", description = "Course management (ADMIN)"),
    ),
    info(
        title = "Alumnos API",
        description = "Student and course administration with role-based access",
        version = "0.1.0",
    )
)]
pub struct ApiDoc;
