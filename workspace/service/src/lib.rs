//! Core of the student administration app: stores, services and the access table.
//!
//! Services own a [`sea_orm::DatabaseConnection`] and run each multi-step
//! operation inside one transaction. Stores are stateless and work against
//! either the pool or an open transaction.

pub mod access;
pub mod account_service;
pub mod course_service;
pub mod dashboard;
pub mod error;
pub mod password;
pub mod store;
pub mod student_service;
pub mod views;

#[cfg(test)]
mod testing;

pub use access::{ACCESS_RULES, Access, AccessRule, Decision, authorize};
pub use account_service::{AccountService, NewAccount};
pub use course_service::{CourseService, CourseUpdate, NewCourse};
pub use dashboard::dashboard_totals;
pub use error::{Result, ServiceError};
pub use password::{Argon2Hasher, CredentialHasher};
pub use student_service::{NewStudent, StudentService, StudentUpdate};
pub use views::{
    AccountCredentials, AccountView, CourseSummary, CourseView, DashboardTotals, StudentSummary,
    StudentView,
};
