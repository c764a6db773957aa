//! Plain data shapes returned by the services.
//! Handlers serialize these directly, so they double as API schemas.

use chrono::{DateTime, Utc};
use model::entities::{account, course, student};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Simplified view of a course, attached to a student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CourseSummary {
    pub id: i32,
    pub name: String,
    pub code: String,
}

impl From<&course::Model> for CourseSummary {
    fn from(model: &course::Model) -> Self {
        Self {
            id: model.id,
            name: model.name.clone(),
            code: model.code.clone(),
        }
    }
}

/// A student together with the course it is linked to, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StudentView {
    /// National ID
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
    pub course: Option<CourseSummary>,
}

impl StudentView {
    /// Builds the view; `course` must be the course `student.course_id` points at.
    pub fn new(student: student::Model, course: Option<&course::Model>) -> Self {
        Self {
            id: student.id,
            name: student.name,
            last_name: student.last_name,
            address: student.address,
            phone: student.phone,
            course: course.map(CourseSummary::from),
        }
    }
}

/// A student as listed inside its course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StudentSummary {
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
}

impl From<student::Model> for StudentSummary {
    fn from(model: student::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            last_name: model.last_name,
            address: model.address,
            phone: model.phone,
        }
    }
}

/// A course with every student currently linked to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CourseView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub code: String,
    pub students: Vec<StudentSummary>,
}

impl CourseView {
    pub fn new(course: course::Model, students: Vec<student::Model>) -> Self {
        Self {
            id: course.id,
            name: course.name,
            description: course.description,
            code: course.code,
            students: students.into_iter().map(StudentSummary::from).collect(),
        }
    }
}

/// Public data of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountView {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub display_name: String,
    /// "ADMIN" or "SECRETARIA"
    pub role: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<account::Model> for AccountView {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            display_name: model.display_name,
            role: model.role.to_string(),
            active: model.active,
            created_at: model.created_at,
        }
    }
}

/// What the login pipeline needs to verify a user and attach a role to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    pub username: String,
    pub password_hash: String,
    pub active: bool,
    pub role: account::Role,
}

impl From<account::Model> for AccountCredentials {
    fn from(model: account::Model) -> Self {
        Self {
            username: model.username,
            password_hash: model.password_hash,
            active: model.active,
            role: model.role,
        }
    }
}

/// Totals shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardTotals {
    pub total_students: u64,
    pub total_courses: u64,
}
