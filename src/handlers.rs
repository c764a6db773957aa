pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod health;
pub mod students;
