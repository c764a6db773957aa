//! Root for all SeaORM entity modules of the student administration app.
//!
//! The student/course link is stored only on the student row (`course_id`);
//! "a course's students" is always a query, never a stored collection.

pub mod account;
pub mod bootstrap_marker;
pub mod course;
pub mod student;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::bootstrap_marker::Entity as BootstrapMarker;
    pub use super::course::Entity as Course;
    pub use super::student::Entity as Student;
}
