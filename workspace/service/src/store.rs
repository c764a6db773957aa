//! Persistence for the core entities.
//!
//! Every operation is generic over [`sea_orm::ConnectionTrait`], so the same call
//! runs against the connection pool or inside a `DatabaseTransaction` opened by a
//! service for its unit of work.

pub mod account_store;
pub mod course_store;
pub mod student_store;

pub use account_store::{AccountStore, NewAccountRecord};
pub use course_store::CourseStore;
pub use student_store::StudentStore;
