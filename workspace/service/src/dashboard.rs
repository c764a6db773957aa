use sea_orm::DatabaseConnection;
use tracing::instrument;

use crate::error::Result;
use crate::store::{CourseStore, StudentStore};
use crate::views::DashboardTotals;

/// Student and course totals for the shared dashboard.
#[instrument(skip(db))]
pub async fn dashboard_totals(db: &DatabaseConnection) -> Result<DashboardTotals> {
    Ok(DashboardTotals {
        total_students: StudentStore::count(db).await?,
        total_courses: CourseStore::count(db).await?,
    })
}
