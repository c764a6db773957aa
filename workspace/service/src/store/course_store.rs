use model::entities::course;
use model::entities::prelude::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::trace;

/// Course persistence, keyed by the generated numeric ID.
pub struct CourseStore;

impl CourseStore {
    pub async fn find_by_id<C: ConnectionTrait>(
        conn: &C,
        id: i32,
    ) -> Result<Option<course::Model>, DbErr> {
        Course::find_by_id(id).one(conn).await
    }

    pub async fn find_all<C: ConnectionTrait>(conn: &C) -> Result<Vec<course::Model>, DbErr> {
        Course::find()
            .order_by_asc(course::Column::Id)
            .all(conn)
            .await
    }

    /// Case-insensitive substring match over the course code.
    ///
    /// SQL `LOWER` only folds ASCII on SQLite, so folding happens here on both sides.
    pub async fn find_by_code_fragment<C: ConnectionTrait>(
        conn: &C,
        fragment: &str,
    ) -> Result<Vec<course::Model>, DbErr> {
        let needle = fragment.to_lowercase();
        let mut candidates = Self::find_all(conn).await?;
        candidates.retain(|c| c.code.to_lowercase().contains(&needle));
        Ok(candidates)
    }

    pub async fn exists_by_code<C: ConnectionTrait>(conn: &C, code: &str) -> Result<bool, DbErr> {
        let matches = Course::find()
            .filter(course::Column::Code.eq(code))
            .count(conn)
            .await?;
        Ok(matches > 0)
    }

    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        name: String,
        description: Option<String>,
        code: String,
    ) -> Result<course::Model, DbErr> {
        trace!("Inserting course with code {}", code);
        course::ActiveModel {
            name: Set(name),
            description: Set(description),
            code: Set(code),
            ..Default::default()
        }
        .insert(conn)
        .await
    }

    /// Overwrites the mutable fields. The code is left as it is.
    pub async fn update<C: ConnectionTrait>(
        conn: &C,
        course: course::Model,
        name: String,
        description: Option<String>,
    ) -> Result<course::Model, DbErr> {
        let mut active: course::ActiveModel = course.into();
        active.name = Set(name);
        active.description = Set(description);
        active.update(conn).await
    }

    /// Returns the number of rows removed (0 when the course did not exist).
    pub async fn delete<C: ConnectionTrait>(conn: &C, id: i32) -> Result<u64, DbErr> {
        let result = Course::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected)
    }

    pub async fn count<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
        Course::find().count(conn).await
    }
}
