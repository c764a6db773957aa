use model::entities::prelude::*;
use model::entities::student;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::trace;

/// Student persistence, keyed by national ID.
pub struct StudentStore;

impl StudentStore {
    pub async fn find_by_id<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> Result<Option<student::Model>, DbErr> {
        Student::find_by_id(id).one(conn).await
    }

    pub async fn find_all<C: ConnectionTrait>(conn: &C) -> Result<Vec<student::Model>, DbErr> {
        Student::find()
            .order_by_asc(student::Column::Id)
            .all(conn)
            .await
    }

    /// Students not linked to any course.
    pub async fn find_unassigned<C: ConnectionTrait>(
        conn: &C,
    ) -> Result<Vec<student::Model>, DbErr> {
        Student::find()
            .filter(student::Column::CourseId.is_null())
            .order_by_asc(student::Column::Id)
            .all(conn)
            .await
    }

    pub async fn find_by_course<C: ConnectionTrait>(
        conn: &C,
        course_id: i32,
    ) -> Result<Vec<student::Model>, DbErr> {
        Student::find()
            .filter(student::Column::CourseId.eq(course_id))
            .order_by_asc(student::Column::Id)
            .all(conn)
            .await
    }

    /// Case-sensitive substring match over the national ID.
    ///
    /// `LIKE` only narrows the candidates: its case rules differ per backend and
    /// `%`/`_` in the fragment act as wildcards, so the final decision is made here.
    pub async fn find_by_id_fragment<C: ConnectionTrait>(
        conn: &C,
        fragment: &str,
    ) -> Result<Vec<student::Model>, DbErr> {
        let mut candidates = Student::find()
            .filter(student::Column::Id.contains(fragment))
            .order_by_asc(student::Column::Id)
            .all(conn)
            .await?;
        candidates.retain(|s| s.id.contains(fragment));
        Ok(candidates)
    }

    pub async fn exists<C: ConnectionTrait>(conn: &C, id: &str) -> Result<bool, DbErr> {
        Ok(Student::find_by_id(id).count(conn).await? > 0)
    }

    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        model: student::Model,
    ) -> Result<student::Model, DbErr> {
        trace!("Inserting student {}", model.id);
        to_active_model(model).insert(conn).await
    }

    /// Upsert: writes every column of `model`, creating the row if needed.
    pub async fn save<C: ConnectionTrait>(
        conn: &C,
        model: student::Model,
    ) -> Result<student::Model, DbErr> {
        let id = model.id.clone();
        trace!("Saving student {}", id);

        Student::insert(to_active_model(model))
            .on_conflict(
                OnConflict::column(student::Column::Id)
                    .update_columns([
                        student::Column::Name,
                        student::Column::LastName,
                        student::Column::Address,
                        student::Column::Phone,
                        student::Column::CourseId,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;

        Self::find_by_id(conn, &id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("student {id} should exist after save")))
    }

    /// Points the student at `course_id`, or clears the link with `None`.
    pub async fn set_course<C: ConnectionTrait>(
        conn: &C,
        student: student::Model,
        course_id: Option<i32>,
    ) -> Result<student::Model, DbErr> {
        let mut active: student::ActiveModel = student.into();
        active.course_id = Set(course_id);
        active.update(conn).await
    }

    /// Clears the course link of every student of `course_id`.
    /// Returns how many students were unlinked.
    pub async fn clear_course_links<C: ConnectionTrait>(
        conn: &C,
        course_id: i32,
    ) -> Result<u64, DbErr> {
        let result = Student::update_many()
            .col_expr(student::Column::CourseId, Expr::value(Option::<i32>::None))
            .filter(student::Column::CourseId.eq(course_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Returns the number of rows removed (0 when the student did not exist).
    pub async fn delete<C: ConnectionTrait>(conn: &C, id: &str) -> Result<u64, DbErr> {
        let result = Student::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected)
    }

    pub async fn count<C: ConnectionTrait>(conn: &C) -> Result<u64, DbErr> {
        Student::find().count(conn).await
    }
}

fn to_active_model(model: student::Model) -> student::ActiveModel {
    student::ActiveModel {
        id: Set(model.id),
        name: Set(model.name),
        last_name: Set(model.last_name),
        address: Set(model.address),
        phone: Set(model.phone),
        course_id: Set(model.course_id),
    }
}
