use std::collections::HashMap;

use model::entities::{course, student};
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{Result, ServiceError};
use crate::store::{CourseStore, StudentStore};
use crate::views::{CourseSummary, StudentView};

/// Fields of a student to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub id: String,
    pub name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
    /// Course to link the new student to, resolved in the same transaction.
    pub course_id: Option<i32>,
}

/// The mutable fields of a student. The ID and the course link are not part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentUpdate {
    pub name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
}

/// Student use cases, including linking a student to a course from the student's side.
#[derive(Debug, Clone)]
pub struct StudentService {
    db: DatabaseConnection,
}

impl StudentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// All students, without their course.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<student::Model>> {
        Ok(StudentStore::find_all(&self.db).await?)
    }

    /// All students, each with the simplified view of its course.
    #[instrument(skip(self))]
    pub async fn list_with_course(&self) -> Result<Vec<StudentView>> {
        let students = StudentStore::find_all(&self.db).await?;
        let courses = self.course_index().await?;
        debug!("Resolving courses of {} students", students.len());

        Ok(students
            .into_iter()
            .map(|s| {
                let course = s.course_id.and_then(|id| courses.get(&id));
                StudentView::new(s, course)
            })
            .collect())
    }

    /// Students not linked to any course.
    #[instrument(skip(self))]
    pub async fn list_unassigned(&self) -> Result<Vec<StudentView>> {
        let students = StudentStore::find_unassigned(&self.db).await?;
        Ok(students
            .into_iter()
            .map(|s| StudentView::new(s, None))
            .collect())
    }

    /// Creates a student, linked to `course_id` when one is given.
    /// Fails with `DuplicateKey` when the national ID is taken and with `NotFound`
    /// when the course does not exist, in which case nothing is written.
    #[instrument(skip(self))]
    pub async fn create(&self, new_student: NewStudent) -> Result<student::Model> {
        if new_student.id.trim().is_empty() {
            return Err(ServiceError::Validation("Student id must not be blank".to_string()));
        }

        let duplicate = format!("A student with id {} already exists", new_student.id);
        let txn = self.db.begin().await?;
        if StudentStore::exists(&txn, &new_student.id).await? {
            warn!("Student with id {} already exists", new_student.id);
            return Err(ServiceError::DuplicateKey {
                field: "id",
                message: duplicate,
            });
        }

        if let Some(course_id) = new_student.course_id {
            if CourseStore::find_by_id(&txn, course_id).await?.is_none() {
                warn!("Course {} not found for new student {}", course_id, new_student.id);
                return Err(ServiceError::course_not_found(course_id));
            }
        }

        let created = StudentStore::insert(
            &txn,
            student::Model {
                id: new_student.id,
                name: new_student.name,
                last_name: new_student.last_name,
                address: new_student.address,
                phone: new_student.phone,
                course_id: new_student.course_id,
            },
        )
        .await
        .map_err(|e| ServiceError::duplicate_or_db(e, "id", duplicate))?;
        txn.commit().await?;

        info!("Student {} created", created.id);
        Ok(created)
    }

    /// Overwrites name and contact fields; the ID and course link stay untouched.
    #[instrument(skip(self))]
    pub async fn update(&self, id: &str, update: StudentUpdate) -> Result<student::Model> {
        let txn = self.db.begin().await?;
        let existing = StudentStore::find_by_id(&txn, id)
            .await?
            .ok_or_else(|| ServiceError::student_not_found(id))?;

        let updated = StudentStore::save(
            &txn,
            student::Model {
                name: update.name,
                last_name: update.last_name,
                address: update.address,
                phone: update.phone,
                ..existing
            },
        )
        .await?;
        txn.commit().await?;

        info!("Student {} updated", id);
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: &str) -> Result<student::Model> {
        StudentStore::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| ServiceError::student_not_found(id))
    }

    /// A single student with its course view.
    #[instrument(skip(self))]
    pub async fn find_view(&self, id: &str) -> Result<StudentView> {
        let student = self.find_by_id(id).await?;
        self.view_of(student).await
    }

    /// Removes the student. Nothing else references a student, so nothing cascades.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let removed = StudentStore::delete(&self.db, id).await?;
        if removed == 0 {
            warn!("Student {} not found for deletion", id);
            return Err(ServiceError::student_not_found(id));
        }
        info!("Student {} deleted", id);
        Ok(())
    }

    /// Students whose national ID contains `fragment` (case-sensitive).
    /// An empty fragment matches everyone; no match is an empty list.
    #[instrument(skip(self))]
    pub async fn search_by_id_fragment(&self, fragment: &str) -> Result<Vec<StudentView>> {
        let students = StudentStore::find_by_id_fragment(&self.db, fragment).await?;
        let courses = self.course_index().await?;
        debug!("{} students match '{}'", students.len(), fragment);

        Ok(students
            .into_iter()
            .map(|s| {
                let course = s.course_id.and_then(|id| courses.get(&id));
                StudentView::new(s, course)
            })
            .collect())
    }

    /// Links the student to `course_id`, or clears the link with `None`.
    #[instrument(skip(self))]
    pub async fn assign_course(
        &self,
        student_id: &str,
        course_id: Option<i32>,
    ) -> Result<StudentView> {
        let txn = self.db.begin().await?;
        let student = StudentStore::find_by_id(&txn, student_id)
            .await?
            .ok_or_else(|| ServiceError::student_not_found(student_id))?;

        let course = match course_id {
            Some(course_id) => Some(
                CourseStore::find_by_id(&txn, course_id)
                    .await?
                    .ok_or_else(|| ServiceError::course_not_found(course_id))?,
            ),
            None => None,
        };

        trace!("Setting course of student {} to {:?}", student_id, course_id);
        let updated = StudentStore::set_course(&txn, student, course_id).await?;
        txn.commit().await?;

        info!("Student {} course set to {:?}", student_id, course_id);
        Ok(StudentView::new(updated, course.as_ref()))
    }

    /// The course of a student, or `None` when it is not linked to any.
    #[instrument(skip(self))]
    pub async fn get_course_of(&self, student_id: &str) -> Result<Option<CourseSummary>> {
        let student = self.find_by_id(student_id).await?;
        let Some(course_id) = student.course_id else {
            return Ok(None);
        };
        let course = CourseStore::find_by_id(&self.db, course_id).await?;
        Ok(course.as_ref().map(CourseSummary::from))
    }

    async fn view_of(&self, student: student::Model) -> Result<StudentView> {
        let course = match student.course_id {
            Some(id) => CourseStore::find_by_id(&self.db, id).await?,
            None => None,
        };
        Ok(StudentView::new(student, course.as_ref()))
    }

    /// Every course by ID, so many students can be resolved with one query.
    async fn course_index(&self) -> Result<HashMap<i32, course::Model>> {
        let courses = CourseStore::find_all(&self.db).await?;
        Ok(courses.into_iter().map(|c| (c.id, c)).collect())
    }
}
