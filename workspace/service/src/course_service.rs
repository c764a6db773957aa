use model::entities::course;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, ServiceError};
use crate::store::{CourseStore, StudentStore};
use crate::views::{CourseView, StudentSummary, StudentView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub name: String,
    pub description: Option<String>,
    pub code: String,
}

/// The mutable fields of a course. The code cannot change once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseUpdate {
    pub name: String,
    pub description: Option<String>,
}

/// Course use cases, including assignment from the course's side.
#[derive(Debug, Clone)]
pub struct CourseService {
    db: DatabaseConnection,
}

impl CourseService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<course::Model>> {
        Ok(CourseStore::find_all(&self.db).await?)
    }

    /// Every course with the students linked to it.
    #[instrument(skip(self))]
    pub async fn list_with_students(&self) -> Result<Vec<CourseView>> {
        let courses = CourseStore::find_all(&self.db).await?;
        self.views_of(courses).await
    }

    /// Creates a course. Fails with `DuplicateKey` when the code is taken.
    #[instrument(skip(self))]
    pub async fn create(&self, new_course: NewCourse) -> Result<course::Model> {
        if new_course.code.trim().is_empty() {
            return Err(ServiceError::Validation("Course code must not be blank".to_string()));
        }

        let duplicate = format!("A course with code {} already exists", new_course.code);
        let txn = self.db.begin().await?;
        if CourseStore::exists_by_code(&txn, &new_course.code).await? {
            warn!("Course code {} already exists", new_course.code);
            return Err(ServiceError::DuplicateKey {
                field: "code",
                message: duplicate,
            });
        }

        let created =
            CourseStore::insert(&txn, new_course.name, new_course.description, new_course.code)
                .await
                .map_err(|e| ServiceError::duplicate_or_db(e, "code", duplicate))?;
        txn.commit().await?;

        info!("Course {} created with id {}", created.code, created.id);
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, id: i32, update: CourseUpdate) -> Result<course::Model> {
        let txn = self.db.begin().await?;
        let existing = CourseStore::find_by_id(&txn, id)
            .await?
            .ok_or_else(|| ServiceError::course_not_found(id))?;

        let updated = CourseStore::update(&txn, existing, update.name, update.description).await?;
        txn.commit().await?;

        info!("Course {} updated", id);
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: i32) -> Result<course::Model> {
        CourseStore::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| ServiceError::course_not_found(id))
    }

    /// A single course with its students.
    #[instrument(skip(self))]
    pub async fn find_view(&self, id: i32) -> Result<CourseView> {
        let course = self.find_by_id(id).await?;
        let students = StudentStore::find_by_course(&self.db, id).await?;
        Ok(CourseView::new(course, students))
    }

    /// Unlinks every student of the course, then removes the course, as one unit of work.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<()> {
        let txn = self.db.begin().await?;
        if CourseStore::find_by_id(&txn, id).await?.is_none() {
            warn!("Course {} not found for deletion", id);
            return Err(ServiceError::course_not_found(id));
        }

        let unlinked = StudentStore::clear_course_links(&txn, id).await?;
        debug!("Unlinked {} students from course {}", unlinked, id);
        CourseStore::delete(&txn, id).await?;
        txn.commit().await?;

        info!("Course {} deleted, {} students unlinked", id, unlinked);
        Ok(())
    }

    /// Courses whose code contains `fragment`, ignoring case.
    #[instrument(skip(self))]
    pub async fn search_by_code_fragment(&self, fragment: &str) -> Result<Vec<CourseView>> {
        let courses = CourseStore::find_by_code_fragment(&self.db, fragment).await?;
        debug!("{} courses match '{}'", courses.len(), fragment);
        self.views_of(courses).await
    }

    /// Links one student to the course, replacing any previous link.
    #[instrument(skip(self))]
    pub async fn assign_student(&self, course_id: i32, student_id: &str) -> Result<StudentView> {
        let txn = self.db.begin().await?;
        let course = CourseStore::find_by_id(&txn, course_id)
            .await?
            .ok_or_else(|| ServiceError::course_not_found(course_id))?;
        let student = StudentStore::find_by_id(&txn, student_id)
            .await?
            .ok_or_else(|| ServiceError::student_not_found(student_id))?;

        let updated = StudentStore::set_course(&txn, student, Some(course_id)).await?;
        txn.commit().await?;

        info!("Student {} assigned to course {}", student_id, course_id);
        Ok(StudentView::new(updated, Some(&course)))
    }

    /// Links each listed student to the course and returns how many were linked.
    ///
    /// Unknown student IDs are skipped rather than failing the batch. Each link is
    /// written on its own, so links made before a storage failure stay in place.
    /// A missing course still fails the whole call with `NotFound`.
    #[instrument(skip(self, student_ids), fields(requested = student_ids.len()))]
    pub async fn assign_students(&self, course_id: i32, student_ids: &[String]) -> Result<usize> {
        if CourseStore::find_by_id(&self.db, course_id).await?.is_none() {
            return Err(ServiceError::course_not_found(course_id));
        }

        let mut assigned = 0;
        for student_id in student_ids {
            let Some(student) = StudentStore::find_by_id(&self.db, student_id).await? else {
                debug!("Skipping unknown student {}", student_id);
                continue;
            };
            StudentStore::set_course(&self.db, student, Some(course_id)).await?;
            assigned += 1;
        }

        if assigned < student_ids.len() {
            warn!(
                "Assigned {} of {} students to course {}",
                assigned,
                student_ids.len(),
                course_id
            );
        } else {
            info!("Assigned {} students to course {}", assigned, course_id);
        }
        Ok(assigned)
    }

    /// Clears the student's course link, whether or not it had one.
    #[instrument(skip(self))]
    pub async fn unassign_student(&self, student_id: &str) -> Result<StudentView> {
        let txn = self.db.begin().await?;
        let student = StudentStore::find_by_id(&txn, student_id)
            .await?
            .ok_or_else(|| ServiceError::student_not_found(student_id))?;

        let updated = StudentStore::set_course(&txn, student, None).await?;
        txn.commit().await?;

        info!("Student {} unassigned", student_id);
        Ok(StudentView::new(updated, None))
    }

    #[instrument(skip(self))]
    pub async fn list_students_of(&self, course_id: i32) -> Result<Vec<StudentSummary>> {
        if CourseStore::find_by_id(&self.db, course_id).await?.is_none() {
            return Err(ServiceError::course_not_found(course_id));
        }
        let students = StudentStore::find_by_course(&self.db, course_id).await?;
        Ok(students.into_iter().map(StudentSummary::from).collect())
    }

    async fn views_of(&self, courses: Vec<course::Model>) -> Result<Vec<CourseView>> {
        let mut views = Vec::with_capacity(courses.len());
        for course in courses {
            let students = StudentStore::find_by_course(&self.db, course.id).await?;
            views.push(CourseView::new(course, students));
        }
        Ok(views)
    }
}
