use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use serde::{Deserialize, Serialize};
use service::{CourseUpdate, CourseView, NewCourse, StudentSummary, StudentView};
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse, error_response};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
    /// Unique human-readable code, cannot be changed later
    #[validate(length(min = 1, max = 20))]
    pub code: String,
}

/// Request body for updating a course. The code is immutable.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct AssignStudentsRequest {
    /// National IDs to link; unknown IDs are skipped
    #[validate(length(min = 1))]
    pub student_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct BulkAssignResponse {
    pub assigned: usize,
    pub requested: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseSearchQuery {
    /// Fragment of the course code, case-insensitive; empty matches every course
    pub code: Option<String>,
}

/// List all courses with their students
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    tag = "courses",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Courses retrieved successfully", body = ApiResponse<Vec<CourseView>>),
        (status = 403, description = "Not an administrator", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_courses(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CourseView>>>, ApiError> {
    let courses = state.courses.list_with_students().await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(courses, "Courses retrieved successfully")))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses",
    tag = "courses",
    security(("bearer" = [])),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created successfully", body = ApiResponse<CourseView>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Course code already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_course(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateCourseRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CourseView>>), ApiError> {
    let created = state
        .courses
        .create(NewCourse {
            name: request.name,
            description: request.description,
            code: request.code,
        })
        .await
        .map_err(error_response)?;

    info!("Course {} created with id {}", created.code, created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            CourseView::new(created, Vec::new()),
            "Course created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/search",
    tag = "courses",
    security(("bearer" = [])),
    params(CourseSearchQuery),
    responses(
        (status = 200, description = "Matching courses", body = ApiResponse<Vec<CourseView>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn search_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseSearchQuery>,
) -> Result<Json<ApiResponse<Vec<CourseView>>>, ApiError> {
    let fragment = query.code.unwrap_or_default();
    let courses = state
        .courses
        .search_by_code_fragment(&fragment)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::ok(courses, "Courses retrieved successfully")))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}",
    tag = "courses",
    security(("bearer" = [])),
    params(("course_id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course retrieved successfully", body = ApiResponse<CourseView>),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_course(
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CourseView>>, ApiError> {
    let course = state.courses.find_view(course_id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(course, "Course retrieved successfully")))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}",
    tag = "courses",
    security(("bearer" = [])),
    params(("course_id" = i32, Path, description = "Course ID")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated successfully", body = ApiResponse<CourseView>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_course(
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateCourseRequest>>,
) -> Result<Json<ApiResponse<CourseView>>, ApiError> {
    state
        .courses
        .update(
            course_id,
            CourseUpdate {
                name: request.name,
                description: request.description,
            },
        )
        .await
        .map_err(error_response)?;

    let view = state.courses.find_view(course_id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(view, "Course updated successfully")))
}

/// Delete a course. Its students are unlinked, not deleted.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{course_id}",
    tag = "courses",
    security(("bearer" = [])),
    params(("course_id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_course(
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    state.courses.delete(course_id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(
        format!("Course {} deleted", course_id),
        "Course deleted successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/students",
    tag = "courses",
    security(("bearer" = [])),
    params(("course_id" = i32, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Students of the course", body = ApiResponse<Vec<StudentSummary>>),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_course_students(
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<StudentSummary>>>, ApiError> {
    let students = state.courses.list_students_of(course_id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(students, "Students retrieved successfully")))
}

/// Link several students at once. Unknown IDs are skipped and reported in the counts.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/students",
    tag = "courses",
    security(("bearer" = [])),
    params(("course_id" = i32, Path, description = "Course ID")),
    request_body = AssignStudentsRequest,
    responses(
        (status = 200, description = "Students assigned", body = ApiResponse<BulkAssignResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn assign_students(
    Path(course_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<AssignStudentsRequest>>,
) -> Result<Json<ApiResponse<BulkAssignResponse>>, ApiError> {
    let requested = request.student_ids.len();
    let assigned = state
        .courses
        .assign_students(course_id, &request.student_ids)
        .await
        .map_err(error_response)?;

    let message = if assigned == requested {
        format!("{assigned} students assigned successfully")
    } else {
        warn!("Only {} of {} students assigned to course {}", assigned, requested, course_id);
        format!("{assigned} of {requested} students assigned; the rest were not found")
    };

    Ok(Json(ApiResponse::ok(
        BulkAssignResponse { assigned, requested },
        message,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/students/{student_id}",
    tag = "courses",
    security(("bearer" = [])),
    params(
        ("course_id" = i32, Path, description = "Course ID"),
        ("student_id" = String, Path, description = "National ID"),
    ),
    responses(
        (status = 200, description = "Student assigned", body = ApiResponse<StudentView>),
        (status = 404, description = "Course or student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn assign_student(
    Path((course_id, student_id)): Path<(i32, String)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StudentView>>, ApiError> {
    let view = state
        .courses
        .assign_student(course_id, &student_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::ok(view, "Student assigned successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/students/{student_id}",
    tag = "courses",
    security(("bearer" = [])),
    params(("student_id" = String, Path, description = "National ID")),
    responses(
        (status = 200, description = "Student unassigned", body = ApiResponse<StudentView>),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn unassign_student(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StudentView>>, ApiError> {
    let view = state
        .courses
        .unassign_student(&student_id)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::ok(view, "Student unassigned successfully")))
}
