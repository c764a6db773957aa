use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use serde::{Deserialize, Serialize};
use service::{CourseSummary, NewStudent, StudentUpdate, StudentView};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse, error_response};

/// Request body for creating a student
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateStudentRequest {
    /// National ID (cedula), immutable once created
    #[validate(length(min = 1, max = 20))]
    pub id: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    /// Course to link the new student to
    pub course_id: Option<i32>,
}

/// Request body for updating a student. The ID and course link are not editable here.
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateStudentRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentSearchQuery {
    /// Fragment of the national ID (case-sensitive); empty matches everyone
    pub id: Option<String>,
}

/// List all students with their course
#[utoipa::path(
    get,
    path = "/api/v1/students",
    tag = "students",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Students retrieved successfully", body = ApiResponse<Vec<StudentView>>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<StudentView>>>, ApiError> {
    let students = state.students.list_with_course().await.map_err(error_response)?;
    debug!("Retrieved {} students", students.len());
    Ok(Json(ApiResponse::ok(students, "Students retrieved successfully")))
}

/// Create a student, optionally linked to a course
#[utoipa::path(
    post,
    path = "/api/v1/students",
    tag = "students",
    security(("bearer" = [])),
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created successfully", body = ApiResponse<StudentView>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 409, description = "National ID already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_student(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateStudentRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<StudentView>>), ApiError> {
    trace!("Entering create_student function");

    let created = state
        .students
        .create(NewStudent {
            id: request.id,
            name: request.name,
            last_name: request.last_name,
            address: request.address,
            phone: request.phone,
            course_id: request.course_id,
        })
        .await
        .map_err(error_response)?;

    let view = match created.course_id {
        Some(_) => state
            .students
            .find_view(&created.id)
            .await
            .map_err(error_response)?,
        None => StudentView::new(created, None),
    };

    info!("Student {} created", view.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(view, "Student created successfully")),
    ))
}

/// Search students by a fragment of their national ID
#[utoipa::path(
    get,
    path = "/api/v1/students/search",
    tag = "students",
    security(("bearer" = [])),
    params(StudentSearchQuery),
    responses(
        (status = 200, description = "Matching students", body = ApiResponse<Vec<StudentView>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn search_students(
    State(state): State<AppState>,
    Query(query): Query<StudentSearchQuery>,
) -> Result<Json<ApiResponse<Vec<StudentView>>>, ApiError> {
    let fragment = query.id.unwrap_or_default();
    let students = state
        .students
        .search_by_id_fragment(&fragment)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::ok(
        students,
        "Students retrieved successfully",
    )))
}

/// Students not linked to any course
#[utoipa::path(
    get,
    path = "/api/v1/students/unassigned",
    tag = "students",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Unassigned students", body = ApiResponse<Vec<StudentView>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_unassigned_students(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<StudentView>>>, ApiError> {
    let students = state.students.list_unassigned().await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(
        students,
        "Students retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    security(("bearer" = [])),
    params(("student_id" = String, Path, description = "National ID")),
    responses(
        (status = 200, description = "Student retrieved successfully", body = ApiResponse<StudentView>),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_student(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StudentView>>, ApiError> {
    let student = state.students.find_view(&student_id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(student, "Student retrieved successfully")))
}

#[utoipa::path(
    put,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    security(("bearer" = [])),
    params(("student_id" = String, Path, description = "National ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated successfully", body = ApiResponse<StudentView>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_student(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateStudentRequest>>,
) -> Result<Json<ApiResponse<StudentView>>, ApiError> {
    state
        .students
        .update(
            &student_id,
            StudentUpdate {
                name: request.name,
                last_name: request.last_name,
                address: request.address,
                phone: request.phone,
            },
        )
        .await
        .map_err(error_response)?;

    let view = state.students.find_view(&student_id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(view, "Student updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/students/{student_id}",
    tag = "students",
    security(("bearer" = [])),
    params(("student_id" = String, Path, description = "National ID")),
    responses(
        (status = 200, description = "Student deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_student(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    state.students.delete(&student_id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(
        format!("Student {} deleted", student_id),
        "Student deleted successfully",
    )))
}

/// The course a student is linked to; `data` is null when unlinked
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}/course",
    tag = "students",
    security(("bearer" = [])),
    params(("student_id" = String, Path, description = "National ID")),
    responses(
        (status = 200, description = "Course of the student", body = ApiResponse<CourseSummary>),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_student_course(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Option<CourseSummary>>>, ApiError> {
    let course = state.students.get_course_of(&student_id).await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(course, "Course retrieved successfully")))
}

#[utoipa::path(
    put,
    path = "/api/v1/students/{student_id}/course/{course_id}",
    tag = "students",
    security(("bearer" = [])),
    params(
        ("student_id" = String, Path, description = "National ID"),
        ("course_id" = i32, Path, description = "Course ID"),
    ),
    responses(
        (status = 200, description = "Course assigned", body = ApiResponse<StudentView>),
        (status = 404, description = "Student or course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn set_student_course(
    Path((student_id, course_id)): Path<(String, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StudentView>>, ApiError> {
    let view = state
        .students
        .assign_course(&student_id, Some(course_id))
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::ok(view, "Course assigned successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/students/{student_id}/course",
    tag = "students",
    security(("bearer" = [])),
    params(("student_id" = String, Path, description = "National ID")),
    responses(
        (status = 200, description = "Course link cleared", body = ApiResponse<StudentView>),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn clear_student_course(
    Path(student_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<StudentView>>, ApiError> {
    let view = state
        .students
        .assign_course(&student_id, None)
        .await
        .map_err(error_response)?;
    Ok(Json(ApiResponse::ok(view, "Course link cleared successfully")))
}
