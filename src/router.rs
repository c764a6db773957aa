use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::require_access;
use crate::handlers::{
    auth::{login, logout, me, register, registration_status},
    courses::{
        assign_student, assign_students, create_course, delete_course, get_course,
        get_course_students, get_courses, search_courses, unassign_student, update_course,
    },
    dashboard::get_dashboard,
    health::health_check,
    students::{
        clear_student_course, create_student, delete_student, get_student, get_student_course,
        get_students, get_unassigned_students, search_students, set_student_course,
        update_student,
    },
};
use crate::schemas::{ApiDoc, AppState};

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let request_timeout = state.request_timeout;

    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        // Authentication
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/auth/status", get(registration_status))
        // Dashboard
        .route("/api/v1/dashboard", get(get_dashboard))
        // Students
        .route("/api/v1/students", get(get_students).post(create_student))
        .route("/api/v1/students/search", get(search_students))
        .route("/api/v1/students/unassigned", get(get_unassigned_students))
        .route(
            "/api/v1/students/:student_id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route(
            "/api/v1/students/:student_id/course",
            get(get_student_course).delete(clear_student_course),
        )
        .route(
            "/api/v1/students/:student_id/course/:course_id",
            put(set_student_course),
        )
        // Courses
        .route("/api/v1/courses", get(get_courses).post(create_course))
        .route("/api/v1/courses/search", get(search_courses))
        .route(
            "/api/v1/courses/:course_id",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route(
            "/api/v1/courses/:course_id/students",
            get(get_course_students).post(assign_students),
        )
        .route(
            "/api/v1/courses/:course_id/students/:student_id",
            post(assign_student),
        )
        .route("/api/v1/courses/students/:student_id", delete(unassign_student))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    #[cfg(not(test))]
    let router = {
        let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();
        router
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer)
    };

    router
        .layer(middleware::from_fn_with_state(state.clone(), require_access))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
