use axum::http::StatusCode;
use model::entities::account;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{Value, json};

use crate::schemas::{ApiResponse, ErrorResponse};
use crate::test_utils::{
    admin_and_secretary_tokens, admin_token, login, register, setup_test_server,
    setup_test_server_with_state, with_token,
};

fn student_body(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Ana",
        "last_name": "Pérez",
        "address": "Av. Amazonas 100",
        "phone": "0991234567",
    })
}

fn course_body(code: &str) -> Value {
    json!({
        "name": format!("Curso {code}"),
        "description": "Primer nivel",
        "code": code,
    })
}

#[tokio::test]
async fn test_health_check_is_public() {
    let server = setup_test_server().await;

    let response = server.get("/health").await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_metrics_not_mounted_in_tests() {
    let server = setup_test_server().await;

    server.get("/metrics").await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_is_public() {
    let server = setup_test_server().await;

    let response = server.get("/api-docs/openapi.json").await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert!(body["paths"]["/api/v1/students"].is_object());
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let server = setup_test_server().await;

    for path in ["/api/v1/students", "/api/v1/courses", "/api/v1/dashboard", "/nowhere"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: ErrorResponse = response.json();
        assert_eq!(body.code, "UNAUTHENTICATED");
        assert!(!body.success);
    }

    let response = with_token(server.get("/api/v1/students"), "not-a-real-token").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_first_registration_is_admin() {
    let server = setup_test_server().await;

    let status: ApiResponse<Value> = server.get("/api/v1/auth/status").await.json();
    assert_eq!(status.data["first_registration"], true);

    let first = register(&server, "admin").await;
    assert_eq!(first["role"], "ADMIN");
    assert!(first.get("password_hash").is_none());

    let second = register(&server, "secretaria").await;
    assert_eq!(second["role"], "SECRETARIA");

    let status: ApiResponse<Value> = server.get("/api/v1/auth/status").await.json();
    assert_eq!(status.data["first_registration"], false);
    assert_eq!(status.data["accounts"], 2);

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "username": "admin",
            "password": "another-password",
            "email": "new@example.com",
            "display_name": "Otro",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "DUPLICATE_USERNAME");
    assert_eq!(body.error, "Username is already taken");

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "username": "nuevo",
            "password": "another-password",
            "email": "admin@example.com",
            "display_name": "Nuevo",
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "DUPLICATE_EMAIL");
}

#[tokio::test]
async fn test_register_validates_input() {
    let server = setup_test_server().await;

    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "username": "ab",
            "password": "123",
            "email": "not-an-email",
            "display_name": "",
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let server = setup_test_server().await;
    register(&server, "admin").await;

    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "INVALID_CREDENTIALS");

    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "username": "nobody", "password": "whatever" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_login_rejects_inactive_account() {
    let (server, state) = setup_test_server_with_state().await;
    register(&server, "admin").await;
    register(&server, "secretaria").await;

    account::Entity::update_many()
        .col_expr(account::Column::Active, Expr::value(false))
        .filter(account::Column::Username.eq("secretaria"))
        .exec(&state.db)
        .await
        .unwrap();

    let credentials = state.accounts.authenticate("secretaria").await.unwrap();
    assert!(!credentials.active);

    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "username": "secretaria", "password": "secret-secretaria" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "INVALID_CREDENTIALS");

    login(&server, "admin").await;
}

#[tokio::test]
async fn test_me_and_logout() {
    let server = setup_test_server().await;
    let token = admin_token(&server).await;

    let response = with_token(server.get("/api/v1/auth/me"), &token).await;
    response.assert_status_ok();
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.data["username"], "admin");
    assert_eq!(body.data["role"], "ADMIN");

    with_token(server.post("/api/v1/auth/logout"), &token)
        .await
        .assert_status_ok();

    with_token(server.get("/api/v1/auth/me"), &token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    with_token(server.get("/api/v1/students"), &token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/api/v1/auth/logout")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_secretary_is_limited_to_students_and_dashboard() {
    let server = setup_test_server().await;
    let (_admin, secretary) = admin_and_secretary_tokens(&server).await;

    with_token(server.get("/api/v1/students"), &secretary)
        .await
        .assert_status_ok();
    with_token(server.get("/api/v1/dashboard"), &secretary)
        .await
        .assert_status_ok();

    let response = with_token(server.get("/api/v1/courses"), &secretary).await;
    response.assert_status(StatusCode::FORBIDDEN);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "FORBIDDEN");

    with_token(server.post("/api/v1/courses").json(&course_body("MAT101")), &secretary)
        .await
        .assert_status(StatusCode::FORBIDDEN);
    with_token(server.delete("/api/v1/courses/students/123"), &secretary)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_student_crud() {
    let server = setup_test_server().await;
    let token = admin_token(&server).await;

    let response = with_token(server.post("/api/v1/students").json(&student_body("0102030405")), &token).await;
    response.assert_status(StatusCode::CREATED);
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.data["id"], "0102030405");
    assert_eq!(body.data["course"], Value::Null);

    let response = with_token(server.post("/api/v1/students").json(&student_body("0102030405")), &token).await;
    response.assert_status(StatusCode::CONFLICT);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "DUPLICATE_ID");

    let response = with_token(
        server.put("/api/v1/students/0102030405").json(&json!({
            "name": "Ana María",
            "last_name": "Pérez",
            "address": "Calle 2",
            "phone": "022222222",
        })),
        &token,
    )
    .await;
    response.assert_status_ok();
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.data["name"], "Ana María");
    assert_eq!(body.data["address"], "Calle 2");

    let response = with_token(server.get("/api/v1/students/0102030405"), &token).await;
    response.assert_status_ok();
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.data["name"], "Ana María");

    with_token(server.delete("/api/v1/students/0102030405"), &token)
        .await
        .assert_status_ok();

    let response = with_token(server.get("/api/v1/students/0102030405"), &token).await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: ErrorResponse = response.json();
    assert_eq!(body.code, "NOT_FOUND");
    assert_eq!(body.error, "Student not found with id: 0102030405");

    with_token(server.delete("/api/v1/students/0102030405"), &token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_student_validation() {
    let server = setup_test_server().await;
    let token = admin_token(&server).await;

    let mut body = student_body("0102030405");
    body["name"] = json!("");
    with_token(server.post("/api/v1/students").json(&body), &token)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let mut body = student_body("0102030405");
    body["course_id"] = json!(999);
    with_token(server.post("/api/v1/students").json(&body), &token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // The failed create with a bad course left nothing behind
    with_token(server.get("/api/v1/students/0102030405"), &token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_student_course_link() {
    let server = setup_test_server().await;
    let token = admin_token(&server).await;

    let response = with_token(server.post("/api/v1/courses").json(&course_body("FIS101")), &token).await;
    response.assert_status(StatusCode::CREATED);
    let course: ApiResponse<Value> = response.json();
    let course_id = course.data["id"].as_i64().unwrap();

    let mut body = student_body("1");
    body["course_id"] = json!(course_id);
    let response = with_token(server.post("/api/v1/students").json(&body), &token).await;
    response.assert_status(StatusCode::CREATED);
    let created: ApiResponse<Value> = response.json();
    assert_eq!(created.data["course"]["code"], "FIS101");

    with_token(server.post("/api/v1/students").json(&student_body("2")), &token)
        .await
        .assert_status(StatusCode::CREATED);

    let response = with_token(server.get("/api/v1/students/unassigned"), &token).await;
    let unassigned: ApiResponse<Vec<Value>> = response.json();
    assert_eq!(unassigned.data.len(), 1);
    assert_eq!(unassigned.data[0]["id"], "2");

    let path = format!("/api/v1/students/2/course/{course_id}");
    let response = with_token(server.put(&path), &token).await;
    response.assert_status_ok();

    let response = with_token(server.get("/api/v1/students/2/course"), &token).await;
    let linked: ApiResponse<Value> = response.json();
    assert_eq!(linked.data["id"], course_id);
    assert_eq!(linked.data["name"], "Curso FIS101");

    with_token(server.delete("/api/v1/students/2/course"), &token)
        .await
        .assert_status_ok();
    let response = with_token(server.get("/api/v1/students/2/course"), &token).await;
    let linked: ApiResponse<Value> = response.json();
    assert_eq!(linked.data, Value::Null);

    with_token(server.put("/api/v1/students/2/course/999"), &token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_endpoints() {
    let server = setup_test_server().await;
    let token = admin_token(&server).await;

    for id in ["0102030405", "0911223344"] {
        with_token(server.post("/api/v1/students").json(&student_body(id)), &token)
            .await
            .assert_status(StatusCode::CREATED);
    }
    with_token(server.post("/api/v1/courses").json(&course_body("mat101")), &token)
        .await
        .assert_status(StatusCode::CREATED);

    let all: ApiResponse<Vec<Value>> = with_token(server.get("/api/v1/students/search?id="), &token)
        .await
        .json();
    assert_eq!(all.data.len(), 2);

    let hits: ApiResponse<Vec<Value>> = with_token(server.get("/api/v1/students/search?id=0911"), &token)
        .await
        .json();
    assert_eq!(hits.data.len(), 1);
    assert_eq!(hits.data[0]["id"], "0911223344");

    let courses: ApiResponse<Vec<Value>> = with_token(server.get("/api/v1/courses/search?code=MAT"), &token)
        .await
        .json();
    assert_eq!(courses.data.len(), 1);
    assert_eq!(courses.data[0]["code"], "mat101");
}

#[tokio::test]
async fn test_course_management_and_bulk_assign() {
    let server = setup_test_server().await;
    let token = admin_token(&server).await;

    let response = with_token(server.post("/api/v1/courses").json(&course_body("MAT101")), &token).await;
    let course: ApiResponse<Value> = response.json();
    let course_id = course.data["id"].as_i64().unwrap();

    with_token(server.post("/api/v1/courses").json(&course_body("MAT101")), &token)
        .await
        .assert_status(StatusCode::CONFLICT);

    for id in ["a", "b"] {
        with_token(server.post("/api/v1/students").json(&student_body(id)), &token)
            .await
            .assert_status(StatusCode::CREATED);
    }

    let path = format!("/api/v1/courses/{course_id}/students");
    let response = with_token(
        server
            .post(&path)
            .json(&json!({ "student_ids": ["a", "nonexistent", "b"] })),
        &token,
    )
    .await;
    response.assert_status_ok();
    let body: ApiResponse<Value> = response.json();
    assert_eq!(body.data["assigned"], 2);
    assert_eq!(body.data["requested"], 3);
    assert_eq!(body.message, "2 of 3 students assigned; the rest were not found");

    let students: ApiResponse<Vec<Value>> = with_token(server.get(&path), &token).await.json();
    assert_eq!(students.data.len(), 2);

    let response = with_token(
        server.put(&format!("/api/v1/courses/{course_id}")).json(&json!({
            "name": "Matemáticas I",
            "description": null,
        })),
        &token,
    )
    .await;
    response.assert_status_ok();
    let updated: ApiResponse<Value> = response.json();
    assert_eq!(updated.data["name"], "Matemáticas I");
    assert_eq!(updated.data["code"], "MAT101");
    assert_eq!(updated.data["students"].as_array().unwrap().len(), 2);

    with_token(server.delete("/api/v1/courses/students/a"), &token)
        .await
        .assert_status_ok();
    let students: ApiResponse<Vec<Value>> = with_token(server.get(&path), &token).await.json();
    assert_eq!(students.data.len(), 1);

    with_token(server.post(&format!("/api/v1/courses/{course_id}/students/a")), &token)
        .await
        .assert_status_ok();

    with_token(server.delete(&format!("/api/v1/courses/{course_id}")), &token)
        .await
        .assert_status_ok();
    with_token(server.get(&format!("/api/v1/courses/{course_id}")), &token)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Deleting the course unlinked its students instead of removing them
    let students: ApiResponse<Vec<Value>> = with_token(server.get("/api/v1/students"), &token).await.json();
    assert_eq!(students.data.len(), 2);
    assert!(students.data.iter().all(|s| s["course"].is_null()));

    let dashboard: ApiResponse<Value> = with_token(server.get("/api/v1/dashboard"), &token).await.json();
    assert_eq!(dashboard.data["total_students"], 2);
    assert_eq!(dashboard.data["total_courses"], 0);
}

#[tokio::test]
async fn test_authenticated_unknown_path_is_not_found() {
    let server = setup_test_server().await;
    register(&server, "admin").await;
    let token = login(&server, "admin").await;

    with_token(server.get("/nowhere"), &token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
