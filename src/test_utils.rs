use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, header};
use axum_test::{TestRequest, TestServer};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use service::{Argon2Hasher, CredentialHasher};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::build_app_state;
use crate::router::create_router;
use crate::schemas::{ApiResponse, AppState};

/// Create an in-memory SQLite database for testing
pub async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Create AppState for testing, with the cheapest Argon2 costs
pub async fn setup_test_app_state() -> AppState {
    let db = setup_test_db().await;
    let hasher: Arc<dyn CredentialHasher> =
        Arc::new(Argon2Hasher::with_costs(64, 1, 1).expect("valid argon2 params"));
    build_app_state(db, hasher, Duration::from_secs(600), Duration::from_secs(30))
}

/// Install a STDERR subscriber at the level given by RUST_LOG, WARN by default.
fn init_test_tracing() {
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|level| match level.to_uppercase().as_str() {
            "ERROR" => Some(Level::ERROR),
            "WARN" => Some(Level::WARN),
            "INFO" => Some(Level::INFO),
            "DEBUG" => Some(Level::DEBUG),
            "TRACE" => Some(Level::TRACE),
            _ => None,
        })
        .unwrap_or(Level::WARN);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Create axum app for testing
pub async fn setup_test_app() -> Router {
    init_test_tracing();
    let state = setup_test_app_state().await;
    create_router(state)
}

pub async fn setup_test_server() -> TestServer {
    TestServer::new(setup_test_app().await).expect("Failed to start test server")
}

/// Test server plus the state behind it, for tests that reach into the database.
pub async fn setup_test_server_with_state() -> (TestServer, AppState) {
    init_test_tracing();
    let state = setup_test_app_state().await;
    let server =
        TestServer::new(create_router(state.clone())).expect("Failed to start test server");
    (server, state)
}

pub fn with_token(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).expect("valid header value"),
    )
}

/// Registers `username` (password `secret-<username>`) and returns the registered account.
pub async fn register(server: &TestServer, username: &str) -> Value {
    let response = server
        .post("/api/v1/auth/register")
        .json(&json!({
            "username": username,
            "password": format!("secret-{username}"),
            "email": format!("{username}@example.com"),
            "display_name": username.to_uppercase(),
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<ApiResponse<Value>>().data
}

pub async fn login(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({
            "username": username,
            "password": format!("secret-{username}"),
        }))
        .await;
    response.assert_status_ok();
    let body: ApiResponse<Value> = response.json();
    body.data["token"]
        .as_str()
        .expect("login returns a token")
        .to_string()
}

/// First account registered, so it is the administrator.
pub async fn admin_token(server: &TestServer) -> String {
    register(server, "admin").await;
    login(server, "admin").await
}

/// Registers the administrator and a secretary, returning both tokens.
pub async fn admin_and_secretary_tokens(server: &TestServer) -> (String, String) {
    let admin = admin_token(server).await;
    register(server, "secretaria").await;
    let secretary = login(server, "secretaria").await;
    (admin, secretary)
}
