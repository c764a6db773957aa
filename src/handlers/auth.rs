use axum::{Extension, extract::State, http::StatusCode, response::Json};
use axum_valid::Valid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service::{AccountView, NewAccount};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthError, CurrentSession};
use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse, Session, error_response};

/// Request body for registering an account
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Opaque session token, sent back as `Authorization: Bearer <token>`
    pub token: String,
    /// Always "Bearer"
    pub token_type: String,
    pub username: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SessionResponse {
    pub username: String,
    pub role: String,
    pub logged_in_at: DateTime<Utc>,
}

/// Whether the next registration becomes the administrator
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RegistrationStatus {
    pub first_registration: bool,
    pub accounts: u64,
}

/// Register a new account. The first account ever registered is ADMIN.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account registered", body = ApiResponse<AccountView>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username or email already in use", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn register(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<RegisterRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<AccountView>>), ApiError> {
    let account = state
        .accounts
        .register(NewAccount {
            username: request.username,
            password: request.password,
            email: request.email,
            display_name: request.display_name,
        })
        .await
        .map_err(error_response)?;

    info!("Account {} registered as {}", account.username, account.role);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(account, "Account registered successfully")),
    ))
}

/// Log in and receive a session token
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn login(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<LoginRequest>>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let credentials = match state.accounts.authenticate(&request.username).await {
        Ok(credentials) => credentials,
        Err(e) if e.is_not_found() => {
            warn!("Login attempt for unknown user {}", request.username);
            return Err(AuthError::InvalidCredentials.into());
        }
        Err(e) => return Err(error_response(e)),
    };

    if !credentials.active {
        warn!("Login attempt for inactive account {}", request.username);
        return Err(AuthError::InvalidCredentials.into());
    }

    let verified = state
        .accounts
        .hasher()
        .verify(&request.password, &credentials.password_hash)
        .map_err(error_response)?;
    if !verified {
        warn!("Wrong password for {}", request.username);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = Uuid::new_v4().to_string();
    state
        .sessions
        .insert(
            token.clone(),
            Session {
                username: credentials.username.clone(),
                role: credentials.role,
                logged_in_at: Utc::now(),
            },
        )
        .await;

    info!("{} logged in as {}", credentials.username, credentials.role);
    Ok(Json(ApiResponse::ok(
        LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            username: credentials.username,
            role: credentials.role.to_string(),
        },
        "Logged in successfully",
    )))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Logged out", body = ApiResponse<String>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
#[instrument(skip(state, current))]
pub async fn logout(
    State(state): State<AppState>,
    current: Option<Extension<CurrentSession>>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let Some(Extension(current)) = current else {
        return Err(AuthError::Unauthenticated.into());
    };

    state.sessions.invalidate(&current.token).await;
    info!("{} logged out", current.session.username);
    Ok(Json(ApiResponse::ok(
        current.session.username,
        "Logged out successfully",
    )))
}

/// The account behind the current session
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current session", body = ApiResponse<SessionResponse>),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
#[instrument(skip(current))]
pub async fn me(
    current: Option<Extension<CurrentSession>>,
) -> Result<Json<ApiResponse<SessionResponse>>, ApiError> {
    let Some(Extension(current)) = current else {
        return Err(AuthError::Unauthenticated.into());
    };

    debug!("Session lookup for {}", current.session.username);
    Ok(Json(ApiResponse::ok(
        SessionResponse {
            username: current.session.username,
            role: current.session.role.to_string(),
            logged_in_at: current.session.logged_in_at,
        },
        "Session retrieved successfully",
    )))
}

/// Tells a registration form whether to show the first-administrator hint
#[utoipa::path(
    get,
    path = "/api/v1/auth/status",
    tag = "auth",
    responses(
        (status = 200, description = "Registration status", body = ApiResponse<RegistrationStatus>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn registration_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RegistrationStatus>>, ApiError> {
    let accounts = state.accounts.count().await.map_err(error_response)?;
    Ok(Json(ApiResponse::ok(
        RegistrationStatus {
            first_registration: accounts == 0,
            accounts,
        },
        "Registration status retrieved successfully",
    )))
}
