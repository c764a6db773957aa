//! Session lookup and route access enforcement.
//!
//! Every request passes through [`require_access`]. A presented bearer token is
//! resolved to its [`Session`], the path is checked against
//! [`service::ACCESS_RULES`], and the session is attached to the request for
//! handlers to read through [`CurrentSession`].

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use service::{Decision, authorize};
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::schemas::{AppState, ErrorResponse, Session};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Access denied for role {0}")]
    Forbidden(String),
    #[error("Invalid username or password")]
    InvalidCredentials,
}

impl AuthError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AuthError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        }
    }
}

impl From<AuthError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: AuthError) -> Self {
        let (status, code) = err.status_and_code();
        (status, Json(ErrorResponse::new(err.to_string(), code)))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        <(StatusCode, Json<ErrorResponse>)>::from(self).into_response()
    }
}

/// The session of the current request, with the token it was found under.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub token: String,
    pub session: Session,
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn require_access(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let path = req.uri().path().to_owned();

    let current = match bearer_token(req.headers()).map(str::to_owned) {
        Some(token) => match state.sessions.get(&token).await {
            Some(session) => Some(CurrentSession { token, session }),
            None => {
                debug!("Unknown or expired session token");
                None
            }
        },
        None => None,
    };

    let role = current.as_ref().map(|c| c.session.role);
    match authorize(&path, role) {
        Decision::Allow => {
            trace!("Access granted to {} for {:?}", path, role);
            if let Some(current) = current {
                req.extensions_mut().insert(current);
            }
            Ok(next.run(req).await)
        }
        Decision::Unauthenticated => {
            debug!("Rejected unauthenticated request to {}", path);
            Err(AuthError::Unauthenticated)
        }
        Decision::Forbidden => {
            let role = role.map(|r| r.to_string()).unwrap_or_default();
            warn!("Role {} may not access {}", role, path);
            Err(AuthError::Forbidden(role))
        }
    }
}
