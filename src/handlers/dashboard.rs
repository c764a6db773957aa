use axum::{extract::State, response::Json};
use service::{DashboardTotals, dashboard_totals};
use tracing::{debug, instrument};

use crate::schemas::{ApiError, ApiResponse, AppState, ErrorResponse, error_response};

/// Student and course totals
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    tag = "dashboard",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Totals retrieved successfully", body = ApiResponse<DashboardTotals>),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardTotals>>, ApiError> {
    let totals = dashboard_totals(&state.db).await.map_err(error_response)?;
    debug!(
        "Dashboard totals: {} students, {} courses",
        totals.total_students, totals.total_courses
    );
    Ok(Json(ApiResponse::ok(totals, "Dashboard retrieved successfully")))
}
