use super::common::success_response;
use crate::{
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::reorder::ReorderReport,
    ApiResponse,
};
use axum::{extract::State, response::Response, routing::get, Router};
use tracing::info;

pub fn reorder_routes() -> Router<AppState> {
    Router::new().route("/suggestions", get(get_reorder_suggestions))
}

/// Run the reorder advisor.
///
/// Suggestions come back most urgent first. Urgent items also raise alerts
/// and a `reorder_alert` notification as a side effect.
#[utoipa::path(
    get,
    path = "/api/v1/reorder/suggestions",
    responses(
        (status = 200, description = "Reorder suggestions", body = ApiResponse<ReorderReport>),
        (status = 503, description = "Inventory data unavailable", body = ErrorResponse)
    ),
    tag = "reorder"
)]
pub async fn get_reorder_suggestions(
    State(state): State<AppState>,
) -> Result<Response, ServiceError> {
    let report = state.services.reorder.compute_reorder_suggestions().await?;
    info!(
        suggestions = report.summary.total_items,
        urgent = report.summary.urgent_items,
        "Reorder suggestions served"
    );
    Ok(success_response(report))
}
