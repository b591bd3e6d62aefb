use super::common::{success_response, PaginatedResponse, PaginationParams};
use crate::{
    entities::alert,
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::alerts::AlertFilter,
    ApiResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_alerts))
        .route("/:id/resolve", post(resolve_alert))
}

#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    params(PaginationParams, AlertFilter),
    responses(
        (status = 200, description = "Alerts, newest first", body = ApiResponse<PaginatedResponse<alert::Model>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<AlertFilter>,
) -> Result<Response, ServiceError> {
    let (alerts, total) = state
        .services
        .alerts
        .list_alerts(filter, pagination.page(), pagination.per_page())
        .await?;

    Ok(success_response(PaginatedResponse::new(
        alerts,
        &pagination,
        total,
    )))
}

/// Mark an alert resolved
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/resolve",
    params(("id" = Uuid, Path, description = "Alert id")),
    responses(
        (status = 200, description = "Alert resolved", body = ApiResponse<alert::Model>),
        (status = 404, description = "Alert not found", body = ErrorResponse)
    ),
    tag = "alerts"
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let alert = state.services.alerts.resolve_alert(id).await?;
    Ok(success_response(alert))
}
