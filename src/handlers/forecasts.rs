use super::common::success_response;
use crate::{
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::forecasting::{AccuracyReport, ForecastView, ForecastWindow, RefreshForecastParams},
    ApiResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};

pub fn forecast_routes() -> Router<AppState> {
    Router::new()
        .route("/:sku", get(get_forecast))
        .route("/:sku/refresh", post(refresh_forecast))
        .route("/:sku/accuracy", get(get_forecast_accuracy))
}

/// Stored forecast points for a SKU with a demand summary
#[utoipa::path(
    get,
    path = "/api/v1/forecasts/{sku}",
    params(("sku" = String, Path, description = "Item SKU"), ForecastWindow),
    responses(
        (status = 200, description = "Stored forecast", body = ApiResponse<ForecastView>),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "forecasts"
)]
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Query(window): Query<ForecastWindow>,
) -> Result<Response, ServiceError> {
    let view = state.services.forecasting.list_forecast(&sku, window).await?;
    Ok(success_response(view))
}

/// Fetch fresh predictions from the forecasting service and store them
#[utoipa::path(
    post,
    path = "/api/v1/forecasts/{sku}/refresh",
    params(("sku" = String, Path, description = "Item SKU"), RefreshForecastParams),
    responses(
        (status = 200, description = "Forecast refreshed", body = ApiResponse<ForecastView>),
        (status = 400, description = "Horizon out of range", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse),
        (status = 502, description = "Forecasting service rejected the request", body = ErrorResponse),
        (status = 503, description = "Forecasting service unreachable", body = ErrorResponse)
    ),
    tag = "forecasts"
)]
pub async fn refresh_forecast(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Query(params): Query<RefreshForecastParams>,
) -> Result<Response, ServiceError> {
    let view = state
        .services
        .forecasting
        .refresh_forecast(&sku, params.horizon_days)
        .await?;
    Ok(success_response(view))
}

/// Score past forecasts against recorded sales
#[utoipa::path(
    get,
    path = "/api/v1/forecasts/{sku}/accuracy",
    params(("sku" = String, Path, description = "Item SKU")),
    responses(
        (status = 200, description = "Accuracy report", body = ApiResponse<AccuracyReport>),
        (status = 400, description = "No overlapping forecast and sales data", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "forecasts"
)]
pub async fn get_forecast_accuracy(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Response, ServiceError> {
    let report = state.services.forecasting.forecast_accuracy(&sku).await?;
    Ok(success_response(report))
}
