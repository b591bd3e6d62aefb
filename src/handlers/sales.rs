use super::common::{created_response, success_response, PaginatedResponse, PaginationParams};
use crate::{
    entities::sales_record,
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::sales::{BatchIngestResult, RecordSale, SalesFilter},
    ApiResponse,
};
use axum::{
    extract::{Json, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

const MAX_BATCH_ROWS: u64 = 1_000;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BatchSalesRequest {
    #[validate(length(min = 1, max = 1000))]
    pub records: Vec<RecordSale>,
}

pub fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(record_sale))
        .route("/batch", post(ingest_sales_batch))
}

/// List sales, newest first
#[utoipa::path(
    get,
    path = "/api/v1/sales",
    params(PaginationParams, SalesFilter),
    responses(
        (status = 200, description = "Sales list returned", body = ApiResponse<PaginatedResponse<sales_record::Model>>),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<SalesFilter>,
) -> Result<Response, ServiceError> {
    let (sales, total) = state
        .services
        .sales
        .list_sales(filter, pagination.page(), pagination.per_page())
        .await?;

    Ok(success_response(PaginatedResponse::new(
        sales,
        &pagination,
        total,
    )))
}

/// Record one sale and decrement stock
#[utoipa::path(
    post,
    path = "/api/v1/sales",
    request_body = RecordSale,
    responses(
        (status = 201, description = "Sale recorded", body = ApiResponse<sales_record::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Unknown SKU", body = ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn record_sale(
    State(state): State<AppState>,
    Json(payload): Json<RecordSale>,
) -> Result<Response, ServiceError> {
    let record = state.services.sales.record_sale(payload).await?;
    Ok(created_response(record))
}

/// Ingest many sales; failing rows are reported and skipped
#[utoipa::path(
    post,
    path = "/api/v1/sales/batch",
    request_body = BatchSalesRequest,
    responses(
        (status = 200, description = "Batch processed", body = ApiResponse<BatchIngestResult>),
        (status = 400, description = "Empty or oversized batch", body = ErrorResponse)
    ),
    tag = "sales"
)]
pub async fn ingest_sales_batch(
    State(state): State<AppState>,
    Json(payload): Json<BatchSalesRequest>,
) -> Result<Response, ServiceError> {
    payload.validate().map_err(|_| {
        ServiceError::ValidationError(format!(
            "batch must contain between 1 and {} records",
            MAX_BATCH_ROWS
        ))
    })?;

    let result = state.services.sales.ingest_batch(payload.records).await;
    Ok(success_response(result))
}
