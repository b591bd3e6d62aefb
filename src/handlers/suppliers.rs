use super::common::{
    created_response, no_content_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::{
    entities::supplier,
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::suppliers::{CreateSupplier, UpdateSupplier},
    ApiResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::get,
    Router,
};
use uuid::Uuid;

pub fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

/// List suppliers by name
#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    params(PaginationParams),
    responses(
        (status = 200, description = "Supplier list returned", body = ApiResponse<PaginatedResponse<supplier::Model>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, ServiceError> {
    let (suppliers, total) = state
        .services
        .suppliers
        .list_suppliers(pagination.page(), pagination.per_page())
        .await?;

    Ok(success_response(PaginatedResponse::new(
        suppliers,
        &pagination,
        total,
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    request_body = CreateSupplier,
    responses(
        (status = 201, description = "Supplier created", body = ApiResponse<supplier::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreateSupplier>,
) -> Result<Response, ServiceError> {
    let supplier = state.services.suppliers.create_supplier(payload).await?;
    Ok(created_response(supplier))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 200, description = "Supplier", body = ApiResponse<supplier::Model>),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let supplier = state.services.suppliers.get_supplier(id).await?;
    Ok(success_response(supplier))
}

#[utoipa::path(
    put,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    request_body = UpdateSupplier,
    responses(
        (status = 200, description = "Supplier updated", body = ApiResponse<supplier::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSupplier>,
) -> Result<Response, ServiceError> {
    let supplier = state.services.suppliers.update_supplier(id, payload).await?;
    Ok(success_response(supplier))
}

/// Delete a supplier; its items keep existing without a supplier
#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/{id}",
    params(("id" = Uuid, Path, description = "Supplier id")),
    responses(
        (status = 204, description = "Supplier deleted"),
        (status = 404, description = "Supplier not found", body = ErrorResponse)
    ),
    tag = "suppliers"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.suppliers.delete_supplier(id).await?;
    Ok(no_content_response())
}
