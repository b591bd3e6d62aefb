use super::common::{
    created_response, no_content_response, success_response, PaginatedResponse, PaginationParams,
};
use crate::{
    entities::inventory_item,
    errors::{ErrorResponse, ServiceError},
    handlers::AppState,
    services::{
        inventory::{CreateInventoryItem, InventoryFilter, ReceiveStock, UpdateInventoryItem},
        reorder::LowStockItem,
    },
    ApiResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{get, post},
    Router,
};
use tracing::info;

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory).post(create_inventory))
        .route("/low-stock", get(get_low_stock_items))
        .route(
            "/:sku",
            get(get_inventory)
                .put(update_inventory)
                .delete(delete_inventory),
        )
        .route("/:sku/receive", post(receive_inventory))
}

/// List inventory items
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(PaginationParams, InventoryFilter),
    responses(
        (status = 200, description = "Inventory list returned",
            body = ApiResponse<PaginatedResponse<inventory_item::Model>>,
            headers(
                ("X-Request-Id" = String, description = "Unique request id for tracing"),
            )
        ),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<InventoryFilter>,
) -> Result<Response, ServiceError> {
    let (items, total) = state
        .services
        .inventory
        .list_items(filter, pagination.page(), pagination.per_page())
        .await?;

    Ok(success_response(PaginatedResponse::new(
        items,
        &pagination,
        total,
    )))
}

/// Create an inventory item
#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateInventoryItem,
    responses(
        (status = 201, description = "Inventory item created", body = ApiResponse<inventory_item::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Supplier not found", body = ErrorResponse),
        (status = 409, description = "SKU already exists", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_inventory(
    State(state): State<AppState>,
    Json(payload): Json<CreateInventoryItem>,
) -> Result<Response, ServiceError> {
    let item = state.services.inventory.create_item(payload).await?;
    info!(sku = %item.sku, "Inventory item created via API");
    Ok(created_response(item))
}

/// Items at or below their reorder point
#[utoipa::path(
    get,
    path = "/api/v1/inventory/low-stock",
    responses(
        (status = 200, description = "Low-stock items, lowest stock first", body = ApiResponse<Vec<LowStockItem>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_low_stock_items(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let items = state.services.inventory.list_low_stock().await?;
    Ok(success_response(items))
}

/// Get an inventory item by SKU
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{sku}",
    params(("sku" = String, Path, description = "Item SKU")),
    responses(
        (status = 200, description = "Inventory item", body = ApiResponse<inventory_item::Model>),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Response, ServiceError> {
    let item = state.services.inventory.get_item(&sku).await?;
    Ok(success_response(item))
}

/// Partially update an inventory item
#[utoipa::path(
    put,
    path = "/api/v1/inventory/{sku}",
    params(("sku" = String, Path, description = "Item SKU")),
    request_body = UpdateInventoryItem,
    responses(
        (status = 200, description = "Inventory item updated", body = ApiResponse<inventory_item::Model>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Item or supplier not found", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn update_inventory(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(payload): Json<UpdateInventoryItem>,
) -> Result<Response, ServiceError> {
    let item = state.services.inventory.update_item(&sku, payload).await?;
    Ok(success_response(item))
}

/// Delete an item together with its sales history and forecasts
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{sku}",
    params(("sku" = String, Path, description = "Item SKU")),
    responses(
        (status = 204, description = "Inventory item deleted"),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn delete_inventory(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Response, ServiceError> {
    state.services.inventory.delete_item(&sku).await?;
    Ok(no_content_response())
}

/// Book received goods onto an item
#[utoipa::path(
    post,
    path = "/api/v1/inventory/{sku}/receive",
    params(("sku" = String, Path, description = "Item SKU")),
    request_body = ReceiveStock,
    responses(
        (status = 200, description = "Stock received", body = ApiResponse<inventory_item::Model>),
        (status = 400, description = "Invalid quantity", body = ErrorResponse),
        (status = 404, description = "Item not found", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn receive_inventory(
    State(state): State<AppState>,
    Path(sku): Path<String>,
    Json(payload): Json<ReceiveStock>,
) -> Result<Response, ServiceError> {
    let item = state
        .services
        .inventory
        .receive_stock(&sku, payload.quantity)
        .await?;
    Ok(success_response(item))
}
