use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Smart Inventory API",
        version = "0.1.0",
        description = r#"
# Smart Inventory API

Inventory tracking for small businesses with demand-aware reorder advice.

## Features

- **Inventory**: Items, stock levels, reorder points and received goods
- **Suppliers**: Lead times and minimum order quantities
- **Sales**: Single and batch sales ingestion that decrements stock
- **Forecasts**: Demand predictions from the forecasting service, stored per SKU
- **Reorder Advisor**: Ranked reorder suggestions with urgency scores
- **Alerts**: Reorder alerts raised for urgent items

## Responses

Successful responses are wrapped in an envelope:

```json
{
  "success": true,
  "data": { },
  "meta": { "request_id": "req-abc123", "timestamp": "2025-03-01T00:00:00Z" }
}
```

Errors use the `ErrorResponse` body with a matching HTTP status code.

## Pagination

List endpoints accept `page` (default 1) and `per_page` (default 20, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "inventory", description = "Inventory item endpoints"),
        (name = "suppliers", description = "Supplier endpoints"),
        (name = "sales", description = "Sales ingestion and history"),
        (name = "forecasts", description = "Demand forecast endpoints"),
        (name = "reorder", description = "Reorder advisor"),
        (name = "alerts", description = "Alert endpoints")
    ),
    paths(
        // Inventory
        crate::handlers::inventory::list_inventory,
        crate::handlers::inventory::create_inventory,
        crate::handlers::inventory::get_low_stock_items,
        crate::handlers::inventory::get_inventory,
        crate::handlers::inventory::update_inventory,
        crate::handlers::inventory::delete_inventory,
        crate::handlers::inventory::receive_inventory,

        // Suppliers
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::delete_supplier,

        // Sales
        crate::handlers::sales::list_sales,
        crate::handlers::sales::record_sale,
        crate::handlers::sales::ingest_sales_batch,

        // Forecasts
        crate::handlers::forecasts::get_forecast,
        crate::handlers::forecasts::refresh_forecast,
        crate::handlers::forecasts::get_forecast_accuracy,

        // Reorder
        crate::handlers::reorder::get_reorder_suggestions,

        // Alerts
        crate::handlers::alerts::list_alerts,
        crate::handlers::alerts::resolve_alert,
    ),
    components(
        schemas(
            // Request types
            crate::services::inventory::CreateInventoryItem,
            crate::services::inventory::UpdateInventoryItem,
            crate::services::inventory::ReceiveStock,
            crate::services::suppliers::CreateSupplier,
            crate::services::suppliers::UpdateSupplier,
            crate::services::sales::RecordSale,
            crate::handlers::sales::BatchSalesRequest,

            // Entities
            crate::entities::inventory_item::Model,
            crate::entities::supplier::Model,
            crate::entities::sales_record::Model,
            crate::entities::forecast::Model,
            crate::entities::alert::Model,
            crate::entities::alert::AlertType,
            crate::entities::alert::AlertSeverity,

            // Reorder advisor
            crate::services::reorder::ReorderReport,
            crate::services::reorder::ReorderSuggestion,
            crate::services::reorder::ReorderAnalytics,
            crate::services::reorder::ReorderSummary,
            crate::services::reorder::SupplierTerms,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
