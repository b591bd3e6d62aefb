mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{response_json, TestApp};

#[tokio::test]
async fn inventory_item_lifecycle() {
    let app = TestApp::new().await;
    let supplier_id = app.create_supplier("Acme Wholesale", Some(5), Some(24)).await;

    let created = app
        .create_item(
            "WIDGET-1",
            15,
            10,
            json!({ "category": "widgets", "supplier_id": supplier_id, "reorder_qty": 30 }),
        )
        .await;
    assert_eq!(created["sku"], "WIDGET-1");
    assert_eq!(created["current_stock"], 15);
    assert_eq!(created["supplier_id"], supplier_id.to_string());

    // Fetch by sku
    let response = app.get("/api/v1/inventory/WIDGET-1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = response_json(response).await;
    assert_eq!(fetched["success"], true);
    assert_eq!(fetched["data"]["reorder_point"], 10);

    // Partial update leaves other fields alone
    let response = app
        .request(
            Method::PUT,
            "/api/v1/inventory/WIDGET-1",
            Some(json!({ "reorder_point": 20, "safety_stock": 4 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["data"]["reorder_point"], 20);
    assert_eq!(updated["data"]["safety_stock"], 4);
    assert_eq!(updated["data"]["current_stock"], 15);
    assert_eq!(updated["data"]["category"], "widgets");
    assert!(app.wait_for_event("inventory_item_updated").await.is_some());

    // Receive goods
    let response = app
        .post("/api/v1/inventory/WIDGET-1/receive", json!({ "quantity": 25 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let received = response_json(response).await;
    assert_eq!(received["data"]["current_stock"], 40);
    assert!(app.wait_for_event("stock_received").await.is_some());

    // Delete, then it is gone
    let response = app
        .request(Method::DELETE, "/api/v1/inventory/WIDGET-1", None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get("/api/v1/inventory/WIDGET-1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let app = TestApp::new().await;
    app.create_item("DUP-1", 5, 2, json!({})).await;

    let response = app
        .post(
            "/api/v1/inventory",
            json!({ "sku": "DUP-1", "name": "Again", "current_stock": 1, "reorder_point": 1 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_items_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .post(
            "/api/v1/inventory",
            json!({ "sku": "", "name": "No sku", "current_stock": 1, "reorder_point": 1 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post(
            "/api/v1/inventory",
            json!({ "sku": "NEG-1", "name": "Negative", "current_stock": -3, "reorder_point": 1 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post(
            "/api/v1/inventory",
            json!({
                "sku": "ORPHAN-1",
                "name": "Unknown supplier",
                "current_stock": 1,
                "reorder_point": 1,
                "supplier_id": "6f1c1a52-9f7e-4a53-9d53-2d5b0f4c7a11"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .post("/api/v1/inventory/ORPHAN-1/receive", json!({ "quantity": 5 }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn receiving_requires_positive_quantity() {
    let app = TestApp::new().await;
    app.create_item("RCV-1", 5, 2, json!({})).await;

    let response = app
        .post("/api/v1/inventory/RCV-1/receive", json!({ "quantity": 0 }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn low_stock_lists_items_at_or_below_reorder_point() {
    let app = TestApp::new().await;
    let supplier_id = app.create_supplier("Parts Co", Some(3), None).await;

    app.create_item("LOW-B", 4, 10, json!({ "supplier_id": supplier_id }))
        .await;
    app.create_item("LOW-A", 4, 4, json!({})).await;
    app.create_item("ZERO", 0, 10, json!({})).await;
    app.create_item("PLENTY", 50, 10, json!({})).await;

    let response = app.get("/api/v1/inventory/low-stock").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let items = body["data"].as_array().expect("array of items");

    let skus: Vec<&str> = items.iter().filter_map(|i| i["sku"].as_str()).collect();
    assert_eq!(skus, vec!["ZERO", "LOW-A", "LOW-B"]);

    let with_supplier = &items[2];
    assert_eq!(with_supplier["supplier"]["name"], "Parts Co");
    assert_eq!(with_supplier["supplier"]["lead_time_days"], 3);
}

#[tokio::test]
async fn list_filters_and_paginates() {
    let app = TestApp::new().await;
    app.create_item("BOLT-1", 5, 1, json!({ "category": "fasteners" }))
        .await;
    app.create_item("BOLT-2", 5, 1, json!({ "category": "fasteners" }))
        .await;
    app.create_item("GLUE-1", 5, 1, json!({ "category": "adhesives" }))
        .await;

    let response = app
        .get("/api/v1/inventory?category=fasteners&per_page=1&page=2")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["pagination"]["total"], 2);
    assert_eq!(body["data"]["pagination"]["total_pages"], 2);
    assert_eq!(body["data"]["data"][0]["sku"], "BOLT-2");

    let response = app.get("/api/v1/inventory?search=GLUE").await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["data"][0]["sku"], "GLUE-1");
}

#[tokio::test]
async fn deleting_a_supplier_detaches_its_items() {
    let app = TestApp::new().await;
    let supplier_id = app.create_supplier("Short Lived", None, None).await;
    app.create_item("ATTACHED", 5, 1, json!({ "supplier_id": supplier_id }))
        .await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/suppliers/{}", supplier_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get("/api/v1/inventory/ATTACHED").await;
    let body = response_json(response).await;
    assert!(body["data"]["supplier_id"].is_null());

    let response = app
        .get(&format!("/api/v1/suppliers/{}", supplier_id))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn supplier_validation_and_update() {
    let app = TestApp::new().await;

    let response = app
        .post("/api/v1/suppliers", json!({ "name": "Bad", "email": "nope" }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let supplier_id = app.create_supplier("Good Supplier", Some(10), None).await;
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/suppliers/{}", supplier_id),
            Some(json!({ "lead_time_days": 4, "min_order_qty": 12 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["lead_time_days"], 4);
    assert_eq!(body["data"]["min_order_qty"], 12);
    assert_eq!(body["data"]["name"], "Good Supplier");

    let response = app.get("/api/v1/suppliers").await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn status_and_request_id() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/status").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = response_json(response).await;
    assert_eq!(body["data"]["service"], "smart-inventory-api");
    assert!(body["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn health_reports_unreachable_forecast_service() {
    let app = TestApp::new().await;

    let response = app.get("/api/v1/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["database"], "healthy");
    assert_eq!(body["data"]["checks"]["forecast_service"], "unhealthy");
}
