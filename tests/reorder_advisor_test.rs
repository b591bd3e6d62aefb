mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{Duration, NaiveDate};
use serde_json::json;
use smart_inventory_api::{
    config::ReorderConfig,
    errors::ServiceError,
    events::Event,
    services::{
        alerts::AlertFilter,
        reorder::{InventoryQuery, LowStockItem, ReorderAdvisor, SalesAggregate},
        sales::SalesService,
    },
};

use common::{response_json, TestApp};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
}

/// Sales aggregate that fails for one sku and delegates the rest.
struct FlakySales {
    inner: Arc<SalesService>,
    failing_sku: &'static str,
}

#[async_trait]
impl SalesAggregate for FlakySales {
    async fn avg_daily_sales(
        &self,
        sku: &str,
        window_days: u32,
        today: NaiveDate,
    ) -> Result<f64, ServiceError> {
        if sku == self.failing_sku {
            return Err(ServiceError::db_error("sales store unavailable"));
        }
        self.inner.avg_daily_sales(sku, window_days, today).await
    }
}

struct BrokenInventory;

#[async_trait]
impl InventoryQuery for BrokenInventory {
    async fn list_low_stock(&self) -> Result<Vec<LowStockItem>, ServiceError> {
        Err(ServiceError::db_error("connection refused"))
    }
}

fn advisor_with(
    app: &TestApp,
    inventory: Arc<dyn InventoryQuery>,
    sales: Arc<dyn SalesAggregate>,
) -> ReorderAdvisor {
    let services = &app.state.services;
    ReorderAdvisor::new(
        inventory,
        sales,
        services.forecasting.clone(),
        services.alerts.clone(),
        Arc::new(app.state.event_sender.clone()),
        ReorderConfig::default(),
    )
}

#[tokio::test]
async fn blends_forecast_velocity_and_static_quantities() {
    let app = TestApp::new().await;
    let supplier_id = app.create_supplier("Lead Seven", Some(7), None).await;

    app.create_item(
        "SCN-1",
        30,
        50,
        json!({ "reorder_qty": 50, "safety_stock": 5, "supplier_id": supplier_id }),
    )
    .await;
    app.create_item("EMPTY-1", 0, 10, json!({})).await;
    app.create_item("FULL-1", 100, 10, json!({})).await;

    // 5 units on each of four days: average 5, stock ends at 10
    for offset in 1..=4 {
        app.record_sale("SCN-1", 5, today() - Duration::days(offset)).await;
    }
    // 80 units forecast inside the 21 day horizon, plus one point beyond it
    for offset in [0, 5, 10, 21] {
        app.seed_forecast("SCN-1", today() + Duration::days(offset), 20.0)
            .await;
    }
    app.seed_forecast("SCN-1", today() + Duration::days(30), 1000.0)
        .await;

    let report = app
        .state
        .services
        .reorder
        .compute_reorder_suggestions_at(today())
        .await
        .expect("advisor run");

    let skus: Vec<&str> = report.suggestions.iter().map(|s| s.sku.as_str()).collect();
    assert_eq!(skus, vec!["EMPTY-1", "SCN-1"]);

    let empty = &report.suggestions[0];
    assert_eq!(empty.urgency_score, 10.0);
    assert_eq!(empty.recommended_order_qty, 1);
    assert_eq!(empty.days_remaining, None);
    assert!(!empty.calculation_error);

    let scenario = &report.suggestions[1];
    assert_eq!(scenario.current_stock, 10);
    assert_eq!(scenario.recommended_order_qty, 100);
    assert_eq!(scenario.urgency_score, 8.0);
    assert_eq!(scenario.days_remaining, Some(2));
    let analytics = scenario.analytics.as_ref().expect("analytics");
    assert_eq!(analytics.avg_daily_sales, 5.0);
    assert_eq!(analytics.forecast_demand, 80.0);
    assert_eq!(analytics.lead_time_days, 7);
    assert_eq!(analytics.horizon_days, 21);
    assert_eq!(analytics.forecast_based_qty, 75.0);
    assert_eq!(analytics.velocity_based_qty, 100.0);
    assert_eq!(analytics.simple_qty, 50.0);
    assert_eq!(analytics.stock_ratio, 0.2);

    assert_eq!(report.summary.total_items, 2);
    assert_eq!(report.summary.urgent_items, 2);
    assert_eq!(report.summary.total_recommended_qty, 101);
    assert_eq!(report.summary.alerts_created, 2);

    let (alerts, total) = app
        .state
        .services
        .alerts
        .list_alerts(AlertFilter::default(), 1, 20)
        .await
        .expect("alerts");
    assert_eq!(total, 2);
    assert!(alerts.iter().all(|a| !a.is_resolved));

    match app.wait_for_event("reorder_alert").await {
        Some(Event::Notification { payload, .. }) => {
            assert_eq!(payload["count"], 2);
            assert_eq!(payload["skus"], json!(["EMPTY-1", "SCN-1"]));
        }
        other => panic!("expected reorder_alert notification, got {:?}", other),
    }
}

#[tokio::test]
async fn one_failing_item_degrades_without_failing_the_run() {
    let app = TestApp::new().await;
    for (sku, stock) in [("A-1", 1), ("B-1", 0), ("C-1", 8)] {
        app.create_item(sku, stock, 10, json!({ "reorder_qty": 20 }))
            .await;
    }

    let services = &app.state.services;
    let advisor = advisor_with(
        &app,
        services.inventory.clone(),
        Arc::new(FlakySales {
            inner: services.sales.clone(),
            failing_sku: "B-1",
        }),
    );

    let report = advisor
        .compute_reorder_suggestions_at(today())
        .await
        .expect("run succeeds despite one failure");

    let skus: Vec<&str> = report.suggestions.iter().map(|s| s.sku.as_str()).collect();
    assert_eq!(skus, vec!["A-1", "B-1", "C-1"]);

    let degraded = &report.suggestions[1];
    assert!(degraded.calculation_error);
    assert_eq!(degraded.urgency_score, 5.0);
    assert_eq!(degraded.recommended_order_qty, 20);
    assert!(degraded.analytics.is_none());
    assert!(degraded
        .error
        .as_deref()
        .is_some_and(|e| e.contains("sales store unavailable")));

    assert!(!report.suggestions[0].calculation_error);
    assert!(!report.suggestions[2].calculation_error);
    assert_eq!(report.summary.degraded_items, 1);
    // only A-1 reaches the urgent threshold
    assert_eq!(report.summary.alerts_created, 1);
}

#[tokio::test]
async fn unavailable_inventory_fails_the_run() {
    let app = TestApp::new().await;
    let sales = app.state.services.sales.clone();
    let advisor = advisor_with(&app, Arc::new(BrokenInventory), sales);

    let err = advisor
        .compute_reorder_suggestions_at(today())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::DependencyUnavailable(_));
    assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn suggestions_endpoint_runs_the_advisor() {
    let app = TestApp::new().await;

    let body = response_json(app.get("/api/v1/reorder/suggestions").await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["summary"]["total_items"], 0);
    assert!(app.wait_for_event("reorder_alert").await.is_none());

    app.create_item("OUT-1", 0, 5, json!({ "reorder_qty": 12 })).await;
    app.create_item("OK-1", 50, 5, json!({})).await;

    let response = app.get("/api/v1/reorder/suggestions").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let suggestions = body["data"]["suggestions"].as_array().expect("suggestions");
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["sku"], "OUT-1");
    assert_eq!(suggestions[0]["recommended_order_qty"], 12);
    assert_eq!(suggestions[0]["urgency_score"], 10.0);
    assert_eq!(suggestions[0]["calculation_error"], false);

    let alerts = response_json(app.get("/api/v1/alerts?resolved=false").await).await;
    assert_eq!(alerts["data"]["pagination"]["total"], 1);
    let alert = &alerts["data"]["data"][0];
    assert_eq!(alert["alert_type"], "reorder_required");
    assert_eq!(alert["sku"], "OUT-1");

    let alert_id = alert["id"].as_str().expect("alert id").to_string();
    let response = app
        .post(&format!("/api/v1/alerts/{}/resolve", alert_id), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let resolved = response_json(response).await;
    assert_eq!(resolved["data"]["is_resolved"], true);
    assert!(resolved["data"]["resolved_at"].is_string());

    let open = response_json(app.get("/api/v1/alerts?resolved=false").await).await;
    assert_eq!(open["data"]["pagination"]["total"], 0);
}
