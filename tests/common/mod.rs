#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{json, Value};
use smart_inventory_api::{
    config::AppConfig,
    db,
    entities::forecast,
    events::{Event, EventSender},
    handlers::AppServices,
    AppState,
};
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

/// Address nothing listens on; the forecast client fails fast against it.
pub const UNREACHABLE_FORECAST_URL: &str = "http://127.0.0.1:9";

/// Helper harness for spinning up an application state backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    events: Arc<Mutex<Vec<Event>>>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_forecast_url(UNREACHABLE_FORECAST_URL).await
    }

    /// Same as [`TestApp::new`] but pointing the forecast client at `forecast_url`.
    pub async fn with_forecast_url(forecast_url: &str) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // one connection keeps every query on the same in-memory database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.forecast_service_url = forecast_url.to_string();
        cfg.forecast_timeout_secs = 2;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, mut event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let event_task = tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                sink.lock().await.push(event);
            }
        });

        let services = AppServices::from_config(db_arc.clone(), event_sender.clone(), &cfg)
            .expect("services for tests");

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        Self {
            router: smart_inventory_api::app_router(state.clone()),
            state,
            events,
            _event_task: event_task,
        }
    }

    /// Send a request against the router.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Response {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// Waits briefly for an event with the given name to reach the event channel.
    pub async fn wait_for_event(&self, name: &str) -> Option<Event> {
        for _ in 0..50 {
            if let Some(event) = self
                .events
                .lock()
                .await
                .iter()
                .find(|e| e.name() == name)
                .cloned()
            {
                return Some(event);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        None
    }

    pub async fn create_supplier(&self, name: &str, lead_time_days: Option<i32>, min_order_qty: Option<i32>) -> Uuid {
        let response = self
            .post(
                "/api/v1/suppliers",
                json!({
                    "name": name,
                    "lead_time_days": lead_time_days,
                    "min_order_qty": min_order_qty,
                    "email": "orders@supplier.test"
                }),
            )
            .await;
        assert_eq!(response.status(), 201, "supplier creation failed");
        let body = response_json(response).await;
        body["data"]["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("supplier id")
    }

    /// Creates an item through the API; `extra` fields are merged into the payload.
    pub async fn create_item(&self, sku: &str, current_stock: i32, reorder_point: i32, extra: Value) -> Value {
        let mut payload = json!({
            "sku": sku,
            "name": format!("Item {}", sku),
            "cost_price": "4.50",
            "current_stock": current_stock,
            "reorder_point": reorder_point,
        });
        if let (Some(target), Some(fields)) = (payload.as_object_mut(), extra.as_object()) {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }

        let response = self.post("/api/v1/inventory", payload).await;
        assert_eq!(response.status(), 201, "item creation failed for {}", sku);
        response_json(response).await["data"].clone()
    }

    pub async fn record_sale(&self, sku: &str, quantity: i32, sale_date: NaiveDate) {
        let response = self
            .post(
                "/api/v1/sales",
                json!({
                    "sku": sku,
                    "quantity": quantity,
                    "unit_price": "9.99",
                    "sale_date": sale_date,
                }),
            )
            .await;
        assert_eq!(response.status(), 201, "sale for {} failed", sku);
    }

    /// Stores a forecast point directly, bypassing the forecasting service.
    pub async fn seed_forecast(&self, sku: &str, date: NaiveDate, predicted_qty: f64) {
        forecast::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(sku.to_string()),
            forecast_date: Set(date),
            predicted_qty: Set(predicted_qty),
            lower_bound: Set(None),
            upper_bound: Set(None),
            model_name: Set("seeded".to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed forecast point");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
