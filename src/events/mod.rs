use crate::errors::ServiceError;
use crate::services::reorder::NotificationSink;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub mod webhook;

pub use webhook::{NotificationWebhook, WebhookEnvelope};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }

    /// Enqueues an event without waiting; fails when the channel is full or closed
    pub fn try_send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(ev) => ServiceError::EventError(format!(
                "event channel full, dropping {}",
                ev.name()
            )),
            mpsc::error::TrySendError::Closed(ev) => ServiceError::EventError(format!(
                "event channel closed, dropping {}",
                ev.name()
            )),
        })
    }

    /// Sends an event, logging instead of failing when the channel is closed
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = %name, error = %e, "dropping event");
        }
    }
}

#[async_trait]
impl NotificationSink for EventSender {
    async fn publish(
        &self,
        event_name: &str,
        payload: serde_json::Value,
    ) -> Result<(), ServiceError> {
        // fire-and-forget: a full channel must not stall the caller
        self.try_send(Event::Notification {
            name: event_name.to_string(),
            payload,
        })
    }
}

/// Domain events emitted by the services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    InventoryItemCreated {
        sku: String,
    },
    InventoryItemUpdated {
        sku: String,
    },
    InventoryItemDeleted {
        sku: String,
    },
    StockReceived {
        sku: String,
        quantity: i32,
        new_stock: i32,
    },
    SalesRecorded {
        sku: String,
        quantity: i32,
        remaining_stock: i32,
    },
    ForecastRefreshed {
        sku: String,
        points: usize,
        model_name: String,
    },
    AlertCreated {
        alert_id: Uuid,
        sku: String,
    },
    /// Free-form notification published through the notification sink
    Notification {
        name: String,
        payload: serde_json::Value,
    },
}

impl Event {
    pub fn name(&self) -> String {
        match self {
            Event::InventoryItemCreated { .. } => "inventory_item_created".into(),
            Event::InventoryItemUpdated { .. } => "inventory_item_updated".into(),
            Event::InventoryItemDeleted { .. } => "inventory_item_deleted".into(),
            Event::StockReceived { .. } => "stock_received".into(),
            Event::SalesRecorded { .. } => "sales_recorded".into(),
            Event::ForecastRefreshed { .. } => "forecast_refreshed".into(),
            Event::AlertCreated { .. } => "alert_created".into(),
            Event::Notification { name, .. } => name.clone(),
        }
    }

    pub fn payload(&self) -> serde_json::Value {
        match self {
            Event::InventoryItemCreated { sku }
            | Event::InventoryItemUpdated { sku }
            | Event::InventoryItemDeleted { sku } => json!({ "sku": sku }),
            Event::StockReceived {
                sku,
                quantity,
                new_stock,
            } => json!({ "sku": sku, "quantity": quantity, "new_stock": new_stock }),
            Event::SalesRecorded {
                sku,
                quantity,
                remaining_stock,
            } => json!({ "sku": sku, "quantity": quantity, "remaining_stock": remaining_stock }),
            Event::ForecastRefreshed {
                sku,
                points,
                model_name,
            } => json!({ "sku": sku, "points": points, "model_name": model_name }),
            Event::AlertCreated { alert_id, sku } => json!({ "alert_id": alert_id, "sku": sku }),
            Event::Notification { payload, .. } => payload.clone(),
        }
    }

    pub fn to_envelope(&self) -> WebhookEnvelope {
        WebhookEnvelope {
            event: self.name(),
            payload: self.payload(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Drains the event channel, logging every event and forwarding it to the
/// notification webhook when one is configured.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, webhook: Option<Arc<NotificationWebhook>>) {
    info!(
        webhook = webhook.as_ref().map(|w| w.url()).unwrap_or("disabled"),
        "Starting event processing loop"
    );

    while let Some(event) = rx.recv().await {
        match &event {
            Event::Notification { name, payload } => {
                warn!(event = %name, payload = %payload, "notification published");
            }
            other => info!(event = %other.name(), payload = %other.payload(), "event received"),
        }

        if let Some(webhook) = webhook.clone() {
            let envelope = event.to_envelope();
            tokio::spawn(async move {
                if let Err(e) = webhook.deliver(&envelope).await {
                    error!(event = %envelope.event, error = %e, "notification delivery failed");
                }
            });
        }
    }

    info!("Event channel closed; event processing loop stopped");
}
