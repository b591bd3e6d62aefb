use crate::errors::ServiceError;
use crate::services::alerts::NewAlert;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Supplier terms that influence an item's reorder quantity.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SupplierTerms {
    pub id: Uuid,
    pub name: String,
    pub lead_time_days: Option<i32>,
    pub min_order_qty: Option<i32>,
}

/// An item at or below its reorder point, joined with its supplier.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LowStockItem {
    pub sku: String,
    pub name: String,
    pub current_stock: i32,
    pub reorder_point: i32,
    pub reorder_qty: Option<i32>,
    pub lead_time_days: Option<i32>,
    pub safety_stock: i32,
    pub supplier: Option<SupplierTerms>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InventoryQuery: Send + Sync {
    /// Items with `current_stock <= reorder_point`, ordered by stock then sku.
    async fn list_low_stock(&self) -> Result<Vec<LowStockItem>, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SalesAggregate: Send + Sync {
    /// Mean of per-day quantity sums over days with at least one sale in
    /// the `window_days` calendar days ending with `today`, that is
    /// `[today - (window_days - 1), today]`.
    async fn avg_daily_sales(
        &self,
        sku: &str,
        window_days: u32,
        today: NaiveDate,
    ) -> Result<f64, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastAggregate: Send + Sync {
    /// Sum of predicted quantities dated within `[from, to]`.
    async fn sum_forecast(
        &self,
        sku: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<f64, ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn create_alert(&self, alert: NewAlert) -> Result<(), ServiceError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(
        &self,
        event_name: &str,
        payload: serde_json::Value,
    ) -> Result<(), ServiceError>;
}
