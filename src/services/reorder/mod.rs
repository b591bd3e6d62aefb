//! Reorder advisor.
//!
//! Finds every item at or below its reorder point, blends forecast demand,
//! recent sales velocity and static reorder quantities into one recommended
//! order per item, ranks them by urgency, then raises alerts and a
//! notification for the urgent ones.
//!
//! A failure fetching the low-stock list fails the whole run. A failure
//! fetching an individual item's sales or forecast figures only degrades that
//! item: it keeps a conservative quantity and is flagged with
//! `calculation_error`.

pub mod calculator;
pub mod collaborators;

use crate::config::ReorderConfig;
use crate::entities::alert::{AlertSeverity, AlertType};
use crate::errors::ServiceError;
use crate::services::alerts::NewAlert;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use metrics::{counter, histogram};
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

pub use calculator::{calculate_reorder, ReorderCalculation, ReorderInputs};
pub use collaborators::{
    AlertSink, ForecastAggregate, InventoryQuery, LowStockItem, NotificationSink, SalesAggregate,
    SupplierTerms,
};

pub const REORDER_ALERT_EVENT: &str = "reorder_alert";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReorderError {
    #[error("inventory query unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("calculation degraded for {sku}: {reason}")]
    ItemCalculationDegraded { sku: String, reason: String },
}

impl From<ReorderError> for ServiceError {
    fn from(err: ReorderError) -> Self {
        match err {
            ReorderError::DependencyUnavailable(msg) => ServiceError::DependencyUnavailable(msg),
            ReorderError::ItemCalculationDegraded { sku, reason } => {
                ServiceError::InternalError(format!("calculation degraded for {}: {}", sku, reason))
            }
        }
    }
}

/// Figures behind a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReorderAnalytics {
    pub avg_daily_sales: f64,
    pub forecast_demand: f64,
    pub lead_time_days: u32,
    pub horizon_days: u32,
    pub safety_stock: i32,
    pub forecast_based_qty: f64,
    pub velocity_based_qty: f64,
    pub simple_qty: f64,
    pub min_order_qty: f64,
    pub stock_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReorderSuggestion {
    pub sku: String,
    pub name: String,
    pub current_stock: i32,
    pub reorder_point: i32,
    pub recommended_order_qty: i64,
    pub urgency_score: f64,
    /// Whole days of stock left at the current sales rate; null when unknown
    pub days_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<SupplierTerms>,
    /// Absent when the calculation degraded
    pub analytics: Option<ReorderAnalytics>,
    pub calculation_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReorderSummary {
    pub total_items: usize,
    pub urgent_items: usize,
    pub total_recommended_qty: i64,
    pub degraded_items: usize,
    pub alerts_created: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReorderReport {
    pub suggestions: Vec<ReorderSuggestion>,
    pub summary: ReorderSummary,
}

pub struct ReorderAdvisor {
    inventory: Arc<dyn InventoryQuery>,
    sales: Arc<dyn SalesAggregate>,
    forecasts: Arc<dyn ForecastAggregate>,
    alerts: Arc<dyn AlertSink>,
    notifier: Arc<dyn NotificationSink>,
    settings: ReorderConfig,
}

impl ReorderAdvisor {
    pub fn new(
        inventory: Arc<dyn InventoryQuery>,
        sales: Arc<dyn SalesAggregate>,
        forecasts: Arc<dyn ForecastAggregate>,
        alerts: Arc<dyn AlertSink>,
        notifier: Arc<dyn NotificationSink>,
        settings: ReorderConfig,
    ) -> Self {
        Self {
            inventory,
            sales,
            forecasts,
            alerts,
            notifier,
            settings,
        }
    }

    pub async fn compute_reorder_suggestions(&self) -> Result<ReorderReport, ServiceError> {
        self.compute_reorder_suggestions_at(Utc::now().date_naive())
            .await
    }

    /// Runs the advisor as of `today`.
    #[instrument(skip(self))]
    pub async fn compute_reorder_suggestions_at(
        &self,
        today: NaiveDate,
    ) -> Result<ReorderReport, ServiceError> {
        let started = std::time::Instant::now();
        counter!("reorder.runs", 1);

        let items = self.fetch_low_stock().await?;
        debug!(count = items.len(), "low-stock items fetched");

        let pending: Vec<_> = items
            .iter()
            .map(|item| self.evaluate_item(item, today).boxed())
            .collect();
        let outcomes: Vec<Result<ReorderSuggestion, ReorderError>> = stream::iter(pending)
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await;

        let mut suggestions: Vec<ReorderSuggestion> = outcomes
            .into_iter()
            .zip(items.iter())
            .map(|(outcome, item)| match outcome {
                Ok(suggestion) => suggestion,
                Err(err) => {
                    warn!(sku = %item.sku, error = %err, "reorder calculation degraded");
                    self.degraded_suggestion(item, err)
                }
            })
            .collect();

        // sort_by is stable, so ties keep retrieval order
        suggestions.sort_by(|a, b| b.urgency_score.total_cmp(&a.urgency_score));

        let urgent: Vec<&ReorderSuggestion> = suggestions
            .iter()
            .filter(|s| s.urgency_score >= self.settings.urgent_threshold)
            .collect();

        let alerts_created = self.raise_alerts(&urgent).await;
        self.notify(&urgent).await;

        let degraded_items = suggestions.iter().filter(|s| s.calculation_error).count();
        if degraded_items > 0 {
            counter!("reorder.degraded_items", degraded_items as u64);
        }
        histogram!("reorder.duration_seconds", started.elapsed().as_secs_f64());

        let summary = ReorderSummary {
            total_items: suggestions.len(),
            urgent_items: urgent.len(),
            total_recommended_qty: suggestions.iter().map(|s| s.recommended_order_qty).sum(),
            degraded_items,
            alerts_created,
            generated_at: Utc::now(),
        };

        info!(
            total = summary.total_items,
            urgent = summary.urgent_items,
            degraded = summary.degraded_items,
            "reorder suggestions computed"
        );

        Ok(ReorderReport {
            suggestions,
            summary,
        })
    }

    async fn fetch_low_stock(&self) -> Result<Vec<LowStockItem>, ReorderError> {
        let items = self
            .bounded("low-stock query", self.inventory.list_low_stock())
            .await
            .map_err(|reason| {
                error!(error = %reason, "reorder run aborted");
                ReorderError::DependencyUnavailable(reason)
            })?;

        // The query contract already guarantees this; enforce it anyway.
        Ok(items
            .into_iter()
            .filter(|item| item.current_stock <= item.reorder_point)
            .collect())
    }

    async fn evaluate_item(
        &self,
        item: &LowStockItem,
        today: NaiveDate,
    ) -> Result<ReorderSuggestion, ReorderError> {
        let supplier = item.supplier.as_ref();
        let lead_time_days = calculator::effective_lead_time(
            supplier.and_then(|s| s.lead_time_days),
            item.lead_time_days,
            self.settings.default_lead_time_days,
        );
        let horizon_days = lead_time_days + self.settings.safety_buffer_days;
        let horizon_end = today + ChronoDuration::days(i64::from(horizon_days));

        let (avg, forecast) = tokio::join!(
            self.bounded(
                "sales velocity query",
                self.sales
                    .avg_daily_sales(&item.sku, self.settings.sales_window_days, today),
            ),
            self.bounded(
                "forecast query",
                self.forecasts.sum_forecast(&item.sku, today, horizon_end),
            ),
        );

        let degraded = |reason: String| ReorderError::ItemCalculationDegraded {
            sku: item.sku.clone(),
            reason,
        };
        let avg_daily_sales = avg.map_err(degraded)?;
        let forecast_demand = forecast.map_err(degraded)?;

        let inputs = ReorderInputs {
            current_stock: item.current_stock,
            reorder_point: item.reorder_point,
            safety_stock: item.safety_stock,
            item_reorder_qty: item.reorder_qty,
            supplier_min_order_qty: supplier.and_then(|s| s.min_order_qty),
            horizon_days,
            avg_daily_sales,
            forecast_demand,
        };
        let calc = calculate_reorder(&inputs);

        Ok(ReorderSuggestion {
            sku: item.sku.clone(),
            name: item.name.clone(),
            current_stock: item.current_stock,
            reorder_point: item.reorder_point,
            recommended_order_qty: calc.recommended_qty,
            urgency_score: calc.urgency_score,
            days_remaining: calc.days_remaining,
            supplier: item.supplier.clone(),
            analytics: Some(ReorderAnalytics {
                avg_daily_sales: calculator::round2(avg_daily_sales),
                forecast_demand: calculator::round2(forecast_demand),
                lead_time_days,
                horizon_days,
                safety_stock: item.safety_stock,
                forecast_based_qty: calc.forecast_based_qty,
                velocity_based_qty: calc.velocity_based_qty,
                simple_qty: calc.simple_qty,
                min_order_qty: calc.min_order_qty,
                stock_ratio: calc.stock_ratio,
            }),
            calculation_error: false,
            error: None,
        })
    }

    fn degraded_suggestion(&self, item: &LowStockItem, err: ReorderError) -> ReorderSuggestion {
        let supplier_min = item.supplier.as_ref().and_then(|s| s.min_order_qty);

        ReorderSuggestion {
            sku: item.sku.clone(),
            name: item.name.clone(),
            current_stock: item.current_stock,
            reorder_point: item.reorder_point,
            recommended_order_qty: calculator::fallback_quantity(item.reorder_qty, supplier_min),
            urgency_score: self.settings.degraded_urgency,
            days_remaining: None,
            supplier: item.supplier.clone(),
            analytics: None,
            calculation_error: true,
            error: Some(err.to_string()),
        }
    }

    /// Persists one alert per urgent suggestion, capped at `max_alerts`.
    /// Sink failures are logged and skipped.
    async fn raise_alerts(&self, urgent: &[&ReorderSuggestion]) -> usize {
        let mut created = 0;

        for suggestion in urgent.iter().take(self.settings.max_alerts) {
            let alert = NewAlert {
                sku: suggestion.sku.clone(),
                alert_type: AlertType::ReorderRequired,
                severity: AlertSeverity::Warning,
                title: format!("Reorder required: {}", suggestion.name),
                message: format!(
                    "SKU {} has {} units on hand; recommended order quantity {} (urgency {:.2})",
                    suggestion.sku,
                    suggestion.current_stock,
                    suggestion.recommended_order_qty,
                    suggestion.urgency_score
                ),
                metadata: json!({
                    "sku": suggestion.sku,
                    "current_stock": suggestion.current_stock,
                    "reorder_point": suggestion.reorder_point,
                    "recommended_qty": suggestion.recommended_order_qty,
                    "urgency_score": suggestion.urgency_score,
                    "days_remaining": suggestion.days_remaining,
                }),
            };

            match self.alerts.create_alert(alert).await {
                Ok(()) => created += 1,
                Err(e) => error!(sku = %suggestion.sku, error = %e, "failed to create reorder alert"),
            }
        }

        created
    }

    async fn notify(&self, urgent: &[&ReorderSuggestion]) {
        if urgent.is_empty() {
            return;
        }

        let skus: Vec<&str> = urgent.iter().map(|s| s.sku.as_str()).collect();
        let payload = json!({ "count": urgent.len(), "skus": skus });

        if let Err(e) = self.notifier.publish(REORDER_ALERT_EVENT, payload).await {
            error!(error = %e, "failed to publish reorder notification");
        }
    }

    /// Applies the per-query timeout; errors come back as display strings.
    async fn bounded<T, F>(&self, what: &str, query: F) -> Result<T, String>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        let limit = self.settings.query_timeout();
        match tokio::time::timeout(limit, query).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(format!("{} failed: {}", what, e)),
            Err(_) => Err(format!("{} timed out after {:?}", what, limit)),
        }
    }
}
