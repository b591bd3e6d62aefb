pub mod alerts;
pub mod common;
pub mod forecasts;
pub mod inventory;
pub mod reorder;
pub mod sales;
pub mod suppliers;

use crate::{
    config::{AppConfig, ReorderConfig},
    db::DbPool,
    errors::ServiceError,
    events::EventSender,
    services::{
        alerts::AlertService,
        forecasting::{ForecastClient, ForecastingService},
        inventory::InventoryService,
        reorder::ReorderAdvisor,
        sales::SalesService,
        suppliers::SupplierService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub suppliers: Arc<SupplierService>,
    pub sales: Arc<SalesService>,
    pub forecasting: Arc<ForecastingService>,
    pub alerts: Arc<AlertService>,
    pub reorder: Arc<ReorderAdvisor>,
}

impl AppServices {
    /// Wires every service over one pool and event channel. The reorder advisor
    /// reads through the same services the HTTP handlers use.
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        forecast_client: ForecastClient,
        reorder_settings: ReorderConfig,
    ) -> Self {
        let inventory = Arc::new(InventoryService::new(
            db_pool.clone(),
            event_sender.clone(),
        ));
        let suppliers = Arc::new(SupplierService::new(db_pool.clone()));
        let sales = Arc::new(SalesService::new(db_pool.clone(), event_sender.clone()));
        let forecasting = Arc::new(ForecastingService::new(
            db_pool.clone(),
            forecast_client,
            sales.clone(),
            event_sender.clone(),
        ));
        let alerts = Arc::new(AlertService::new(db_pool, event_sender.clone()));

        let reorder = Arc::new(ReorderAdvisor::new(
            inventory.clone(),
            sales.clone(),
            forecasting.clone(),
            alerts.clone(),
            Arc::new(event_sender),
            reorder_settings,
        ));

        Self {
            inventory,
            suppliers,
            sales,
            forecasting,
            alerts,
            reorder,
        }
    }

    /// Builds the container from application configuration
    pub fn from_config(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        config: &AppConfig,
    ) -> Result<Self, ServiceError> {
        let forecast_client =
            ForecastClient::new(config.forecast_service_url.clone(), config.forecast_timeout())?;
        Ok(Self::new(
            db_pool,
            event_sender,
            forecast_client,
            config.reorder.clone(),
        ))
    }
}
