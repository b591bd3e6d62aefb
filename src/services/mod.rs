// Core services
pub mod alerts;
pub mod inventory;
pub mod sales;
pub mod suppliers;

// Forecasting proxy and storage
pub mod forecasting;

// Reorder advisor
pub mod reorder;
