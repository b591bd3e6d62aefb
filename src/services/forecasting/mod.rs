//! Thin proxy over the external forecasting service plus local storage of
//! its predictions.

pub mod accuracy;
pub mod client;

use crate::{
    entities::forecast::{self, Entity as ForecastEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{inventory::find_item, reorder::ForecastAggregate, sales::SalesService},
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub use accuracy::{AccuracyReport, ForecastQuality};
pub use client::{ForecastClient, PredictedPoint, PredictionSet};

pub const DEFAULT_HORIZON_DAYS: u32 = 30;
pub const MAX_HORIZON_DAYS: u32 = 365;

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RefreshForecastParams {
    /// Days to forecast (1..=365, default 30)
    pub horizon_days: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ForecastWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DemandDay {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ForecastSummary {
    pub horizon_days: usize,
    pub total_predicted_demand: f64,
    pub avg_daily_demand: f64,
    pub peak_demand: DemandDay,
    pub low_demand: DemandDay,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ForecastView {
    pub sku: String,
    pub model_name: Option<String>,
    pub points: Vec<forecast::Model>,
    /// Absent when no points are stored for the window
    pub summary: Option<ForecastSummary>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Totals, daily average and the highest and lowest day of a forecast.
pub fn summarize(points: &[forecast::Model]) -> Option<ForecastSummary> {
    let first = points.first()?;
    let mut peak = first;
    let mut low = first;
    let mut total = 0.0;

    for point in points {
        total += point.predicted_qty;
        if point.predicted_qty > peak.predicted_qty {
            peak = point;
        }
        if point.predicted_qty < low.predicted_qty {
            low = point;
        }
    }

    Some(ForecastSummary {
        horizon_days: points.len(),
        total_predicted_demand: round2(total),
        avg_daily_demand: round2(total / points.len() as f64),
        peak_demand: DemandDay {
            date: peak.forecast_date,
            value: round2(peak.predicted_qty),
        },
        low_demand: DemandDay {
            date: low.forecast_date,
            value: round2(low.predicted_qty),
        },
    })
}

/// Service storing and serving demand forecasts
#[derive(Clone)]
pub struct ForecastingService {
    db_pool: Arc<DatabaseConnection>,
    client: ForecastClient,
    sales: Arc<SalesService>,
    event_sender: EventSender,
}

impl ForecastingService {
    pub fn new(
        db_pool: Arc<DatabaseConnection>,
        client: ForecastClient,
        sales: Arc<SalesService>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db_pool,
            client,
            sales,
            event_sender,
        }
    }

    pub fn client(&self) -> &ForecastClient {
        &self.client
    }

    pub async fn refresh_forecast(
        &self,
        sku: &str,
        horizon_days: Option<u32>,
    ) -> Result<ForecastView, ServiceError> {
        self.refresh_forecast_at(sku, horizon_days, Utc::now().date_naive())
            .await
    }

    /// Fetches fresh predictions and replaces stored points dated `today` or later.
    /// Earlier points are kept for accuracy evaluation.
    #[instrument(skip(self))]
    pub async fn refresh_forecast_at(
        &self,
        sku: &str,
        horizon_days: Option<u32>,
        today: NaiveDate,
    ) -> Result<ForecastView, ServiceError> {
        let horizon = horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS);
        if !(1..=MAX_HORIZON_DAYS).contains(&horizon) {
            return Err(ServiceError::ValidationError(format!(
                "horizon_days must be between 1 and {}",
                MAX_HORIZON_DAYS
            )));
        }

        find_item(&*self.db_pool, sku).await?;
        let predictions = self.client.predict(sku, horizon).await?;

        let created_at = Utc::now();
        let models: Vec<forecast::ActiveModel> = predictions
            .points
            .iter()
            .filter(|p| p.date >= today)
            .map(|p| forecast::ActiveModel {
                id: Set(Uuid::new_v4()),
                sku: Set(sku.to_string()),
                forecast_date: Set(p.date),
                predicted_qty: Set(p.yhat.max(0.0)),
                lower_bound: Set(p.yhat_lower.map(|v| v.max(0.0))),
                upper_bound: Set(p.yhat_upper.map(|v| v.max(0.0))),
                model_name: Set(predictions.model_name.clone()),
                created_at: Set(created_at),
            })
            .collect();
        let stored = models.len();
        if stored < predictions.points.len() {
            debug!(
                dropped = predictions.points.len() - stored,
                "ignoring predictions dated before today"
            );
        }

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let superseded = ForecastEntity::delete_many()
            .filter(forecast::Column::Sku.eq(sku))
            .filter(forecast::Column::ForecastDate.gte(today))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if !models.is_empty() {
            ForecastEntity::insert_many(models)
                .exec(&txn)
                .await
                .map_err(ServiceError::db_error)?;
        }
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(
            sku = %sku,
            stored,
            superseded = superseded.rows_affected,
            model = %predictions.model_name,
            "Forecast refreshed"
        );
        self.event_sender
            .send_or_log(Event::ForecastRefreshed {
                sku: sku.to_string(),
                points: stored,
                model_name: predictions.model_name.clone(),
            })
            .await;

        self.list_forecast(
            sku,
            ForecastWindow {
                from: Some(today),
                to: None,
            },
        )
        .await
    }

    /// Stored points for a sku, oldest first, with a summary
    #[instrument(skip(self))]
    pub async fn list_forecast(
        &self,
        sku: &str,
        window: ForecastWindow,
    ) -> Result<ForecastView, ServiceError> {
        find_item(&*self.db_pool, sku).await?;

        let mut query = ForecastEntity::find().filter(forecast::Column::Sku.eq(sku));
        if let Some(from) = window.from {
            query = query.filter(forecast::Column::ForecastDate.gte(from));
        }
        if let Some(to) = window.to {
            query = query.filter(forecast::Column::ForecastDate.lte(to));
        }

        let points = query
            .order_by_asc(forecast::Column::ForecastDate)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let model_name = points.last().map(|p| p.model_name.clone());
        let summary = summarize(&points);

        Ok(ForecastView {
            sku: sku.to_string(),
            model_name,
            points,
            summary,
        })
    }

    /// Sum of predicted quantity for `[from, to]`
    #[instrument(skip(self))]
    pub async fn sum_forecast(
        &self,
        sku: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<f64, ServiceError> {
        let quantities: Vec<f64> = ForecastEntity::find()
            .select_only()
            .column(forecast::Column::PredictedQty)
            .filter(forecast::Column::Sku.eq(sku))
            .filter(forecast::Column::ForecastDate.between(from, to))
            .into_tuple::<f64>()
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        Ok(quantities.into_iter().sum())
    }

    pub async fn forecast_accuracy(&self, sku: &str) -> Result<AccuracyReport, ServiceError> {
        self.forecast_accuracy_at(sku, Utc::now().date_naive()).await
    }

    /// Scores stored predictions dated before `today` against actual daily sales
    #[instrument(skip(self))]
    pub async fn forecast_accuracy_at(
        &self,
        sku: &str,
        today: NaiveDate,
    ) -> Result<AccuracyReport, ServiceError> {
        find_item(&*self.db_pool, sku).await?;

        let past_points = ForecastEntity::find()
            .filter(forecast::Column::Sku.eq(sku))
            .filter(forecast::Column::ForecastDate.lt(today))
            .order_by_asc(forecast::Column::ForecastDate)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let (Some(first), Some(last)) = (past_points.first(), past_points.last()) else {
            return Err(ServiceError::ValidationError(format!(
                "no past forecast points stored for {}",
                sku
            )));
        };

        let mut actual_by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (date, quantity) in self
            .sales
            .daily_quantities(sku, first.forecast_date, last.forecast_date)
            .await?
        {
            *actual_by_day.entry(date).or_insert(0.0) += f64::from(quantity);
        }

        let predicted_by_day: HashMap<NaiveDate, f64> = past_points
            .iter()
            .map(|p| (p.forecast_date, p.predicted_qty))
            .collect();

        let observed: Vec<accuracy::ObservedDay> = actual_by_day
            .into_iter()
            .filter_map(|(date, actual)| {
                predicted_by_day
                    .get(&date)
                    .map(|predicted| accuracy::ObservedDay {
                        date,
                        actual,
                        predicted: *predicted,
                    })
            })
            .collect();

        let report = accuracy::evaluate(sku, &observed).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "no overlapping dates between sales and forecasts for {}",
                sku
            ))
        })?;

        info!(
            sku = %sku,
            mape = report.metrics.mape,
            quality = %report.summary.forecast_quality,
            "Forecast accuracy evaluated"
        );
        Ok(report)
    }
}

#[async_trait]
impl ForecastAggregate for ForecastingService {
    async fn sum_forecast(
        &self,
        sku: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<f64, ServiceError> {
        ForecastingService::sum_forecast(self, sku, from, to).await
    }
}
