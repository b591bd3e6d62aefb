use crate::{
    entities::{inventory_item, sales_record::{self, Entity as SalesRecordEntity}},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{inventory::find_item, reorder::SalesAggregate},
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_unit_price(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("unit_price");
        err.message = Some("unit price must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// One sale to ingest
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct RecordSale {
    #[validate(length(min = 1))]
    pub sku: String,
    /// Defaults to today (UTC)
    pub sale_date: Option<NaiveDate>,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[serde(default)]
    #[validate(custom = "validate_unit_price")]
    #[schema(value_type = String, example = "19.99")]
    pub unit_price: Decimal,
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchRowError {
    pub index: usize,
    pub sku: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BatchIngestResult {
    pub processed: usize,
    pub failed: usize,
    pub errors: Vec<BatchRowError>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalesFilter {
    pub sku: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Mean of per-day totals, counting only days that had at least one sale.
pub fn average_daily_quantity<I>(rows: I) -> f64
where
    I: IntoIterator<Item = (NaiveDate, i32)>,
{
    let mut per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for (date, quantity) in rows {
        *per_day.entry(date).or_insert(0) += i64::from(quantity);
    }

    if per_day.is_empty() {
        return 0.0;
    }
    per_day.values().sum::<i64>() as f64 / per_day.len() as f64
}

/// Service for sales ingestion and history
#[derive(Clone)]
pub struct SalesService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl SalesService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Appends a sale and decrements stock (never below zero) in one transaction
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn record_sale(&self, input: RecordSale) -> Result<sales_record::Model, ServiceError> {
        input.validate()?;

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let item = find_item(&txn, &input.sku).await?;

        if input.quantity > item.current_stock {
            warn!(
                sku = %item.sku,
                requested = input.quantity,
                on_hand = item.current_stock,
                "sale exceeds recorded stock; clamping to zero"
            );
        }
        let remaining_stock = (item.current_stock - input.quantity).max(0);

        let record = sales_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(item.sku.clone()),
            sale_date: Set(input.sale_date.unwrap_or_else(|| Utc::now().date_naive())),
            quantity: Set(input.quantity),
            unit_price: Set(input.unit_price),
            order_id: Set(input.order_id),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        let mut active: inventory_item::ActiveModel = item.into();
        active.current_stock = Set(remaining_stock);
        active.update(&txn).await.map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        counter!("sales.ingested", 1);
        self.event_sender
            .send_or_log(Event::SalesRecorded {
                sku: record.sku.clone(),
                quantity: record.quantity,
                remaining_stock,
            })
            .await;

        Ok(record)
    }

    /// Records each row independently; failures are reported per row
    #[instrument(skip(self, records), fields(rows = records.len()))]
    pub async fn ingest_batch(&self, records: Vec<RecordSale>) -> BatchIngestResult {
        let mut processed = 0;
        let mut errors = Vec::new();

        for (index, record) in records.into_iter().enumerate() {
            let sku = record.sku.clone();
            match self.record_sale(record).await {
                Ok(_) => processed += 1,
                Err(e) => errors.push(BatchRowError {
                    index,
                    sku,
                    error: e.response_message(),
                }),
            }
        }

        info!(processed, failed = errors.len(), "Sales batch ingested");
        BatchIngestResult {
            processed,
            failed: errors.len(),
            errors,
        }
    }

    /// Lists sales newest first
    #[instrument(skip(self))]
    pub async fn list_sales(
        &self,
        filter: SalesFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<sales_record::Model>, u64), ServiceError> {
        let mut query = SalesRecordEntity::find();
        if let Some(sku) = filter.sku.filter(|s| !s.is_empty()) {
            query = query.filter(sales_record::Column::Sku.eq(sku));
        }
        if let Some(from) = filter.from {
            query = query.filter(sales_record::Column::SaleDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(sales_record::Column::SaleDate.lte(to));
        }

        let paginator = query
            .order_by_desc(sales_record::Column::SaleDate)
            .order_by_desc(sales_record::Column::CreatedAt)
            .paginate(&*self.db_pool, per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let sales = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((sales, total))
    }

    /// (date, quantity) pairs for a sku in an inclusive date window
    pub async fn daily_quantities(
        &self,
        sku: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, i32)>, ServiceError> {
        SalesRecordEntity::find()
            .select_only()
            .column(sales_record::Column::SaleDate)
            .column(sales_record::Column::Quantity)
            .filter(sales_record::Column::Sku.eq(sku))
            .filter(sales_record::Column::SaleDate.between(from, to))
            .into_tuple::<(NaiveDate, i32)>()
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn avg_daily_sales(
        &self,
        sku: &str,
        window_days: u32,
        today: NaiveDate,
    ) -> Result<f64, ServiceError> {
        // `window_days` calendar days ending with (and including) today
        let from = today - Duration::days(i64::from(window_days.saturating_sub(1)));
        let rows = self.daily_quantities(sku, from, today).await?;
        Ok(average_daily_quantity(rows))
    }
}

#[async_trait]
impl SalesAggregate for SalesService {
    async fn avg_daily_sales(
        &self,
        sku: &str,
        window_days: u32,
        today: NaiveDate,
    ) -> Result<f64, ServiceError> {
        SalesService::avg_daily_sales(self, sku, window_days, today).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn average_ignores_days_without_sales() {
        // two sales on the 1st, one on the 5th; nothing in between
        let avg = average_daily_quantity(vec![(d(1), 4), (d(1), 6), (d(5), 2)]);
        assert_eq!(avg, 6.0);
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average_daily_quantity(Vec::new()), 0.0);
    }

    #[test]
    fn record_sale_validation() {
        let sale = RecordSale {
            sku: "SKU-1".into(),
            sale_date: None,
            quantity: 0,
            unit_price: dec!(0),
            order_id: None,
        };
        assert!(sale.validate().is_err());

        let sale = RecordSale {
            quantity: 2,
            unit_price: dec!(-0.5),
            ..sale
        };
        assert!(sale.validate().is_err());

        let sale = RecordSale {
            quantity: 1,
            unit_price: dec!(3.99),
            ..sale
        };
        assert!(sale.validate().is_ok());
    }
}
