use crate::{
    entities::{
        forecast, inventory_item::{self, Entity as InventoryItemEntity}, sales_record,
        supplier::{self, Entity as SupplierEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::reorder::{InventoryQuery, LowStockItem, SupplierTerms},
};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Input for creating an inventory item
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInventoryItem {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub category: Option<String>,
    #[serde(default)]
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = String, example = "12.50")]
    pub cost_price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub current_stock: i32,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub reorder_point: i32,
    #[validate(range(min = 0))]
    pub reorder_qty: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub lead_time_days: Option<i32>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub safety_stock: i32,
    pub supplier_id: Option<Uuid>,
    #[serde(default)]
    pub auto_reorder: bool,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateInventoryItem {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub category: Option<String>,
    #[validate(custom = "validate_non_negative")]
    #[schema(value_type = Option<String>)]
    pub cost_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub current_stock: Option<i32>,
    #[validate(range(min = 0))]
    pub reorder_point: Option<i32>,
    #[validate(range(min = 0))]
    pub reorder_qty: Option<i32>,
    #[validate(range(min = 0, max = 365))]
    pub lead_time_days: Option<i32>,
    #[validate(range(min = 0))]
    pub safety_stock: Option<i32>,
    pub supplier_id: Option<Uuid>,
    pub auto_reorder: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReceiveStock {
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventoryFilter {
    pub category: Option<String>,
    /// Case-sensitive substring match on sku or name
    pub search: Option<String>,
}

/// Service for managing inventory items
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    /// Creates a new inventory service instance
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Lists inventory items ordered by sku
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        filter: InventoryFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<inventory_item::Model>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = InventoryItemEntity::find();
        if let Some(category) = filter.category.filter(|c| !c.is_empty()) {
            query = query.filter(inventory_item::Column::Category.eq(category));
        }
        if let Some(search) = filter.search.filter(|s| !s.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(inventory_item::Column::Sku.contains(search.as_str()))
                    .add(inventory_item::Column::Name.contains(search.as_str())),
            );
        }

        let paginator = query
            .order_by_asc(inventory_item::Column::Sku)
            .paginate(db, per_page.max(1));

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Database error when counting inventory items");
            ServiceError::db_error(e)
        })?;

        let items = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(page = %page, per_page = %per_page, error = %e, "Database error when fetching inventory items");
                ServiceError::db_error(e)
            })?;

        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, sku: &str) -> Result<inventory_item::Model, ServiceError> {
        find_item(&*self.db_pool, sku).await
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_item(
        &self,
        input: CreateInventoryItem,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        let sku = input.sku.trim().to_string();
        if sku.is_empty() {
            return Err(ServiceError::ValidationError("sku must not be blank".into()));
        }

        if InventoryItemEntity::find_by_id(sku.clone())
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "inventory item {} already exists",
                sku
            )));
        }

        if let Some(supplier_id) = input.supplier_id {
            ensure_supplier_exists(db, supplier_id).await?;
        }

        let now = Utc::now();
        let model = inventory_item::ActiveModel {
            sku: Set(sku.clone()),
            name: Set(input.name.trim().to_string()),
            category: Set(input.category),
            cost_price: Set(input.cost_price),
            current_stock: Set(input.current_stock),
            reorder_point: Set(input.reorder_point),
            reorder_qty: Set(input.reorder_qty),
            lead_time_days: Set(input.lead_time_days),
            safety_stock: Set(input.safety_stock),
            supplier_id: Set(input.supplier_id),
            auto_reorder: Set(input.auto_reorder),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert inventory item");
            ServiceError::db_error(e)
        })?;

        info!(sku = %model.sku, "Inventory item created");
        self.event_sender
            .send_or_log(Event::InventoryItemCreated { sku })
            .await;

        Ok(model)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_item(
        &self,
        sku: &str,
        patch: UpdateInventoryItem,
    ) -> Result<inventory_item::Model, ServiceError> {
        patch.validate()?;
        let db = &*self.db_pool;

        let existing = find_item(db, sku).await?;
        if let Some(supplier_id) = patch.supplier_id {
            ensure_supplier_exists(db, supplier_id).await?;
        }

        let mut active: inventory_item::ActiveModel = existing.into();
        if let Some(name) = patch.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(category) = patch.category {
            active.category = Set(Some(category));
        }
        if let Some(cost_price) = patch.cost_price {
            active.cost_price = Set(cost_price);
        }
        if let Some(current_stock) = patch.current_stock {
            active.current_stock = Set(current_stock);
        }
        if let Some(reorder_point) = patch.reorder_point {
            active.reorder_point = Set(reorder_point);
        }
        if let Some(reorder_qty) = patch.reorder_qty {
            active.reorder_qty = Set(Some(reorder_qty));
        }
        if let Some(lead_time_days) = patch.lead_time_days {
            active.lead_time_days = Set(Some(lead_time_days));
        }
        if let Some(safety_stock) = patch.safety_stock {
            active.safety_stock = Set(safety_stock);
        }
        if let Some(supplier_id) = patch.supplier_id {
            active.supplier_id = Set(Some(supplier_id));
        }
        if let Some(auto_reorder) = patch.auto_reorder {
            active.auto_reorder = Set(auto_reorder);
        }

        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(sku = %updated.sku, "Inventory item updated");
        self.event_sender
            .send_or_log(Event::InventoryItemUpdated {
                sku: updated.sku.clone(),
            })
            .await;

        Ok(updated)
    }

    /// Deletes the item together with its sales and forecast history
    #[instrument(skip(self))]
    pub async fn delete_item(&self, sku: &str) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        find_item(&txn, sku).await?;

        sales_record::Entity::delete_many()
            .filter(sales_record::Column::Sku.eq(sku))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        forecast::Entity::delete_many()
            .filter(forecast::Column::Sku.eq(sku))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        InventoryItemEntity::delete_by_id(sku.to_string())
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(sku = %sku, "Inventory item deleted");
        self.event_sender
            .send_or_log(Event::InventoryItemDeleted {
                sku: sku.to_string(),
            })
            .await;

        Ok(())
    }

    /// Books received goods onto the item's stock
    #[instrument(skip(self))]
    pub async fn receive_stock(
        &self,
        sku: &str,
        quantity: i32,
    ) -> Result<inventory_item::Model, ServiceError> {
        ReceiveStock { quantity }.validate()?;

        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;
        let existing = find_item(&txn, sku).await?;
        let new_stock = existing.current_stock.checked_add(quantity).ok_or_else(|| {
            ServiceError::BadRequest(format!("receiving {} would overflow stock", quantity))
        })?;

        let mut active: inventory_item::ActiveModel = existing.into();
        active.current_stock = Set(new_stock);
        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(sku = %sku, quantity, new_stock, "Stock received");
        self.event_sender
            .send_or_log(Event::StockReceived {
                sku: sku.to_string(),
                quantity,
                new_stock,
            })
            .await;

        Ok(updated)
    }

    /// Items at or below their reorder point, lowest stock first then by sku
    #[instrument(skip(self))]
    pub async fn list_low_stock(&self) -> Result<Vec<LowStockItem>, ServiceError> {
        let db = &*self.db_pool;

        let rows = InventoryItemEntity::find()
            .filter(
                Expr::col((InventoryItemEntity, inventory_item::Column::CurrentStock))
                    .lte(Expr::col((InventoryItemEntity, inventory_item::Column::ReorderPoint))),
            )
            .order_by_asc(inventory_item::Column::CurrentStock)
            .order_by_asc(inventory_item::Column::Sku)
            .find_also_related(SupplierEntity)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Low-stock query failed");
                ServiceError::db_error(e)
            })?;

        Ok(rows
            .into_iter()
            .map(|(item, supplier)| to_low_stock_item(item, supplier))
            .collect())
    }
}

#[async_trait]
impl InventoryQuery for InventoryService {
    async fn list_low_stock(&self) -> Result<Vec<LowStockItem>, ServiceError> {
        InventoryService::list_low_stock(self).await
    }
}

fn to_low_stock_item(item: inventory_item::Model, supplier: Option<supplier::Model>) -> LowStockItem {
    LowStockItem {
        sku: item.sku,
        name: item.name,
        current_stock: item.current_stock,
        reorder_point: item.reorder_point,
        reorder_qty: item.reorder_qty,
        lead_time_days: item.lead_time_days,
        safety_stock: item.safety_stock,
        supplier: supplier.map(|s| SupplierTerms {
            id: s.id,
            name: s.name,
            lead_time_days: s.lead_time_days,
            min_order_qty: s.min_order_qty,
        }),
    }
}

pub(crate) async fn find_item<C: ConnectionTrait>(
    db: &C,
    sku: &str,
) -> Result<inventory_item::Model, ServiceError> {
    InventoryItemEntity::find_by_id(sku.to_string())
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("inventory item {} not found", sku)))
}

async fn ensure_supplier_exists<C: ConnectionTrait>(
    db: &C,
    supplier_id: Uuid,
) -> Result<(), ServiceError> {
    SupplierEntity::find_by_id(supplier_id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .map(|_| ())
        .ok_or_else(|| ServiceError::NotFound(format!("supplier {} not found", supplier_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn valid_input() -> CreateInventoryItem {
        CreateInventoryItem {
            sku: "SKU-1".into(),
            name: "Widget".into(),
            category: None,
            cost_price: dec!(12.50),
            current_stock: 10,
            reorder_point: 5,
            reorder_qty: None,
            lead_time_days: None,
            safety_stock: 0,
            supplier_id: None,
            auto_reorder: false,
        }
    }

    #[test]
    fn create_input_validation() {
        assert!(valid_input().validate().is_ok());

        let mut blank_name = valid_input();
        blank_name.name = String::new();
        assert!(blank_name.validate().is_err());

        let mut negative_stock = valid_input();
        negative_stock.current_stock = -1;
        assert!(negative_stock.validate().is_err());

        let mut negative_price = valid_input();
        negative_price.cost_price = dec!(-1);
        assert!(negative_price.validate().is_err());
    }

    #[test]
    fn receive_requires_positive_quantity() {
        assert!(ReceiveStock { quantity: 0 }.validate().is_err());
        assert!(ReceiveStock { quantity: 3 }.validate().is_ok());
    }

    #[test]
    fn low_stock_row_carries_supplier_terms() {
        let now = Utc::now();
        let supplier_id = Uuid::new_v4();
        let item = inventory_item::Model {
            sku: "SKU-1".into(),
            name: "Widget".into(),
            category: None,
            cost_price: Decimal::ZERO,
            current_stock: 2,
            reorder_point: 5,
            reorder_qty: Some(10),
            lead_time_days: Some(4),
            safety_stock: 1,
            supplier_id: Some(supplier_id),
            auto_reorder: false,
            created_at: now,
            updated_at: None,
        };
        let supplier = supplier::Model {
            id: supplier_id,
            name: "Acme".into(),
            lead_time_days: Some(9),
            min_order_qty: Some(25),
            contact_name: None,
            email: None,
            phone: None,
            created_at: now,
            updated_at: None,
        };

        let row = to_low_stock_item(item, Some(supplier));
        let terms = row.supplier.unwrap();
        assert_eq!(terms.lead_time_days, Some(9));
        assert_eq!(terms.min_order_qty, Some(25));
        assert_eq!(row.lead_time_days, Some(4));
    }
}
