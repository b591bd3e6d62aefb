use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A stocked product, keyed by SKU.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "inventory_items")]
#[schema(as = InventoryItem)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    #[schema(value_type = String, example = "12.50")]
    pub cost_price: Decimal,
    pub current_stock: i32,
    pub reorder_point: i32,
    /// Static reorder quantity; falls back to the supplier minimum when unset
    pub reorder_qty: Option<i32>,
    /// Item lead time; a supplier lead time takes precedence
    pub lead_time_days: Option<i32>,
    pub safety_stock: i32,
    pub supplier_id: Option<Uuid>,
    pub auto_reorder: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id",
        on_delete = "SetNull"
    )]
    Supplier,
    #[sea_orm(has_many = "super::sales_record::Entity")]
    SalesRecords,
    #[sea_orm(has_many = "super::forecast::Entity")]
    Forecasts,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::sales_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SalesRecords.def()
    }
}

impl Related<super::forecast::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Forecasts.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(Some(now));

        Ok(active_model)
    }
}
