use crate::{
    entities::{
        inventory_item,
        supplier::{self, Entity as SupplierEntity},
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSupplier {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(range(min = 0, max = 365))]
    pub lead_time_days: Option<i32>,
    #[validate(range(min = 0))]
    pub min_order_qty: Option<i32>,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplier {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(range(min = 0, max = 365))]
    pub lead_time_days: Option<i32>,
    #[validate(range(min = 0))]
    pub min_order_qty: Option<i32>,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DatabaseConnection>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DatabaseConnection>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let paginator = SupplierEntity::find()
            .order_by_asc(supplier::Column::Name)
            .paginate(&*self.db_pool, per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let suppliers = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((suppliers, total))
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(&self, id: Uuid) -> Result<supplier::Model, ServiceError> {
        find_supplier(&*self.db_pool, id).await
    }

    /// Creates a new supplier
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_supplier(
        &self,
        input: CreateSupplier,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;

        let now = Utc::now();
        let model = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            lead_time_days: Set(input.lead_time_days),
            min_order_qty: Set(input.min_order_qty),
            contact_name: Set(input.contact_name),
            email: Set(input.email),
            phone: Set(input.phone),
            created_at: Set(now),
            updated_at: Set(Some(now)),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert supplier");
            ServiceError::db_error(e)
        })?;

        info!(supplier_id = %model.id, "Supplier created");
        Ok(model)
    }

    /// Updates an existing supplier
    #[instrument(skip(self, patch))]
    pub async fn update_supplier(
        &self,
        id: Uuid,
        patch: UpdateSupplier,
    ) -> Result<supplier::Model, ServiceError> {
        patch.validate()?;

        let existing = find_supplier(&*self.db_pool, id).await?;
        let mut active: supplier::ActiveModel = existing.into();

        if let Some(name) = patch.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(lead_time_days) = patch.lead_time_days {
            active.lead_time_days = Set(Some(lead_time_days));
        }
        if let Some(min_order_qty) = patch.min_order_qty {
            active.min_order_qty = Set(Some(min_order_qty));
        }
        if let Some(contact_name) = patch.contact_name {
            active.contact_name = Set(Some(contact_name));
        }
        if let Some(email) = patch.email {
            active.email = Set(Some(email));
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(Some(phone));
        }

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        info!(supplier_id = %id, "Supplier updated");
        Ok(updated)
    }

    /// Deletes a supplier and detaches it from its items
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await.map_err(ServiceError::db_error)?;

        find_supplier(&txn, id).await?;

        let detached = inventory_item::Entity::update_many()
            .col_expr(
                inventory_item::Column::SupplierId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(inventory_item::Column::SupplierId.eq(id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        SupplierEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(supplier_id = %id, items_detached = detached.rows_affected, "Supplier deleted");
        Ok(())
    }
}

async fn find_supplier<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<supplier::Model, ServiceError> {
    SupplierEntity::find_by_id(id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| ServiceError::NotFound(format!("supplier {} not found", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supplier_input_validation() {
        let valid = CreateSupplier {
            name: "Acme".into(),
            lead_time_days: Some(5),
            min_order_qty: Some(10),
            contact_name: None,
            email: Some("orders@acme.test".into()),
            phone: None,
        };
        assert!(valid.validate().is_ok());

        let bad_email = CreateSupplier {
            email: Some("not-an-email".into()),
            ..valid.clone()
        };
        assert!(bad_email.validate().is_err());

        let negative_lead = CreateSupplier {
            lead_time_days: Some(-1),
            ..valid
        };
        assert!(negative_lead.validate().is_err());
    }
}
