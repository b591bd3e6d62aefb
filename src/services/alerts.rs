use crate::{
    entities::alert::{self, AlertSeverity, AlertType, Entity as AlertEntity},
    errors::ServiceError,
    events::{Event, EventSender},
    services::reorder::AlertSink,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Alert to be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewAlert {
    pub sku: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AlertFilter {
    /// Only resolved (true) or open (false) alerts
    pub resolved: Option<bool>,
    pub sku: Option<String>,
}

/// Service for alert persistence and lifecycle
#[derive(Clone)]
pub struct AlertService {
    db_pool: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl AlertService {
    pub fn new(db_pool: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, new_alert), fields(sku = %new_alert.sku))]
    pub async fn create_alert(&self, new_alert: NewAlert) -> Result<alert::Model, ServiceError> {
        let db = &*self.db_pool;

        let model = alert::ActiveModel {
            id: Set(Uuid::new_v4()),
            sku: Set(new_alert.sku),
            alert_type: Set(new_alert.alert_type),
            severity: Set(new_alert.severity),
            title: Set(new_alert.title),
            message: Set(new_alert.message),
            metadata: Set(Some(new_alert.metadata)),
            is_resolved: Set(false),
            created_at: Set(Utc::now()),
            resolved_at: Set(None),
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to insert alert");
            ServiceError::db_error(e)
        })?;

        info!(alert_id = %model.id, alert_type = model.alert_type.as_str(), "Alert created");
        self.event_sender
            .send_or_log(Event::AlertCreated {
                alert_id: model.id,
                sku: model.sku.clone(),
            })
            .await;

        Ok(model)
    }

    /// Lists alerts newest first
    #[instrument(skip(self))]
    pub async fn list_alerts(
        &self,
        filter: AlertFilter,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<alert::Model>, u64), ServiceError> {
        let db = &*self.db_pool;

        let mut query = AlertEntity::find();
        if let Some(resolved) = filter.resolved {
            query = query.filter(alert::Column::IsResolved.eq(resolved));
        }
        if let Some(sku) = filter.sku.filter(|s| !s.is_empty()) {
            query = query.filter(alert::Column::Sku.eq(sku));
        }

        let paginator = query
            .order_by_desc(alert::Column::CreatedAt)
            .paginate(db, per_page.max(1));

        let total = paginator.num_items().await.map_err(ServiceError::db_error)?;
        let alerts = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(ServiceError::db_error)?;

        Ok((alerts, total))
    }

    /// Marks an alert resolved. Resolving twice is a no-op.
    #[instrument(skip(self))]
    pub async fn resolve_alert(&self, id: Uuid) -> Result<alert::Model, ServiceError> {
        let db = &*self.db_pool;

        let existing = AlertEntity::find_by_id(id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("alert {} not found", id)))?;

        if existing.is_resolved {
            return Ok(existing);
        }

        let mut active: alert::ActiveModel = existing.into();
        active.is_resolved = Set(true);
        active.resolved_at = Set(Some(Utc::now()));
        let updated = active.update(db).await.map_err(ServiceError::db_error)?;

        info!(alert_id = %id, "Alert resolved");
        Ok(updated)
    }
}

#[async_trait]
impl AlertSink for AlertService {
    async fn create_alert(&self, alert: NewAlert) -> Result<(), ServiceError> {
        AlertService::create_alert(self, alert).await.map(|_| ())
    }
}
