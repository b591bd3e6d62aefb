use anyhow::Result;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::prelude::*;
use std::time::Duration;
use tracing::{error, info};

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_suppliers_table::Migration),
            Box::new(m20240101_000002_create_inventory_items_table::Migration),
            Box::new(m20240101_000003_create_sales_records_table::Migration),
            Box::new(m20240101_000004_create_forecasts_table::Migration),
            Box::new(m20240101_000005_create_alerts_table::Migration),
        ]
    }
}

mod m20240101_000001_create_suppliers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_suppliers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Suppliers::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::LeadTimeDays).integer().null())
                        .col(ColumnDef::new(Suppliers::MinOrderQty).integer().null())
                        .col(ColumnDef::new(Suppliers::ContactName).string().null())
                        .col(ColumnDef::new(Suppliers::Email).string().null())
                        .col(ColumnDef::new(Suppliers::Phone).string().null())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Suppliers {
        Table,
        Id,
        Name,
        LeadTimeDays,
        MinOrderQty,
        ContactName,
        Email,
        Phone,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_inventory_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_inventory_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryItems::Sku)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryItems::Name).string().not_null())
                        .col(ColumnDef::new(InventoryItems::Category).string().null())
                        .col(
                            ColumnDef::new(InventoryItems::CostPrice)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::CurrentStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::ReorderPoint)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryItems::ReorderQty).integer().null())
                        .col(ColumnDef::new(InventoryItems::LeadTimeDays).integer().null())
                        .col(
                            ColumnDef::new(InventoryItems::SafetyStock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(InventoryItems::SupplierId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryItems::AutoReorder)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_inventory_items_supplier_id")
                                .from(InventoryItems::Table, InventoryItems::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            // Low-stock scans filter on stock vs. reorder point
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_items_current_stock")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::CurrentStock)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_items_category")
                        .table(InventoryItems::Table)
                        .col(InventoryItems::Category)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryItems {
        Table,
        Sku,
        Name,
        Category,
        CostPrice,
        CurrentStock,
        ReorderPoint,
        ReorderQty,
        LeadTimeDays,
        SafetyStock,
        SupplierId,
        AutoReorder,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Suppliers {
        Table,
        Id,
    }
}

mod m20240101_000003_create_sales_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_sales_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SalesRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SalesRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(SalesRecords::Sku).string().not_null())
                        .col(ColumnDef::new(SalesRecords::SaleDate).date().not_null())
                        .col(ColumnDef::new(SalesRecords::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(SalesRecords::UnitPrice)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(SalesRecords::OrderId).string().null())
                        .col(
                            ColumnDef::new(SalesRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sales_records_sku")
                                .from(SalesRecords::Table, SalesRecords::Sku)
                                .to(InventoryItems::Table, InventoryItems::Sku)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_sales_records_sku_date")
                        .table(SalesRecords::Table)
                        .col(SalesRecords::Sku)
                        .col(SalesRecords::SaleDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SalesRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum SalesRecords {
        Table,
        Id,
        Sku,
        SaleDate,
        Quantity,
        UnitPrice,
        OrderId,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum InventoryItems {
        Table,
        Sku,
    }
}

mod m20240101_000004_create_forecasts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_forecasts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Forecasts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Forecasts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Forecasts::Sku).string().not_null())
                        .col(ColumnDef::new(Forecasts::ForecastDate).date().not_null())
                        .col(
                            ColumnDef::new(Forecasts::PredictedQty)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(ColumnDef::new(Forecasts::LowerBound).double().null())
                        .col(ColumnDef::new(Forecasts::UpperBound).double().null())
                        .col(ColumnDef::new(Forecasts::ModelName).string().not_null())
                        .col(
                            ColumnDef::new(Forecasts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_forecasts_sku")
                                .from(Forecasts::Table, Forecasts::Sku)
                                .to(InventoryItems::Table, InventoryItems::Sku)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_forecasts_sku_date")
                        .table(Forecasts::Table)
                        .col(Forecasts::Sku)
                        .col(Forecasts::ForecastDate)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Forecasts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Forecasts {
        Table,
        Id,
        Sku,
        ForecastDate,
        PredictedQty,
        LowerBound,
        UpperBound,
        ModelName,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum InventoryItems {
        Table,
        Sku,
    }
}

mod m20240101_000005_create_alerts_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_alerts_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Alerts outlive the item they mention, so no foreign key on sku
            manager
                .create_table(
                    Table::create()
                        .table(Alerts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Alerts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Alerts::Sku).string().not_null())
                        .col(ColumnDef::new(Alerts::AlertType).string_len(32).not_null())
                        .col(ColumnDef::new(Alerts::Severity).string_len(32).not_null())
                        .col(ColumnDef::new(Alerts::Title).string().not_null())
                        .col(ColumnDef::new(Alerts::Message).text().not_null())
                        .col(ColumnDef::new(Alerts::Metadata).json().null())
                        .col(
                            ColumnDef::new(Alerts::IsResolved)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Alerts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Alerts::ResolvedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_alerts_created_at")
                        .table(Alerts::Table)
                        .col(Alerts::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Alerts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Alerts {
        Table,
        Id,
        Sku,
        AlertType,
        Severity,
        Title,
        Message,
        Metadata,
        IsResolved,
        CreatedAt,
        ResolvedAt,
    }
}

/// Direction for [`run_migration`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MigrationCommand {
    Up,
    Down,
    Status,
}

// Database migration CLI runner
pub async fn run_migration(db_url: &str, command: MigrationCommand) -> Result<()> {
    info!(%command, "Setting up database connection for migrations");

    let mut opt = ConnectOptions::new(db_url);
    opt.max_connections(2)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;

    let outcome = match command {
        MigrationCommand::Up => Migrator::up(&db, None).await,
        MigrationCommand::Down => Migrator::down(&db, None).await,
        MigrationCommand::Status => Migrator::status(&db).await,
    };

    match outcome {
        Ok(_) => {
            info!(%command, "Migration command completed");
            Ok(())
        }
        Err(e) => {
            error!(%command, "Migration failed: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_commands() {
        assert_eq!(MigrationCommand::from_str("up").unwrap(), MigrationCommand::Up);
        assert_eq!(MigrationCommand::from_str("status").unwrap(), MigrationCommand::Status);
        assert!(MigrationCommand::from_str("sideways").is_err());
    }
}
