use smart_inventory_api::migrator::{run_migration, MigrationCommand};
use std::str::FromStr;
use tracing::error;

/// Applies (`up`, the default), rolls back (`down`) or reports (`status`)
/// the schema migrations against `DATABASE_URL`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let arg = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    let command = MigrationCommand::from_str(&arg).map_err(|_| {
        error!(command = %arg, "Unknown command; expected up, down or status");
        anyhow::anyhow!("unknown command: {}", arg)
    })?;
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://inventory.db?mode=rwc".to_string());

    run_migration(&database_url, command).await
}
