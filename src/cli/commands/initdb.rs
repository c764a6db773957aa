use anyhow::{Context, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use tracing::info;

/// Connects to `database_url` and applies every pending migration.
pub async fn init_database(database_url: &str) -> Result<()> {
    info!("Migrating {}", database_url);
    let db = Database::connect(database_url)
        .await
        .with_context(|| format!("cannot connect to {database_url}"))?;

    Migrator::up(&db, None)
        .await
        .context("migrations failed")?;
    db.close().await?;

    info!("Schema is up to date");
    Ok(())
}
