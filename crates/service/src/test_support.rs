#![cfg(test)]
use sea_orm::DatabaseConnection;
use models::db::{connect_in_memory, ensure_schema};

/// Fresh in-memory database with every table created.
///
/// Each call returns an isolated database, so tests never observe each
/// other's rows.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let db = connect_in_memory().await?;
    ensure_schema(&db).await?;
    Ok(db)
}
