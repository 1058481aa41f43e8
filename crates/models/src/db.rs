use std::{env, time::Duration};

use configs::DatabaseConfig;
use once_cell::sync::Lazy;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use tracing::info;

use crate::upstream;

pub static DATABASE_URL: Lazy<String> = Lazy::new(|| {
    // Load .env if present
    let _ = dotenvy::dotenv();
    env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
});

pub async fn connect() -> anyhow::Result<DatabaseConnection> {
    let cfg = DatabaseConfig { url: DATABASE_URL.clone(), ..DatabaseConfig::default() };
    connect_with_config(&cfg).await
}

/// Open a pooled connection using the limits and timeouts from `cfg`.
///
/// Every SQLite `:memory:` connection is its own database, so such URLs are
/// pinned to a single pooled connection.
pub async fn connect_with_config(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let (max, min) = if cfg.url.contains(":memory:") { (1, 1) } else { (cfg.max_connections, cfg.min_connections) };
    let mut opts = ConnectOptions::new(cfg.url.clone());
    opts.max_connections(max)
        .min_connections(min)
        .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(cfg.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(cfg.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(cfg.max_lifetime_secs))
        .sqlx_logging(cfg.sqlx_logging);
    let db = Database::connect(opts).await?;
    info!(backend = ?db.get_database_backend(), "database_connected");
    Ok(db)
}

/// Private in-memory SQLite database.
pub async fn connect_in_memory() -> anyhow::Result<DatabaseConnection> {
    let cfg = DatabaseConfig { url: "sqlite::memory:".to_string(), ..DatabaseConfig::default() };
    connect_with_config(&cfg).await
}

/// Create the tables for every entity in this crate if they are missing.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(upstream::Entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
