use tracing::{info, error};

use crate::database::DatabasePool;
use crate::error::AppError;

/// Creates the `prices`, `trades` and `logs` tables for the pool's engine.
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), AppError> {
    info!(engine = ?pool.engine(), "Running database migrations");

    let result = match pool {
        DatabasePool::Postgres(pg) => sqlx::migrate!("./migrations/postgres").run(pg).await,
        DatabasePool::Sqlite(sqlite) => sqlx::migrate!("./migrations/sqlite").run(sqlite).await,
    };

    result.map_err(|e| {
        error!("Migration failed: {}", e);
        AppError::from(e)
    })?;

    info!("Database migrations completed successfully");
    Ok(())
}
