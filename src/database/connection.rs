use sqlx::{
    postgres::PgPoolOptions,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    PgPool, SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, error};

use crate::config::{DatabaseEngine, DatabaseSettings};
use crate::error::AppError;

/// Bounded connection pool over either supported engine.
#[derive(Debug, Clone)]
pub enum DatabasePool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl DatabasePool {
    pub fn engine(&self) -> DatabaseEngine {
        match self {
            DatabasePool::Postgres(_) => DatabaseEngine::Postgres,
            DatabasePool::Sqlite(_) => DatabaseEngine::Sqlite,
        }
    }

    pub async fn close(&self) {
        match self {
            DatabasePool::Postgres(pool) => pool.close().await,
            DatabasePool::Sqlite(pool) => pool.close().await,
        }
    }
}

pub async fn establish_connection(settings: &DatabaseSettings) -> Result<DatabasePool, AppError> {
    let engine = settings.engine()?;
    info!(?engine, max_connections = settings.max_connections, "Establishing database connection");

    let pool = match engine {
        DatabaseEngine::Postgres => DatabasePool::Postgres(connect_postgres(settings).await?),
        DatabaseEngine::Sqlite => DatabasePool::Sqlite(connect_sqlite(settings).await?),
    };

    info!("Database connection established successfully");
    Ok(pool)
}

async fn connect_postgres(settings: &DatabaseSettings) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(settings.acquire_timeout())
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&settings.url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            AppError::DatabaseError(format!("Connection failed: {}", e))
        })
}

async fn connect_sqlite(settings: &DatabaseSettings) -> Result<SqlitePool, AppError> {
    let in_memory = is_in_memory(&settings.url);

    let mut options = SqliteConnectOptions::from_str(&settings.url)
        .map_err(|e| AppError::ConfigError(format!("Invalid SQLite URL: {}", e)))?
        .create_if_missing(true);
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    // Every connection to `:memory:` opens a separate database, so the pool
    // must hold exactly one connection for its whole lifetime.
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .idle_timeout(Duration::from_secs(600))
    };

    pool_options
        .acquire_timeout(settings.acquire_timeout())
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to open SQLite database: {}", e);
            AppError::DatabaseError(format!("Connection failed: {}", e))
        })
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
