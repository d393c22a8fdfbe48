use async_trait::async_trait;
use sqlx::{PgPool, SqlitePool};
use std::sync::Arc;

use crate::database::DatabasePool;
use crate::error::AppError;
use crate::models::{AssetStats, LogEntry, NewPriceSample, PriceSample, PriceStats};

/// Storage operations shared by the sampler and the web layer.
///
/// Each call checks a connection out of the pool for a single statement and
/// returns it immediately; inserts commit on their own.
#[async_trait]
pub trait PriceStore: Send + Sync {
    async fn insert_sample(&self, sample: &NewPriceSample) -> Result<PriceSample, AppError>;

    async fn count_samples(&self) -> Result<i64, AppError>;

    /// Newest first, ties broken by insertion order.
    async fn recent_samples(&self, limit: i64) -> Result<Vec<PriceSample>, AppError>;

    async fn price_stats(&self) -> Result<PriceStats, AppError>;

    async fn append_log(&self, message: &str) -> Result<LogEntry, AppError>;

    async fn recent_logs(&self, limit: i64) -> Result<Vec<LogEntry>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}

type StatsRow = (Option<f64>, Option<f64>, Option<f64>, Option<f64>, Option<f64>, Option<f64>);

fn stats_from_row(row: StatsRow) -> PriceStats {
    let (min1, max1, avg1, min2, max2, avg2) = row;
    PriceStats {
        asset_a: AssetStats { min: min1, max: max1, avg: avg1 },
        asset_b: AssetStats { min: min2, max: max2, avg: avg2 },
    }
}

pub fn price_store_for(pool: &DatabasePool) -> Arc<dyn PriceStore> {
    match pool {
        DatabasePool::Postgres(pg) => Arc::new(PostgresPriceStore::new(pg.clone())),
        DatabasePool::Sqlite(sqlite) => Arc::new(SqlitePriceStore::new(sqlite.clone())),
    }
}

#[derive(Clone)]
pub struct PostgresPriceStore {
    db_pool: PgPool,
}

impl PostgresPriceStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PriceStore for PostgresPriceStore {
    async fn insert_sample(&self, sample: &NewPriceSample) -> Result<PriceSample, AppError> {
        sample.validate()?;

        let stored = sqlx::query_as::<_, PriceSample>(
            r#"
            INSERT INTO prices (token1, price1, token2, price2)
            VALUES ($1, $2, $3, $4)
            RETURNING id, timestamp, token1, price1, token2, price2
            "#,
        )
        .bind(&sample.asset_a_symbol)
        .bind(sample.asset_a_price)
        .bind(&sample.asset_b_symbol)
        .bind(sample.asset_b_price)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(stored)
    }

    async fn count_samples(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM prices")
            .fetch_one(&self.db_pool)
            .await?;
        Ok(count)
    }

    async fn recent_samples(&self, limit: i64) -> Result<Vec<PriceSample>, AppError> {
        let samples = sqlx::query_as::<_, PriceSample>(
            r#"
            SELECT id, timestamp, token1, price1, token2, price2
            FROM prices
            ORDER BY timestamp DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(samples)
    }

    async fn price_stats(&self) -> Result<PriceStats, AppError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT MIN(price1), MAX(price1), AVG(price1),
                   MIN(price2), MAX(price2), AVG(price2)
            FROM prices
            "#,
        )
        .fetch_one(&self.db_pool)
        .await?;
        Ok(stats_from_row(row))
    }

    async fn append_log(&self, message: &str) -> Result<LogEntry, AppError> {
        let entry = sqlx::query_as::<_, LogEntry>(
            "INSERT INTO logs (message) VALUES ($1) RETURNING id, message, timestamp",
        )
        .bind(message)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(entry)
    }

    async fn recent_logs(&self, limit: i64) -> Result<Vec<LogEntry>, AppError> {
        let entries = sqlx::query_as::<_, LogEntry>(
            "SELECT id, message, timestamp FROM logs ORDER BY timestamp DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(entries)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Connection test failed: {}", e)))?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqlitePriceStore {
    db_pool: SqlitePool,
}

impl SqlitePriceStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PriceStore for SqlitePriceStore {
    async fn insert_sample(&self, sample: &NewPriceSample) -> Result<PriceSample, AppError> {
        sample.validate()?;

        let stored = sqlx::query_as::<_, PriceSample>(
            r#"
            INSERT INTO prices (token1, price1, token2, price2)
            VALUES (?, ?, ?, ?)
            RETURNING id, timestamp, token1, price1, token2, price2
            "#,
        )
        .bind(&sample.asset_a_symbol)
        .bind(sample.asset_a_price)
        .bind(&sample.asset_b_symbol)
        .bind(sample.asset_b_price)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(stored)
    }

    async fn count_samples(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM prices")
            .fetch_one(&self.db_pool)
            .await?;
        Ok(count)
    }

    async fn recent_samples(&self, limit: i64) -> Result<Vec<PriceSample>, AppError> {
        let samples = sqlx::query_as::<_, PriceSample>(
            r#"
            SELECT id, timestamp, token1, price1, token2, price2
            FROM prices
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(samples)
    }

    async fn price_stats(&self) -> Result<PriceStats, AppError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT MIN(price1), MAX(price1), AVG(price1),
                   MIN(price2), MAX(price2), AVG(price2)
            FROM prices
            "#,
        )
        .fetch_one(&self.db_pool)
        .await?;
        Ok(stats_from_row(row))
    }

    async fn append_log(&self, message: &str) -> Result<LogEntry, AppError> {
        let entry = sqlx::query_as::<_, LogEntry>(
            "INSERT INTO logs (message) VALUES (?) RETURNING id, message, timestamp",
        )
        .bind(message)
        .fetch_one(&self.db_pool)
        .await?;
        Ok(entry)
    }

    async fn recent_logs(&self, limit: i64) -> Result<Vec<LogEntry>, AppError> {
        let entries = sqlx::query_as::<_, LogEntry>(
            "SELECT id, message, timestamp FROM logs ORDER BY timestamp DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await?;
        Ok(entries)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Connection test failed: {}", e)))?;
        Ok(())
    }
}
