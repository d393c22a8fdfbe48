use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct LogEntry {
    pub id: i64,
    pub message: String,
    #[sqlx(rename = "timestamp")]
    pub recorded_at: DateTime<Utc>,
}
