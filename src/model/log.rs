use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Log {
    pub log_id: u64,
    pub user_id: i64,
    pub action: String,
    pub timestamp: DateTime<Utc>,
}
