//! Database models for anonymous trial usage, keyed by client IP.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct TrialUsageDBResponse {
    pub ip_address: String,
    pub usage_count: i32,
    pub is_blocked: bool,
    pub first_used_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl TrialUsageDBResponse {
    pub fn is_exhausted(&self, limit: i32) -> bool {
        self.is_blocked || self.usage_count >= limit
    }
}
