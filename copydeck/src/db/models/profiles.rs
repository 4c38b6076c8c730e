//! Database models for saved brand profiles.

use crate::types::{ProfileId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Fields written on both create and full update
#[derive(Debug, Clone)]
pub struct ProfileDBRequest {
    pub name: String,
    pub brand: String,
    pub industry: Option<String>,
    pub tone: Option<String>,
    pub target_age: Option<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProfileDBResponse {
    pub id: ProfileId,
    pub user_id: UserId,
    pub name: String,
    pub brand: String,
    pub industry: Option<String>,
    pub tone: Option<String>,
    pub target_age: Option<String>,
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
