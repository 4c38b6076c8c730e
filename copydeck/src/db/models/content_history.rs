//! Database models for generated content history.

use crate::types::{ContentId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Filter for listing a user's content history, newest first
#[derive(Debug, Clone)]
pub struct ContentHistoryFilter {
    pub user_id: UserId,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct ContentHistoryCreateDBRequest {
    pub user_id: UserId,
    pub brand: String,
    pub keywords: Vec<String>,
    pub platforms: Vec<String>,
    pub ai_model: String,
    pub content: serde_json::Value,
    pub images: serde_json::Value,
    pub credits_used: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct ContentHistoryDBResponse {
    pub id: ContentId,
    pub user_id: UserId,
    pub brand: String,
    pub keywords: Vec<String>,
    pub platforms: Vec<String>,
    pub ai_model: String,
    pub content: serde_json::Value,
    pub images: serde_json::Value,
    pub credits_used: i32,
    pub created_at: DateTime<Utc>,
}
