use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::db::models::content_history::ContentHistoryDBResponse;
use crate::types::ContentId;

/// A past generation as stored, with the platform copy and images it returned.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentHistoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ContentId,
    pub brand: String,
    pub keywords: Vec<String>,
    pub platforms: Vec<String>,
    pub ai_model: String,
    #[schema(value_type = Object)]
    pub content: Value,
    #[schema(value_type = Vec<Object>)]
    pub images: Value,
    pub credits_used: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ContentHistoryDBResponse> for ContentHistoryResponse {
    fn from(row: ContentHistoryDBResponse) -> Self {
        Self {
            id: row.id,
            brand: row.brand,
            keywords: row.keywords,
            platforms: row.platforms,
            ai_model: row.ai_model,
            content: row.content,
            images: row.images,
            credits_used: row.credits_used,
            created_at: row.created_at,
        }
    }
}
