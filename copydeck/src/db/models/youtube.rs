//! Database models for the YouTube analysis cache and per-user analysis history.

use crate::types::{AnalysisId, AnalysisType, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// A shared cache row. Freshness is decided by the caller against `expires_at`.
#[derive(Debug, Clone, FromRow)]
pub struct AnalysisCacheDBResponse {
    pub video_id: String,
    pub analysis_type: AnalysisType,
    pub payload: serde_json::Value,
    pub hit_count: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AnalysisCacheUpsertDBRequest {
    pub video_id: String,
    pub analysis_type: AnalysisType,
    pub payload: serde_json::Value,
    pub expires_at: DateTime<Utc>,
}

/// Filter for listing a user's analyses, newest first
#[derive(Debug, Clone)]
pub struct AnalysisHistoryFilter {
    pub user_id: UserId,
    pub analysis_type: Option<AnalysisType>,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct AnalysisHistoryCreateDBRequest {
    pub user_id: UserId,
    pub video_id: String,
    pub video_url: String,
    pub analysis_type: AnalysisType,
    pub video_title: Option<String>,
    pub payload: serde_json::Value,
    pub credits_used: i32,
    pub was_cached: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct AnalysisHistoryDBResponse {
    pub id: AnalysisId,
    pub user_id: UserId,
    pub video_id: String,
    pub video_url: String,
    pub analysis_type: AnalysisType,
    pub video_title: Option<String>,
    pub payload: serde_json::Value,
    pub credits_used: i32,
    pub was_cached: bool,
    pub created_at: DateTime<Utc>,
}

/// Aggregates over one user's analysis history
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisStatsDBResponse {
    pub total_analyses: i64,
    pub cached_analyses: i64,
    pub credits_spent: i64,
    pub by_type: BTreeMap<String, i64>,
}
