//! Storage traits.
//!
//! Every table gets its own trait so handlers and tests can reason about the narrow slice of
//! storage they touch. [`Store`] bundles them all and is what [`crate::AppState`] holds.
//!
//! Implementations must give the same answers for the same sequence of calls:
//!
//! - [`crate::db::handlers::PostgresStore`] pushes atomicity into SQL (conditional updates and
//!   `ON CONFLICT` upserts)
//! - [`crate::db::memory::MemoryStore`] takes a write lock per operation

use crate::db::errors::Result;
use crate::db::models::{
    content_history::{ContentHistoryCreateDBRequest, ContentHistoryDBResponse, ContentHistoryFilter},
    profiles::{ProfileDBRequest, ProfileDBResponse},
    trial_usage::TrialUsageDBResponse,
    users::{UserCreateDBRequest, UserDBResponse},
    youtube::{
        AnalysisCacheDBResponse, AnalysisCacheUpsertDBRequest, AnalysisHistoryCreateDBRequest, AnalysisHistoryDBResponse,
        AnalysisHistoryFilter, AnalysisStatsDBResponse,
    },
};
use crate::types::{AnalysisId, AnalysisType, ContentId, ProfileId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>>;

    /// Insert the user if absent and return the stored row either way.
    async fn ensure_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;

    /// Set free credits to `free_credits` and stamp `monthly_reset_date` with `now`.
    async fn reset_monthly_credits(&self, id: UserId, free_credits: i32, now: DateTime<Utc>) -> Result<UserDBResponse>;

    /// Take `amount` credits, free credits first and then paid.
    ///
    /// Returns `None` without touching the row if the combined balance is below `amount`.
    async fn deduct_credits(&self, id: UserId, amount: i32) -> Result<Option<UserDBResponse>>;

    async fn complete_onboarding(&self, id: UserId) -> Result<UserDBResponse>;
}

#[async_trait]
pub trait TrialUsageStore: Send + Sync {
    async fn get_trial_usage(&self, ip_address: &str) -> Result<Option<TrialUsageDBResponse>>;

    /// Count one more guest generation for `ip_address`, creating the row on first use.
    async fn record_trial_usage(&self, ip_address: &str, now: DateTime<Utc>) -> Result<TrialUsageDBResponse>;
}

#[async_trait]
pub trait ContentHistoryStore: Send + Sync {
    async fn create_content(&self, request: &ContentHistoryCreateDBRequest) -> Result<ContentHistoryDBResponse>;

    /// A page of the user's history, newest first, together with the user's total row count.
    async fn list_content(&self, filter: &ContentHistoryFilter) -> Result<(Vec<ContentHistoryDBResponse>, i64)>;

    async fn get_content(&self, user_id: UserId, id: ContentId) -> Result<Option<ContentHistoryDBResponse>>;

    async fn delete_content(&self, user_id: UserId, id: ContentId) -> Result<bool>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn create_profile(&self, user_id: UserId, request: &ProfileDBRequest) -> Result<ProfileDBResponse>;

    /// All of the user's profiles, most recently updated first.
    async fn list_profiles(&self, user_id: UserId) -> Result<Vec<ProfileDBResponse>>;

    async fn get_profile(&self, user_id: UserId, id: ProfileId) -> Result<Option<ProfileDBResponse>>;

    async fn update_profile(&self, user_id: UserId, id: ProfileId, request: &ProfileDBRequest) -> Result<Option<ProfileDBResponse>>;

    async fn delete_profile(&self, user_id: UserId, id: ProfileId) -> Result<bool>;
}

#[async_trait]
pub trait AnalysisCacheStore: Send + Sync {
    /// The row for this key, stale or not.
    async fn get_cached_analysis(&self, video_id: &str, analysis_type: AnalysisType) -> Result<Option<AnalysisCacheDBResponse>>;

    /// Insert or overwrite the row for this key. Overwriting resets the hit counter.
    async fn upsert_cached_analysis(&self, request: &AnalysisCacheUpsertDBRequest) -> Result<AnalysisCacheDBResponse>;

    async fn increment_cache_hits(&self, video_id: &str, analysis_type: AnalysisType) -> Result<()>;

    /// Delete every row with `expires_at <= now`, returning how many went.
    async fn purge_expired_analyses(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[async_trait]
pub trait AnalysisHistoryStore: Send + Sync {
    async fn create_analysis(&self, request: &AnalysisHistoryCreateDBRequest) -> Result<AnalysisHistoryDBResponse>;

    /// A page of the user's analyses, newest first, with the total matching the filter.
    async fn list_analyses(&self, filter: &AnalysisHistoryFilter) -> Result<(Vec<AnalysisHistoryDBResponse>, i64)>;

    async fn get_analysis(&self, user_id: UserId, id: AnalysisId) -> Result<Option<AnalysisHistoryDBResponse>>;

    async fn delete_analysis(&self, user_id: UserId, id: AnalysisId) -> Result<bool>;

    async fn analysis_stats(&self, user_id: UserId) -> Result<AnalysisStatsDBResponse>;
}

/// Everything the application persists.
pub trait Store: UserStore + TrialUsageStore + ContentHistoryStore + ProfileStore + AnalysisCacheStore + AnalysisHistoryStore {}

impl<T> Store for T where T: UserStore + TrialUsageStore + ContentHistoryStore + ProfileStore + AnalysisCacheStore + AnalysisHistoryStore {}
