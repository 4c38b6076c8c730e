//! In-memory implementation of the storage traits.
//!
//! Rows live in plain maps behind one `parking_lot::RwLock`, and every trait method takes the
//! lock once, which makes each operation atomic the same way the single-statement SQL is.
//! Data is lost on restart; this backs tests and `database: {type: memory}`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::db::errors::{DbError, Result};
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
use crate::db::store::{AnalysisCacheStore, AnalysisHistoryStore, ContentHistoryStore, ProfileStore, TrialUsageStore, UserStore};
use crate::types::{AnalysisId, AnalysisType, ContentId, ProfileId, Tier, UserId};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserDBResponse>,
    trial_usage: HashMap<String, TrialUsageDBResponse>,
    content_history: Vec<ContentHistoryDBResponse>,
    profiles: Vec<ProfileDBResponse>,
    analysis_cache: HashMap<(String, AnalysisType), AnalysisCacheDBResponse>,
    analysis_history: Vec<AnalysisHistoryDBResponse>,
}

impl Tables {
    /// Mirrors the `REFERENCES users(id)` foreign keys.
    fn require_user(&self, table: &str, user_id: UserId) -> Result<()> {
        if self.users.contains_key(&user_id) {
            return Ok(());
        }
        Err(DbError::ForeignKeyViolation {
            constraint: Some(format!("{table}_user_id_fkey")),
            table: Some(table.to_string()),
            message: format!("user {user_id} does not exist"),
        })
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user row verbatim. Lets tests set up tiers and stale reset dates.
    pub fn put_user(&self, user: UserDBResponse) {
        self.tables.write().users.insert(user.id, user);
    }

    /// Insert or replace a trial row verbatim.
    pub fn put_trial_usage(&self, usage: TrialUsageDBResponse) {
        self.tables.write().trial_usage.insert(usage.ip_address.clone(), usage);
    }

    /// Insert or replace a cache row verbatim.
    pub fn put_cached_analysis(&self, entry: AnalysisCacheDBResponse) {
        self.tables
            .write()
            .analysis_cache
            .insert((entry.video_id.clone(), entry.analysis_type), entry);
    }
}

/// Newest first, ties broken by id descending to match `ORDER BY created_at DESC, id DESC`.
fn page<T: Clone>(mut rows: Vec<T>, key: impl Fn(&T) -> (DateTime<Utc>, Uuid), skip: i64, limit: i64) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    rows.sort_by_key(|row| std::cmp::Reverse(key(row)));
    let rows = rows
        .into_iter()
        .skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (rows, total)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.tables.read().users.get(&id).cloned())
    }

    async fn ensure_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        let now = Utc::now();
        let user = tables.users.entry(request.id).or_insert_with(|| UserDBResponse {
            id: request.id,
            email: None,
            free_credits: request.free_credits,
            paid_credits: 0,
            tier: Tier::Free,
            monthly_reset_date: now,
            onboarding_completed: false,
            created_at: now,
            updated_at: now,
        });
        if request.email.is_some() {
            user.email = request.email.clone();
        }
        Ok(user.clone())
    }

    async fn reset_monthly_credits(&self, id: UserId, free_credits: i32, now: DateTime<Utc>) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        let user = tables.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.free_credits = free_credits;
        user.monthly_reset_date = now;
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn deduct_credits(&self, id: UserId, amount: i32) -> Result<Option<UserDBResponse>> {
        let mut tables = self.tables.write();
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if user.total_credits() < amount {
            return Ok(None);
        }
        let from_free = user.free_credits.min(amount);
        user.free_credits -= from_free;
        user.paid_credits -= amount - from_free;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn complete_onboarding(&self, id: UserId) -> Result<UserDBResponse> {
        let mut tables = self.tables.write();
        let user = tables.users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.onboarding_completed = true;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl TrialUsageStore for MemoryStore {
    async fn get_trial_usage(&self, ip_address: &str) -> Result<Option<TrialUsageDBResponse>> {
        Ok(self.tables.read().trial_usage.get(ip_address).cloned())
    }

    async fn record_trial_usage(&self, ip_address: &str, now: DateTime<Utc>) -> Result<TrialUsageDBResponse> {
        let mut tables = self.tables.write();
        let usage = tables
            .trial_usage
            .entry(ip_address.to_string())
            .and_modify(|usage| {
                usage.usage_count += 1;
                usage.last_used_at = now;
            })
            .or_insert_with(|| TrialUsageDBResponse {
                ip_address: ip_address.to_string(),
                usage_count: 1,
                is_blocked: false,
                first_used_at: now,
                last_used_at: now,
            });
        Ok(usage.clone())
    }
}

#[async_trait]
impl ContentHistoryStore for MemoryStore {
    async fn create_content(&self, request: &ContentHistoryCreateDBRequest) -> Result<ContentHistoryDBResponse> {
        let mut tables = self.tables.write();
        tables.require_user("content_history", request.user_id)?;
        let row = ContentHistoryDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            brand: request.brand.clone(),
            keywords: request.keywords.clone(),
            platforms: request.platforms.clone(),
            ai_model: request.ai_model.clone(),
            content: request.content.clone(),
            images: request.images.clone(),
            credits_used: request.credits_used,
            created_at: Utc::now(),
        };
        tables.content_history.push(row.clone());
        Ok(row)
    }

    async fn list_content(&self, filter: &ContentHistoryFilter) -> Result<(Vec<ContentHistoryDBResponse>, i64)> {
        let rows = self
            .tables
            .read()
            .content_history
            .iter()
            .filter(|row| row.user_id == filter.user_id)
            .cloned()
            .collect();
        Ok(page(rows, |row| (row.created_at, row.id), filter.skip, filter.limit))
    }

    async fn get_content(&self, user_id: UserId, id: ContentId) -> Result<Option<ContentHistoryDBResponse>> {
        Ok(self
            .tables
            .read()
            .content_history
            .iter()
            .find(|row| row.id == id && row.user_id == user_id)
            .cloned())
    }

    async fn delete_content(&self, user_id: UserId, id: ContentId) -> Result<bool> {
        let mut tables = self.tables.write();
        let before = tables.content_history.len();
        tables.content_history.retain(|row| !(row.id == id && row.user_id == user_id));
        Ok(tables.content_history.len() < before)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn create_profile(&self, user_id: UserId, request: &ProfileDBRequest) -> Result<ProfileDBResponse> {
        let mut tables = self.tables.write();
        tables.require_user("profiles", user_id)?;
        let now = Utc::now();
        let profile = ProfileDBResponse {
            id: Uuid::new_v4(),
            user_id,
            name: request.name.clone(),
            brand: request.brand.clone(),
            industry: request.industry.clone(),
            tone: request.tone.clone(),
            target_age: request.target_age.clone(),
            keywords: request.keywords.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn list_profiles(&self, user_id: UserId) -> Result<Vec<ProfileDBResponse>> {
        let rows = self
            .tables
            .read()
            .profiles
            .iter()
            .filter(|profile| profile.user_id == user_id)
            .cloned()
            .collect();
        Ok(page(rows, |profile| (profile.updated_at, profile.id), 0, i64::MAX).0)
    }

    async fn get_profile(&self, user_id: UserId, id: ProfileId) -> Result<Option<ProfileDBResponse>> {
        Ok(self
            .tables
            .read()
            .profiles
            .iter()
            .find(|profile| profile.id == id && profile.user_id == user_id)
            .cloned())
    }

    async fn update_profile(&self, user_id: UserId, id: ProfileId, request: &ProfileDBRequest) -> Result<Option<ProfileDBResponse>> {
        let mut tables = self.tables.write();
        let Some(profile) = tables
            .profiles
            .iter_mut()
            .find(|profile| profile.id == id && profile.user_id == user_id)
        else {
            return Ok(None);
        };
        profile.name = request.name.clone();
        profile.brand = request.brand.clone();
        profile.industry = request.industry.clone();
        profile.tone = request.tone.clone();
        profile.target_age = request.target_age.clone();
        profile.keywords = request.keywords.clone();
        profile.updated_at = Utc::now();
        Ok(Some(profile.clone()))
    }

    async fn delete_profile(&self, user_id: UserId, id: ProfileId) -> Result<bool> {
        let mut tables = self.tables.write();
        let before = tables.profiles.len();
        tables.profiles.retain(|profile| !(profile.id == id && profile.user_id == user_id));
        Ok(tables.profiles.len() < before)
    }
}

#[async_trait]
impl AnalysisCacheStore for MemoryStore {
    async fn get_cached_analysis(&self, video_id: &str, analysis_type: AnalysisType) -> Result<Option<AnalysisCacheDBResponse>> {
        Ok(self
            .tables
            .read()
            .analysis_cache
            .get(&(video_id.to_string(), analysis_type))
            .cloned())
    }

    async fn upsert_cached_analysis(&self, request: &AnalysisCacheUpsertDBRequest) -> Result<AnalysisCacheDBResponse> {
        let entry = AnalysisCacheDBResponse {
            video_id: request.video_id.clone(),
            analysis_type: request.analysis_type,
            payload: request.payload.clone(),
            hit_count: 0,
            expires_at: request.expires_at,
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .analysis_cache
            .insert((request.video_id.clone(), request.analysis_type), entry.clone());
        Ok(entry)
    }

    async fn increment_cache_hits(&self, video_id: &str, analysis_type: AnalysisType) -> Result<()> {
        if let Some(entry) = self
            .tables
            .write()
            .analysis_cache
            .get_mut(&(video_id.to_string(), analysis_type))
        {
            entry.hit_count += 1;
        }
        Ok(())
    }

    async fn purge_expired_analyses(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut tables = self.tables.write();
        let before = tables.analysis_cache.len();
        tables.analysis_cache.retain(|_, entry| entry.expires_at > now);
        Ok((before - tables.analysis_cache.len()) as u64)
    }
}

#[async_trait]
impl AnalysisHistoryStore for MemoryStore {
    async fn create_analysis(&self, request: &AnalysisHistoryCreateDBRequest) -> Result<AnalysisHistoryDBResponse> {
        let mut tables = self.tables.write();
        tables.require_user("youtube_analysis_history", request.user_id)?;
        let row = AnalysisHistoryDBResponse {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            video_id: request.video_id.clone(),
            video_url: request.video_url.clone(),
            analysis_type: request.analysis_type,
            video_title: request.video_title.clone(),
            payload: request.payload.clone(),
            credits_used: request.credits_used,
            was_cached: request.was_cached,
            created_at: Utc::now(),
        };
        tables.analysis_history.push(row.clone());
        Ok(row)
    }

    async fn list_analyses(&self, filter: &AnalysisHistoryFilter) -> Result<(Vec<AnalysisHistoryDBResponse>, i64)> {
        let rows = self
            .tables
            .read()
            .analysis_history
            .iter()
            .filter(|row| row.user_id == filter.user_id)
            .filter(|row| filter.analysis_type.is_none_or(|kind| row.analysis_type == kind))
            .cloned()
            .collect();
        Ok(page(rows, |row| (row.created_at, row.id), filter.skip, filter.limit))
    }

    async fn get_analysis(&self, user_id: UserId, id: AnalysisId) -> Result<Option<AnalysisHistoryDBResponse>> {
        Ok(self
            .tables
            .read()
            .analysis_history
            .iter()
            .find(|row| row.id == id && row.user_id == user_id)
            .cloned())
    }

    async fn delete_analysis(&self, user_id: UserId, id: AnalysisId) -> Result<bool> {
        let mut tables = self.tables.write();
        let before = tables.analysis_history.len();
        tables.analysis_history.retain(|row| !(row.id == id && row.user_id == user_id));
        Ok(tables.analysis_history.len() < before)
    }

    async fn analysis_stats(&self, user_id: UserId) -> Result<AnalysisStatsDBResponse> {
        let tables = self.tables.read();
        let mut stats = AnalysisStatsDBResponse::default();
        for row in tables.analysis_history.iter().filter(|row| row.user_id == user_id) {
            stats.total_analyses += 1;
            stats.cached_analyses += i64::from(row.was_cached);
            stats.credits_spent += i64::from(row.credits_used);
            *stats.by_type.entry(row.analysis_type.to_string()).or_default() += 1;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(free: i32, paid: i32) -> UserDBResponse {
        let now = Utc::now();
        UserDBResponse {
            id: Uuid::new_v4(),
            email: Some("owner@example.com".to_string()),
            free_credits: free,
            paid_credits: paid,
            tier: Tier::Free,
            monthly_reset_date: now,
            onboarding_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_deduct_spends_free_credits_before_paid() {
        let store = MemoryStore::new();
        let u = user(2, 5);
        store.put_user(u.clone());

        let after = store.deduct_credits(u.id, 3).await.unwrap().unwrap();
        assert_eq!(after.free_credits, 0);
        assert_eq!(after.paid_credits, 4);
    }

    #[tokio::test]
    async fn test_deduct_refuses_when_balance_is_short() {
        let store = MemoryStore::new();
        let u = user(1, 1);
        store.put_user(u.clone());

        assert!(store.deduct_credits(u.id, 3).await.unwrap().is_none());
        let unchanged = store.get_user(u.id).await.unwrap().unwrap();
        assert_eq!(unchanged.total_credits(), 2);
    }

    #[tokio::test]
    async fn test_ensure_user_keeps_existing_balance() {
        let store = MemoryStore::new();
        let u = user(3, 0);
        store.put_user(u.clone());

        let request = UserCreateDBRequest {
            id: u.id,
            email: None,
            free_credits: 10,
        };
        let ensured = store.ensure_user(&request).await.unwrap();
        assert_eq!(ensured.free_credits, 3);
        assert_eq!(ensured.email.as_deref(), Some("owner@example.com"));
    }

    #[tokio::test]
    async fn test_trial_usage_counts_up() {
        let store = MemoryStore::new();
        let now = Utc::now();
        assert_eq!(store.record_trial_usage("10.0.0.1", now).await.unwrap().usage_count, 1);
        let second = store.record_trial_usage("10.0.0.1", now).await.unwrap();
        assert_eq!(second.usage_count, 2);
        assert_eq!(second.first_used_at, now);
    }

    #[tokio::test]
    async fn test_content_history_pages_newest_first_and_scopes_to_owner() {
        let store = MemoryStore::new();
        let owner = user(10, 0);
        let other = user(10, 0);
        store.put_user(owner.clone());
        store.put_user(other.clone());

        for brand in ["first", "second", "third"] {
            store
                .create_content(&ContentHistoryCreateDBRequest {
                    user_id: owner.id,
                    brand: brand.to_string(),
                    keywords: vec![],
                    platforms: vec!["blog".to_string()],
                    ai_model: "openai".to_string(),
                    content: serde_json::json!({}),
                    images: serde_json::json!([]),
                    credits_used: 1,
                })
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let filter = ContentHistoryFilter {
            user_id: owner.id,
            skip: 0,
            limit: 2,
        };
        let (rows, total) = store.list_content(&filter).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.iter().map(|r| r.brand.as_str()).collect::<Vec<_>>(), ["third", "second"]);

        assert!(store.get_content(other.id, rows[0].id).await.unwrap().is_none());
        assert!(!store.delete_content(other.id, rows[0].id).await.unwrap());
        assert!(store.delete_content(owner.id, rows[0].id).await.unwrap());
    }

    #[tokio::test]
    async fn test_content_history_requires_existing_user() {
        let store = MemoryStore::new();
        let err = store
            .create_content(&ContentHistoryCreateDBRequest {
                user_id: Uuid::new_v4(),
                brand: "orphan".to_string(),
                keywords: vec![],
                platforms: vec![],
                ai_model: "openai".to_string(),
                content: serde_json::json!({}),
                images: serde_json::json!([]),
                credits_used: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_cache_upsert_overwrites_and_purge_drops_expired() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let stale = AnalysisCacheUpsertDBRequest {
            video_id: "dQw4w9WgXcQ".to_string(),
            analysis_type: AnalysisType::Seo,
            payload: serde_json::json!({"v": 1}),
            expires_at: now - Duration::hours(1),
        };
        store.upsert_cached_analysis(&stale).await.unwrap();
        store.increment_cache_hits("dQw4w9WgXcQ", AnalysisType::Seo).await.unwrap();

        let fresh = AnalysisCacheUpsertDBRequest {
            payload: serde_json::json!({"v": 2}),
            expires_at: now + Duration::hours(24),
            ..stale.clone()
        };
        let entry = store.upsert_cached_analysis(&fresh).await.unwrap();
        assert_eq!(entry.hit_count, 0);
        assert_eq!(entry.payload["v"], 2);

        store.upsert_cached_analysis(&AnalysisCacheUpsertDBRequest {
            video_id: "aaaaaaaaaaa".to_string(),
            ..stale
        })
        .await
        .unwrap();

        assert_eq!(store.purge_expired_analyses(now).await.unwrap(), 1);
        assert!(store.get_cached_analysis("dQw4w9WgXcQ", AnalysisType::Seo).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_analysis_stats_and_type_filter() {
        let store = MemoryStore::new();
        let owner_row = user(10, 0);
        let owner = owner_row.id;
        store.put_user(owner_row);
        for (kind, cached, credits) in [
            (AnalysisType::Summary, false, 1),
            (AnalysisType::Summary, true, 0),
            (AnalysisType::Comments, false, 2),
        ] {
            store
                .create_analysis(&AnalysisHistoryCreateDBRequest {
                    user_id: owner,
                    video_id: "dQw4w9WgXcQ".to_string(),
                    video_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
                    analysis_type: kind,
                    video_title: None,
                    payload: serde_json::json!({}),
                    credits_used: credits,
                    was_cached: cached,
                })
                .await
                .unwrap();
        }

        let stats = store.analysis_stats(owner).await.unwrap();
        assert_eq!(stats.total_analyses, 3);
        assert_eq!(stats.cached_analyses, 1);
        assert_eq!(stats.credits_spent, 3);
        assert_eq!(stats.by_type["summary"], 2);
        assert_eq!(stats.by_type["comments"], 1);

        let (rows, total) = store
            .list_analyses(&AnalysisHistoryFilter {
                user_id: owner,
                analysis_type: Some(AnalysisType::Comments),
                skip: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].analysis_type, AnalysisType::Comments);
    }
}
