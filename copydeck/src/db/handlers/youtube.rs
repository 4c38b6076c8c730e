use crate::db::{
    errors::Result,
    handlers::PostgresStore,
    models::youtube::{
        AnalysisCacheDBResponse, AnalysisCacheUpsertDBRequest, AnalysisHistoryCreateDBRequest, AnalysisHistoryDBResponse,
        AnalysisHistoryFilter, AnalysisStatsDBResponse,
    },
    store::{AnalysisCacheStore, AnalysisHistoryStore},
};
use crate::types::{AnalysisId, AnalysisType, UserId, abbrev_uuid};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

const CACHE_COLUMNS: &str = "video_id, analysis_type, payload, hit_count, expires_at, created_at";
const HISTORY_COLUMNS: &str =
    "id, user_id, video_id, video_url, analysis_type, video_title, payload, credits_used, was_cached, created_at";

#[async_trait]
impl AnalysisCacheStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn get_cached_analysis(&self, video_id: &str, analysis_type: AnalysisType) -> Result<Option<AnalysisCacheDBResponse>> {
        let row = sqlx::query_as::<_, AnalysisCacheDBResponse>(&format!(
            "SELECT {CACHE_COLUMNS} FROM youtube_analysis_cache WHERE video_id = $1 AND analysis_type = $2"
        ))
        .bind(video_id)
        .bind(analysis_type)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    #[instrument(skip(self, request), fields(video_id = %request.video_id, analysis_type = %request.analysis_type), err)]
    async fn upsert_cached_analysis(&self, request: &AnalysisCacheUpsertDBRequest) -> Result<AnalysisCacheDBResponse> {
        let row = sqlx::query_as::<_, AnalysisCacheDBResponse>(&format!(
            r#"
            INSERT INTO youtube_analysis_cache (video_id, analysis_type, payload, expires_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (video_id, analysis_type) DO UPDATE
            SET payload = EXCLUDED.payload, expires_at = EXCLUDED.expires_at, hit_count = 0, created_at = NOW()
            RETURNING {CACHE_COLUMNS}
            "#
        ))
        .bind(&request.video_id)
        .bind(request.analysis_type)
        .bind(&request.payload)
        .bind(request.expires_at)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    #[instrument(skip(self), err)]
    async fn increment_cache_hits(&self, video_id: &str, analysis_type: AnalysisType) -> Result<()> {
        sqlx::query("UPDATE youtube_analysis_cache SET hit_count = hit_count + 1 WHERE video_id = $1 AND analysis_type = $2")
            .bind(video_id)
            .bind(analysis_type)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn purge_expired_analyses(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM youtube_analysis_cache WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl AnalysisHistoryStore for PostgresStore {
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), video_id = %request.video_id), err)]
    async fn create_analysis(&self, request: &AnalysisHistoryCreateDBRequest) -> Result<AnalysisHistoryDBResponse> {
        let row = sqlx::query_as::<_, AnalysisHistoryDBResponse>(&format!(
            r#"
            INSERT INTO youtube_analysis_history
                (user_id, video_id, video_url, analysis_type, video_title, payload, credits_used, was_cached)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {HISTORY_COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(&request.video_id)
        .bind(&request.video_url)
        .bind(request.analysis_type)
        .bind(&request.video_title)
        .bind(&request.payload)
        .bind(request.credits_used)
        .bind(request.was_cached)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list_analyses(&self, filter: &AnalysisHistoryFilter) -> Result<(Vec<AnalysisHistoryDBResponse>, i64)> {
        let rows = sqlx::query_as::<_, AnalysisHistoryDBResponse>(&format!(
            r#"
            SELECT {HISTORY_COLUMNS} FROM youtube_analysis_history
            WHERE user_id = $1 AND ($2::text IS NULL OR analysis_type = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.analysis_type)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(self.pool())
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM youtube_analysis_history WHERE user_id = $1 AND ($2::text IS NULL OR analysis_type = $2)",
        )
        .bind(filter.user_id)
        .bind(filter.analysis_type)
        .fetch_one(self.pool())
        .await?;

        Ok((rows, total))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), analysis_id = %abbrev_uuid(&id)), err)]
    async fn get_analysis(&self, user_id: UserId, id: AnalysisId) -> Result<Option<AnalysisHistoryDBResponse>> {
        let row = sqlx::query_as::<_, AnalysisHistoryDBResponse>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM youtube_analysis_history WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), analysis_id = %abbrev_uuid(&id)), err)]
    async fn delete_analysis(&self, user_id: UserId, id: AnalysisId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM youtube_analysis_history WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    async fn analysis_stats(&self, user_id: UserId) -> Result<AnalysisStatsDBResponse> {
        let (total_analyses, cached_analyses, credits_spent) = sqlx::query_as::<_, (i64, i64, i64)>(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE was_cached),
                   COALESCE(SUM(credits_used), 0)::BIGINT
            FROM youtube_analysis_history
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?;

        let by_type = sqlx::query_as::<_, (String, i64)>(
            "SELECT analysis_type, COUNT(*) FROM youtube_analysis_history WHERE user_id = $1 GROUP BY analysis_type",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .collect();

        Ok(AnalysisStatsDBResponse {
            total_analyses,
            cached_analyses,
            credits_spent,
            by_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::users::UserCreateDBRequest;
    use crate::db::store::UserStore;
    use chrono::Duration;
    use serde_json::json;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn cache_row(video_id: &str, analysis_type: AnalysisType, payload: serde_json::Value, expires_at: DateTime<Utc>) -> AnalysisCacheUpsertDBRequest {
        AnalysisCacheUpsertDBRequest {
            video_id: video_id.to_string(),
            analysis_type,
            payload,
            expires_at,
        }
    }

    async fn user(store: &PostgresStore) -> UserId {
        let id = Uuid::new_v4();
        store
            .ensure_user(&UserCreateDBRequest {
                id,
                email: None,
                free_credits: 10,
            })
            .await
            .unwrap();
        id
    }

    fn history_row(user_id: UserId, analysis_type: AnalysisType, credits_used: i32, was_cached: bool) -> AnalysisHistoryCreateDBRequest {
        AnalysisHistoryCreateDBRequest {
            user_id,
            video_id: "dQw4w9WgXcQ".to_string(),
            video_url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            analysis_type,
            video_title: Some("How we roast".to_string()),
            payload: json!({"aiSummary": "ok"}),
            credits_used,
            was_cached,
        }
    }

    #[sqlx::test]
    async fn test_cache_upsert_replaces_and_resets_hits(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let now = Utc::now();

        store
            .upsert_cached_analysis(&cache_row("dQw4w9WgXcQ", AnalysisType::Seo, json!({"v": 1}), now + Duration::hours(24)))
            .await
            .unwrap();
        store.increment_cache_hits("dQw4w9WgXcQ", AnalysisType::Seo).await.unwrap();
        store.increment_cache_hits("dQw4w9WgXcQ", AnalysisType::Seo).await.unwrap();
        let row = store.get_cached_analysis("dQw4w9WgXcQ", AnalysisType::Seo).await.unwrap().unwrap();
        assert_eq!(row.hit_count, 2);

        let replaced = store
            .upsert_cached_analysis(&cache_row("dQw4w9WgXcQ", AnalysisType::Seo, json!({"v": 2}), now + Duration::hours(48)))
            .await
            .unwrap();
        assert_eq!(replaced.payload, json!({"v": 2}));
        assert_eq!(replaced.hit_count, 0);
        assert_eq!(replaced.expires_at.timestamp(), (now + Duration::hours(48)).timestamp());

        assert!(store.get_cached_analysis("dQw4w9WgXcQ", AnalysisType::Summary).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_purge_removes_only_expired_rows(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let now = Utc::now();
        store
            .upsert_cached_analysis(&cache_row("aaaaaaaaaaa", AnalysisType::Comments, json!({}), now - Duration::hours(1)))
            .await
            .unwrap();
        store
            .upsert_cached_analysis(&cache_row("bbbbbbbbbbb", AnalysisType::Comments, json!({}), now + Duration::hours(6)))
            .await
            .unwrap();

        assert_eq!(store.purge_expired_analyses(now).await.unwrap(), 1);
        assert!(store.get_cached_analysis("aaaaaaaaaaa", AnalysisType::Comments).await.unwrap().is_none());
        assert!(store.get_cached_analysis("bbbbbbbbbbb", AnalysisType::Comments).await.unwrap().is_some());
    }

    #[sqlx::test]
    async fn test_history_filter_ownership_and_stats(pool: PgPool) {
        let store = PostgresStore::new(pool);
        let owner = user(&store).await;
        let stranger = user(&store).await;

        store.create_analysis(&history_row(owner, AnalysisType::Summary, 1, false)).await.unwrap();
        store.create_analysis(&history_row(owner, AnalysisType::Summary, 0, true)).await.unwrap();
        let seo = store.create_analysis(&history_row(owner, AnalysisType::Seo, 2, false)).await.unwrap();

        let (rows, total) = store
            .list_analyses(&AnalysisHistoryFilter {
                user_id: owner,
                analysis_type: Some(AnalysisType::Summary),
                skip: 0,
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert!(rows.iter().all(|row| row.analysis_type == AnalysisType::Summary));

        let (rows, total) = store
            .list_analyses(&AnalysisHistoryFilter {
                user_id: owner,
                analysis_type: None,
                skip: 1,
                limit: 1,
            })
            .await
            .unwrap();
        assert_eq!((rows.len(), total), (1, 3));

        assert!(store.get_analysis(stranger, seo.id).await.unwrap().is_none());
        assert!(!store.delete_analysis(stranger, seo.id).await.unwrap());
        assert!(store.delete_analysis(owner, seo.id).await.unwrap());

        let stats = store.analysis_stats(owner).await.unwrap();
        assert_eq!(stats.total_analyses, 2);
        assert_eq!(stats.cached_analyses, 1);
        assert_eq!(stats.credits_spent, 1);
        assert_eq!(stats.by_type.get("summary"), Some(&2));

        assert_eq!(store.analysis_stats(stranger).await.unwrap(), AnalysisStatsDBResponse::default());
    }
}
