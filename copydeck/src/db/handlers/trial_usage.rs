use crate::db::{errors::Result, handlers::PostgresStore, models::trial_usage::TrialUsageDBResponse, store::TrialUsageStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

#[async_trait]
impl TrialUsageStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn get_trial_usage(&self, ip_address: &str) -> Result<Option<TrialUsageDBResponse>> {
        let usage = sqlx::query_as::<_, TrialUsageDBResponse>(
            "SELECT ip_address, usage_count, is_blocked, first_used_at, last_used_at FROM trial_usage WHERE ip_address = $1",
        )
        .bind(ip_address)
        .fetch_optional(self.pool())
        .await?;
        Ok(usage)
    }

    #[instrument(skip(self), err)]
    async fn record_trial_usage(&self, ip_address: &str, now: DateTime<Utc>) -> Result<TrialUsageDBResponse> {
        let usage = sqlx::query_as::<_, TrialUsageDBResponse>(
            r#"
            INSERT INTO trial_usage (ip_address, usage_count, first_used_at, last_used_at)
            VALUES ($1, 1, $2, $2)
            ON CONFLICT (ip_address) DO UPDATE
            SET usage_count = trial_usage.usage_count + 1, last_used_at = EXCLUDED.last_used_at
            RETURNING ip_address, usage_count, is_blocked, first_used_at, last_used_at
            "#,
        )
        .bind(ip_address)
        .bind(now)
        .fetch_one(self.pool())
        .await?;
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_record_upserts_and_counts(pool: PgPool) {
        let store = PostgresStore::new(pool);
        assert!(store.get_trial_usage("203.0.113.7").await.unwrap().is_none());

        let first = Utc::now();
        let usage = store.record_trial_usage("203.0.113.7", first).await.unwrap();
        assert_eq!(usage.usage_count, 1);
        assert!(usage.is_exhausted(1));
        assert!(!usage.is_exhausted(2));

        let later = first + Duration::minutes(5);
        let usage = store.record_trial_usage("203.0.113.7", later).await.unwrap();
        assert_eq!(usage.usage_count, 2);
        assert_eq!(usage.first_used_at.timestamp(), first.timestamp());
        assert_eq!(usage.last_used_at.timestamp(), later.timestamp());

        let other = store.record_trial_usage("198.51.100.1", later).await.unwrap();
        assert_eq!(other.usage_count, 1);
    }

    #[sqlx::test]
    async fn test_blocked_ip_is_exhausted(pool: PgPool) {
        let store = PostgresStore::new(pool);
        sqlx::query("INSERT INTO trial_usage (ip_address, usage_count, is_blocked) VALUES ($1, 0, TRUE)")
            .bind("192.0.2.9")
            .execute(store.pool())
            .await
            .unwrap();

        let usage = store.get_trial_usage("192.0.2.9").await.unwrap().unwrap();
        assert!(usage.is_exhausted(5));
    }
}
