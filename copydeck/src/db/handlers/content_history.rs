use crate::db::{
    errors::Result,
    handlers::PostgresStore,
    models::content_history::{ContentHistoryCreateDBRequest, ContentHistoryDBResponse, ContentHistoryFilter},
    store::ContentHistoryStore,
};
use crate::types::{ContentId, UserId, abbrev_uuid};
use async_trait::async_trait;
use tracing::instrument;

const CONTENT_COLUMNS: &str = "id, user_id, brand, keywords, platforms, ai_model, content, images, credits_used, created_at";

#[async_trait]
impl ContentHistoryStore for PostgresStore {
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create_content(&self, request: &ContentHistoryCreateDBRequest) -> Result<ContentHistoryDBResponse> {
        let row = sqlx::query_as::<_, ContentHistoryDBResponse>(&format!(
            r#"
            INSERT INTO content_history (user_id, brand, keywords, platforms, ai_model, content, images, credits_used)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CONTENT_COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(&request.brand)
        .bind(&request.keywords)
        .bind(&request.platforms)
        .bind(&request.ai_model)
        .bind(&request.content)
        .bind(&request.images)
        .bind(request.credits_used)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    #[instrument(skip(self, filter), fields(user_id = %abbrev_uuid(&filter.user_id)), err)]
    async fn list_content(&self, filter: &ContentHistoryFilter) -> Result<(Vec<ContentHistoryDBResponse>, i64)> {
        let rows = sqlx::query_as::<_, ContentHistoryDBResponse>(&format!(
            r#"
            SELECT {CONTENT_COLUMNS} FROM content_history
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(self.pool())
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM content_history WHERE user_id = $1")
            .bind(filter.user_id)
            .fetch_one(self.pool())
            .await?;

        Ok((rows, total))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), content_id = %abbrev_uuid(&id)), err)]
    async fn get_content(&self, user_id: UserId, id: ContentId) -> Result<Option<ContentHistoryDBResponse>> {
        let row = sqlx::query_as::<_, ContentHistoryDBResponse>(&format!(
            "SELECT {CONTENT_COLUMNS} FROM content_history WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), content_id = %abbrev_uuid(&id)), err)]
    async fn delete_content(&self, user_id: UserId, id: ContentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM content_history WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
