use crate::db::{
    errors::Result,
    handlers::PostgresStore,
    models::profiles::{ProfileDBRequest, ProfileDBResponse},
    store::ProfileStore,
};
use crate::types::{ProfileId, UserId, abbrev_uuid};
use async_trait::async_trait;
use tracing::instrument;

const PROFILE_COLUMNS: &str = "id, user_id, name, brand, industry, tone, target_age, keywords, created_at, updated_at";

#[async_trait]
impl ProfileStore for PostgresStore {
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&user_id)), err)]
    async fn create_profile(&self, user_id: UserId, request: &ProfileDBRequest) -> Result<ProfileDBResponse> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(&format!(
            r#"
            INSERT INTO profiles (user_id, name, brand, industry, tone, target_age, keywords)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&request.name)
        .bind(&request.brand)
        .bind(&request.industry)
        .bind(&request.tone)
        .bind(&request.target_age)
        .bind(&request.keywords)
        .fetch_one(self.pool())
        .await?;
        Ok(profile)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    async fn list_profiles(&self, user_id: UserId) -> Result<Vec<ProfileDBResponse>> {
        let profiles = sqlx::query_as::<_, ProfileDBResponse>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1 ORDER BY updated_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(profiles)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), profile_id = %abbrev_uuid(&id)), err)]
    async fn get_profile(&self, user_id: UserId, id: ProfileId) -> Result<Option<ProfileDBResponse>> {
        let profile =
            sqlx::query_as::<_, ProfileDBResponse>(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1 AND user_id = $2"))
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool())
                .await?;
        Ok(profile)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&user_id), profile_id = %abbrev_uuid(&id)), err)]
    async fn update_profile(&self, user_id: UserId, id: ProfileId, request: &ProfileDBRequest) -> Result<Option<ProfileDBResponse>> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(&format!(
            r#"
            UPDATE profiles
            SET name = $3, brand = $4, industry = $5, tone = $6, target_age = $7, keywords = $8, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(&request.name)
        .bind(&request.brand)
        .bind(&request.industry)
        .bind(&request.tone)
        .bind(&request.target_age)
        .bind(&request.keywords)
        .fetch_optional(self.pool())
        .await?;
        Ok(profile)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), profile_id = %abbrev_uuid(&id)), err)]
    async fn delete_profile(&self, user_id: UserId, id: ProfileId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
