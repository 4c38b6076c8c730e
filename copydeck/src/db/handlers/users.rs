use crate::db::{
    errors::Result,
    handlers::PostgresStore,
    models::users::{UserCreateDBRequest, UserDBResponse},
    store::UserStore,
};
use crate::types::{UserId, abbrev_uuid};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;

const USER_COLUMNS: &str =
    "id, email, free_credits, paid_credits, tier, monthly_reset_date, onboarding_completed, created_at, updated_at";

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_user(&self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.id)), err)]
    async fn ensure_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            INSERT INTO users (id, email, free_credits)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET email = COALESCE(EXCLUDED.email, users.email)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.id)
        .bind(&request.email)
        .bind(request.free_credits)
        .fetch_one(self.pool())
        .await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn reset_monthly_credits(&self, id: UserId, free_credits: i32, now: DateTime<Utc>) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            UPDATE users
            SET free_credits = $2, monthly_reset_date = $3, updated_at = $3
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(free_credits)
        .bind(now)
        .fetch_one(self.pool())
        .await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn deduct_credits(&self, id: UserId, amount: i32) -> Result<Option<UserDBResponse>> {
        // SET expressions see the pre-update row, so LEAST(free_credits, $2) is the free share.
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            r#"
            UPDATE users
            SET free_credits = free_credits - LEAST(free_credits, $2),
                paid_credits = paid_credits - ($2 - LEAST(free_credits, $2)),
                updated_at = NOW()
            WHERE id = $1 AND free_credits + paid_credits >= $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(amount)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn complete_onboarding(&self, id: UserId) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(&format!(
            "UPDATE users SET onboarding_completed = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_one(self.pool())
        .await?;
        Ok(user)
    }
}
