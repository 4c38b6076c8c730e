use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::users::UserDBResponse;
use crate::types::{Tier, UserId};

/// Credit balances after the monthly reset has been applied.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditsResponse {
    pub free_credits: i32,
    pub paid_credits: i32,
    pub total_credits: i32,
    pub tier: Tier,
    pub monthly_reset_date: DateTime<Utc>,
}

impl From<&UserDBResponse> for CreditsResponse {
    fn from(user: &UserDBResponse) -> Self {
        Self {
            free_credits: user.free_credits,
            paid_credits: user.paid_credits,
            total_credits: user.total_credits(),
            tier: user.tier,
            monthly_reset_date: user.monthly_reset_date,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: Option<String>,
    pub tier: Tier,
    pub onboarding_completed: bool,
    pub credits: CreditsResponse,
    pub created_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(user: UserDBResponse) -> Self {
        Self {
            credits: CreditsResponse::from(&user),
            id: user.id,
            email: user.email,
            tier: user.tier,
            onboarding_completed: user.onboarding_completed,
            created_at: user.created_at,
        }
    }
}
