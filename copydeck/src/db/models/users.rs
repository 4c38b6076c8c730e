//! Database models for users.

use crate::types::{Tier, UserId};
use chrono::{DateTime, Datelike, Utc};
use sqlx::FromRow;

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: Option<String>,
    pub free_credits: i32,
    pub paid_credits: i32,
    pub tier: Tier,
    pub monthly_reset_date: DateTime<Utc>,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDBResponse {
    pub fn total_credits(&self) -> i32 {
        self.free_credits + self.paid_credits
    }

    /// A free-tier account whose last reset fell in an earlier calendar month is due a top-up.
    pub fn needs_monthly_reset(&self, now: DateTime<Utc>) -> bool {
        self.tier == Tier::Free
            && (self.monthly_reset_date.year(), self.monthly_reset_date.month()) != (now.year(), now.month())
    }
}

/// Database request for provisioning a user on first sign-in
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub id: UserId,
    pub email: Option<String>,
    pub free_credits: i32,
}
