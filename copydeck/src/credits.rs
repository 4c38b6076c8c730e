//! Credit bookkeeping rules shared by the generation and analysis routes.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::CreditsConfig;
use crate::db::{models::users::UserDBResponse, store::UserStore};
use crate::errors::{Error, Result};
use crate::types::{UserId, abbrev_uuid};

/// Credits charged for generating `platforms` platforms.
pub fn generation_cost(config: &CreditsConfig, platforms: usize) -> i32 {
    config.credits_per_platform.saturating_mul(i32::try_from(platforms).unwrap_or(i32::MAX))
}

/// Load a user and top up their free credits if a new month has started since the last reset.
pub async fn load_user<S>(store: &S, config: &CreditsConfig, user_id: UserId, now: DateTime<Utc>) -> Result<UserDBResponse>
where
    S: UserStore + ?Sized,
{
    let user = store.get_user(user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: user_id.to_string(),
    })?;

    if !user.needs_monthly_reset(now) {
        return Ok(user);
    }

    info!(
        "Resetting monthly free credits for user {} (last reset {})",
        abbrev_uuid(&user_id),
        user.monthly_reset_date
    );
    Ok(store.reset_monthly_credits(user_id, config.free_monthly_credits, now).await?)
}

/// Fail with a quota error if the user can't cover `cost`.
pub fn ensure_affordable(user: &UserDBResponse, cost: i32) -> Result<()> {
    if user.total_credits() < cost {
        return Err(Error::InsufficientCredits {
            required: cost,
            available: user.total_credits(),
        });
    }
    Ok(())
}

/// Outcome of charging for work that was already delivered.
#[derive(Debug, Clone)]
pub struct Charge {
    /// Credits actually taken; zero when the balance ran out under a concurrent request.
    pub charged: i32,
    pub user: UserDBResponse,
}

/// Take `amount` credits for work that has already completed.
///
/// Affordability is checked before any external call. If a concurrent request spent the balance in
/// between, the work is delivered uncharged and the shortfall is logged.
pub async fn charge<S>(store: &S, user: &UserDBResponse, amount: i32) -> Result<Charge>
where
    S: UserStore + ?Sized,
{
    if amount <= 0 {
        return Ok(Charge {
            charged: 0,
            user: user.clone(),
        });
    }
    if let Some(updated) = store.deduct_credits(user.id, amount).await? {
        return Ok(Charge {
            charged: amount,
            user: updated,
        });
    }

    let current = store.get_user(user.id).await?.unwrap_or_else(|| user.clone());
    warn!(
        "Balance of user {} dropped to {} before a charge of {} credits; delivering uncharged",
        abbrev_uuid(&user.id),
        current.total_credits(),
        amount
    );
    Ok(Charge {
        charged: 0,
        user: current,
    })
}
