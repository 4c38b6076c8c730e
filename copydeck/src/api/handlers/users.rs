//! Account routes for the signed-in user.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::{info, instrument};

use crate::{
    AppState,
    api::models::{
        ApiResponse,
        users::{CreditsResponse, UserResponse},
    },
    auth::current_user::CurrentUser,
    credits,
    db::{models::users::UserCreateDBRequest, store::UserStore},
    errors::Result,
    types::abbrev_uuid,
};

/// Current credit balances
#[utoipa::path(
    get,
    path = "/api/user/credits",
    tag = "user",
    summary = "Get credit balances",
    description = "Free-tier balances are topped up first if a new calendar month has started since the last reset.",
    responses(
        (status = 200, description = "Balances", body = ApiResponse<CreditsResponse>),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
        (status = 404, description = "User has not completed onboarding", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all, fields(user = %abbrev_uuid(&current_user.id)))]
pub async fn get_credits(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ApiResponse<CreditsResponse>>> {
    let user = credits::load_user(&*state.store, &state.config.credits, current_user.id, Utc::now()).await?;
    Ok(Json(ApiResponse::ok(CreditsResponse::from(&user))))
}

/// Create the account row if needed and mark onboarding complete
#[utoipa::path(
    post,
    path = "/api/user/onboarding",
    tag = "user",
    summary = "Complete onboarding",
    description = "Idempotent. The first call creates the account with the monthly free credit allowance.",
    responses(
        (status = 200, description = "The account", body = ApiResponse<UserResponse>),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all, fields(user = %abbrev_uuid(&current_user.id)))]
pub async fn complete_onboarding(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ApiResponse<UserResponse>>> {
    let request = UserCreateDBRequest {
        id: current_user.id,
        email: current_user.email,
        free_credits: state.config.credits.free_monthly_credits,
    };
    let user = state.store.ensure_user(&request).await?;
    if !user.onboarding_completed {
        info!("User {} completed onboarding", abbrev_uuid(&user.id));
    }
    let user = state.store.complete_onboarding(user.id).await?;
    Ok(Json(ApiResponse::ok(user.into())))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::Value;

    use crate::db::store::UserStore;
    use crate::test_utils::{bearer, create_test_app, test_user};
    use crate::types::Tier;

    #[tokio::test]
    async fn test_onboarding_provisions_the_account_once() {
        let app = create_test_app();
        let user_id = uuid::Uuid::new_v4();

        app.server
            .get("/api/user/credits")
            .add_header("authorization", bearer(user_id))
            .await
            .assert_status_not_found();

        let response = app
            .server
            .post("/api/user/onboarding")
            .add_header("authorization", bearer(user_id))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["onboardingCompleted"], true);
        assert_eq!(body["data"]["email"], "owner@bean.example");
        assert_eq!(body["data"]["credits"]["freeCredits"], 10);

        // A second call doesn't refill the balance
        let mut spent = app.store.get_user(user_id).await.unwrap().unwrap();
        spent.free_credits = 4;
        app.store.put_user(spent);
        let body: Value = app
            .server
            .post("/api/user/onboarding")
            .add_header("authorization", bearer(user_id))
            .await
            .json();
        assert_eq!(body["data"]["credits"]["freeCredits"], 4);
    }

    #[tokio::test]
    async fn test_credits_apply_monthly_reset() {
        let app = create_test_app();
        let mut user = test_user(1, 7);
        user.monthly_reset_date = Utc::now() - Duration::days(40);
        app.store.put_user(user.clone());

        let body: Value = app
            .server
            .get("/api/user/credits")
            .add_header("authorization", bearer(user.id))
            .await
            .json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["freeCredits"], 10);
        assert_eq!(body["data"]["paidCredits"], 7);
        assert_eq!(body["data"]["totalCredits"], 17);
        assert_eq!(body["data"]["tier"], "free");

        let mut pro = test_user(0, 100);
        pro.tier = Tier::Pro;
        pro.monthly_reset_date = Utc::now() - Duration::days(40);
        app.store.put_user(pro.clone());
        let body: Value = app
            .server
            .get("/api/user/credits")
            .add_header("authorization", bearer(pro.id))
            .await
            .json();
        assert_eq!(body["data"]["freeCredits"], 0);
    }
}
