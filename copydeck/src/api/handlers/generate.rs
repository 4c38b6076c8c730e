//! Content generation for guests and signed-in users.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;
use tracing::{info, instrument};

use crate::{
    AppState,
    api::models::generate::{GenerateRequest, GenerateResponse, GeneratedContent, Requester},
    auth::client_ip::ClientIp,
    credits,
    db::{
        models::content_history::ContentHistoryCreateDBRequest,
        store::{ContentHistoryStore, TrialUsageStore},
    },
    errors::{Error, Result},
    generation::generate_platforms,
    images::ImageResolver,
    types::abbrev_uuid,
};

/// Generate platform copy and images for a brand
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "generate",
    summary = "Generate platform content",
    description = "Writes copy for each requested platform and resolves images (uploads, then stock photos, then placeholders).

Guests are limited to a one-off trial per IP address. Users are charged per successfully generated platform.",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Content generated. Platforms that failed carry `status: failed` and are not charged.", body = GenerateResponse),
        (status = 400, description = "Invalid input", body = crate::errors::ErrorBody),
        (status = 403, description = "Trial used up (`TRIAL_EXHAUSTED`) or not enough credits (`INSUFFICIENT_CREDITS`)", body = crate::errors::ErrorBody),
        (status = 404, description = "Unknown user", body = crate::errors::ErrorBody),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorBody),
    )
)]
#[instrument(skip_all, fields(ip = %ip))]
pub async fn generate(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>> {
    let Json(request) = payload?;
    let request = request.validate()?;
    let now = Utc::now();
    let credits_config = &state.config.credits;

    // Quota checks happen before any external call
    let user = match request.requester {
        Requester::Guest => {
            if let Some(max) = credits_config.guest_max_platforms.filter(|max| request.platforms.len() > *max) {
                return Err(Error::BadRequest {
                    message: format!("Guests can generate at most {max} platform(s) at a time"),
                });
            }
            let usage = state.store.get_trial_usage(&ip).await?;
            if usage.is_some_and(|usage| usage.is_exhausted(credits_config.guest_trial_limit)) {
                return Err(Error::TrialExhausted { ip });
            }
            None
        }
        Requester::User(user_id) => {
            let user = credits::load_user(&*state.store, credits_config, user_id, now).await?;
            credits::ensure_affordable(&user, credits::generation_cost(credits_config, request.platforms.len()))?;
            Some(user)
        }
    };

    let resolver = ImageResolver::new(state.providers.captioner.clone(), state.providers.stock.clone());
    let images = resolver
        .resolve(request.required_images(), &request.images, &request.brief.image_query())
        .await;

    let generator = state.providers.text_generator(request.ai_model);
    let platforms = generate_platforms(generator.as_ref(), &request.brief, &request.platforms, &images).await;
    let succeeded = platforms.values().filter(|content| content.succeeded()).count();

    let (credits_used, remaining_credits) = match &user {
        None => {
            if succeeded > 0 {
                state.store.record_trial_usage(&ip, now).await?;
            }
            (0, None)
        }
        Some(user) => {
            let cost = credits::generation_cost(credits_config, succeeded);
            let charge = credits::charge(&*state.store, user, cost).await?;

            let history = ContentHistoryCreateDBRequest {
                user_id: user.id,
                brand: request.brief.brand.clone(),
                keywords: request.brief.keywords.clone(),
                platforms: request.platforms.iter().map(|p| p.as_str().to_string()).collect(),
                ai_model: request.ai_model.as_str().to_string(),
                content: serde_json::to_value(&platforms).map_err(|e| Error::Other(e.into()))?,
                images: serde_json::to_value(&images).map_err(|e| Error::Other(e.into()))?,
                credits_used: charge.charged,
            };
            state.store.create_content(&history).await?;
            info!(
                "Generated {}/{} platforms for user {}, charged {} credits",
                succeeded,
                request.platforms.len(),
                abbrev_uuid(&user.id),
                charge.charged
            );
            (charge.charged, Some(charge.user.total_credits()))
        }
    };

    Ok(Json(GenerateResponse {
        success: true,
        data: GeneratedContent {
            brand: request.brief.brand,
            ai_model: request.ai_model,
            platforms,
            images,
        },
        credits_used,
        remaining_credits,
    }))
}
