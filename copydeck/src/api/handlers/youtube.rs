//! YouTube analyzer routes: cached analysis plus the caller's analysis history.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::{
    AppState,
    api::models::{
        ApiResponse,
        pagination::Paginated,
        youtube::{AnalysisHistoryQuery, AnalysisHistoryResponse, AnalysisStatsResponse, AnalyzeRequest, AnalyzeResponse},
    },
    auth::current_user::CurrentUser,
    credits,
    db::{
        models::youtube::{AnalysisHistoryCreateDBRequest, AnalysisHistoryFilter},
        store::AnalysisHistoryStore,
    },
    errors::{Error, Result},
    types::{AnalysisId, abbrev_uuid},
    youtube::{
        analysis::{AnalysisPayload, VideoAnalyzer},
        cache::AnalysisCache,
    },
};

/// Analyze a YouTube video
#[utoipa::path(
    post,
    path = "/api/youtube/analyze",
    tag = "youtube",
    summary = "Analyze a video",
    description = "Returns a cached result when one is fresh (free), otherwise fetches the video, computes metrics, \
asks the model for a summary and charges the analysis price.

| type | cached for | credits |
|------|------------|---------|
| summary | 72h | 1 |
| seo | 24h | 2 |
| engagement | 12h | 1 |
| comments | 6h | 2 |",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis result", body = ApiResponse<AnalyzeResponse>),
        (status = 400, description = "Invalid input (`INVALID_INPUT`) or URL (`INVALID_VIDEO_URL`)", body = crate::errors::ErrorBody),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
        (status = 403, description = "Not enough credits", body = crate::errors::ErrorBody),
        (status = 404, description = "Unknown user or video", body = crate::errors::ErrorBody),
        (status = 500, description = "YouTube or model failure", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all, fields(user = %abbrev_uuid(&current_user.id)))]
pub async fn analyze_video(
    State(state): State<AppState>,
    current_user: CurrentUser,
    payload: std::result::Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AnalyzeResponse>>> {
    let Json(request) = payload?;
    let request = request.validate()?;
    let now = Utc::now();

    let user = credits::load_user(&*state.store, &state.config.credits, current_user.id, now).await?;
    let cache = AnalysisCache::new(state.store.clone());

    let cached = match cache.get(&request.video_id, request.analysis_type, now).await? {
        Some(entry) => match serde_json::from_value::<AnalysisPayload>(entry.payload) {
            Ok(payload) => Some((payload, entry.expires_at)),
            Err(e) => {
                warn!("Discarding undecodable cache entry for {}: {}", request.video_id, e);
                None
            }
        },
        None => None,
    };

    let (payload, expires_at, credits_used, was_cached) = match cached {
        Some((payload, expires_at)) => (payload, expires_at, 0, true),
        None => {
            let cost = request.analysis_type.credit_cost();
            credits::ensure_affordable(&user, cost)?;

            let analyzer = VideoAnalyzer::new(
                state.providers.videos.as_ref(),
                state.providers.openai.as_ref(),
                state.providers.max_comments,
            );
            let payload = analyzer.analyze(&request.video_id, request.analysis_type).await?;
            let value = serde_json::to_value(&payload).map_err(|e| Error::Other(e.into()))?;
            let entry = cache.put(&request.video_id, request.analysis_type, value, now).await?;
            let charge = credits::charge(&*state.store, &user, cost).await?;
            (payload, entry.expires_at, charge.charged, false)
        }
    };

    state
        .store
        .create_analysis(&AnalysisHistoryCreateDBRequest {
            user_id: user.id,
            video_id: request.video_id.clone(),
            video_url: request.video_url,
            analysis_type: request.analysis_type,
            video_title: Some(payload.video_info.title.clone()),
            payload: serde_json::to_value(&payload).map_err(|e| Error::Other(e.into()))?,
            credits_used,
            was_cached,
        })
        .await?;

    info!(
        "Served {} analysis of {} (cached: {}, credits: {})",
        request.analysis_type, request.video_id, was_cached, credits_used
    );

    Ok(Json(ApiResponse::ok(AnalyzeResponse {
        video_id: request.video_id,
        video_info: payload.video_info,
        analysis_result: payload.analysis_result,
        ai_summary: payload.ai_summary,
        credits_used,
        was_cached,
        cache_expires_at: expires_at,
    })))
}

/// List the caller's analyses, newest first
#[utoipa::path(
    get,
    path = "/api/youtube/history",
    tag = "youtube",
    summary = "List analysis history",
    params(AnalysisHistoryQuery),
    responses(
        (status = 200, description = "One page of analyses", body = ApiResponse<Paginated<AnalysisHistoryResponse>>),
        (status = 400, description = "Unknown analysis type", body = crate::errors::ErrorBody),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_analyses(
    State(state): State<AppState>,
    current_user: CurrentUser,
    query: std::result::Result<Query<AnalysisHistoryQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Paginated<AnalysisHistoryResponse>>>> {
    let Query(query) = query?;
    let page = query.page_query();
    let filter = AnalysisHistoryFilter {
        user_id: current_user.id,
        analysis_type: query.analysis_type()?,
        skip: page.skip(),
        limit: page.limit(),
    };
    let (rows, total) = state.store.list_analyses(&filter).await?;
    let items = rows.into_iter().map(AnalysisHistoryResponse::from).collect();
    Ok(Json(ApiResponse::ok(Paginated::new(items, &page, total))))
}

/// Get one of the caller's analyses
#[utoipa::path(
    get,
    path = "/api/youtube/history/{id}",
    tag = "youtube",
    summary = "Get an analysis",
    params(("id" = uuid::Uuid, Path, description = "Analysis history id")),
    responses(
        (status = 200, description = "The analysis", body = ApiResponse<AnalysisHistoryResponse>),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
        (status = 404, description = "No such analysis for this user", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_analysis(
    State(state): State<AppState>,
    current_user: CurrentUser,
    path: std::result::Result<Path<AnalysisId>, PathRejection>,
) -> Result<Json<ApiResponse<AnalysisHistoryResponse>>> {
    let Path(id) = path?;
    let row = state
        .store
        .get_analysis(current_user.id, id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Analysis".to_string(),
            id: id.to_string(),
        })?;
    Ok(Json(ApiResponse::ok(row.into())))
}

/// Delete one of the caller's analyses
#[utoipa::path(
    delete,
    path = "/api/youtube/history/{id}",
    tag = "youtube",
    summary = "Delete an analysis",
    params(("id" = uuid::Uuid, Path, description = "Analysis history id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
        (status = 404, description = "No such analysis for this user", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_analysis(
    State(state): State<AppState>,
    current_user: CurrentUser,
    path: std::result::Result<Path<AnalysisId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = path?;
    if !state.store.delete_analysis(current_user.id, id).await? {
        return Err(Error::NotFound {
            resource: "Analysis".to_string(),
            id: id.to_string(),
        });
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Totals over the caller's analyses
#[utoipa::path(
    get,
    path = "/api/youtube/stats",
    tag = "youtube",
    summary = "Analysis statistics",
    responses(
        (status = 200, description = "Totals", body = ApiResponse<AnalysisStatsResponse>),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn analysis_stats(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ApiResponse<AnalysisStatsResponse>>> {
    let stats = state.store.analysis_stats(current_user.id).await?;
    Ok(Json(ApiResponse::ok(stats.into())))
}
