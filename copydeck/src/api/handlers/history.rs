//! Content generation history of the signed-in user.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::{
        ApiResponse,
        history::ContentHistoryResponse,
        pagination::{PageQuery, Paginated},
    },
    auth::current_user::CurrentUser,
    db::{models::content_history::ContentHistoryFilter, store::ContentHistoryStore},
    errors::{Error, Result},
    types::ContentId,
};

fn not_found(id: ContentId) -> Error {
    Error::NotFound {
        resource: "Content".to_string(),
        id: id.to_string(),
    }
}

/// List past generations, newest first
#[utoipa::path(
    get,
    path = "/api/history",
    tag = "history",
    summary = "List generated content",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of past generations", body = ApiResponse<Paginated<ContentHistoryResponse>>),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_content(
    State(state): State<AppState>,
    current_user: CurrentUser,
    query: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Paginated<ContentHistoryResponse>>>> {
    let Query(page) = query?;
    let filter = ContentHistoryFilter {
        user_id: current_user.id,
        skip: page.skip(),
        limit: page.limit(),
    };
    let (rows, total) = state.store.list_content(&filter).await?;
    let items = rows.into_iter().map(ContentHistoryResponse::from).collect();
    Ok(Json(ApiResponse::ok(Paginated::new(items, &page, total))))
}

/// Get one past generation
#[utoipa::path(
    get,
    path = "/api/history/{id}",
    tag = "history",
    summary = "Get generated content",
    params(("id" = uuid::Uuid, Path, description = "Content history id")),
    responses(
        (status = 200, description = "The generation", body = ApiResponse<ContentHistoryResponse>),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
        (status = 404, description = "No such generation for this user", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_content(
    State(state): State<AppState>,
    current_user: CurrentUser,
    path: std::result::Result<Path<ContentId>, PathRejection>,
) -> Result<Json<ApiResponse<ContentHistoryResponse>>> {
    let Path(id) = path?;
    let row = state.store.get_content(current_user.id, id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::ok(row.into())))
}

/// Delete one past generation
#[utoipa::path(
    delete,
    path = "/api/history/{id}",
    tag = "history",
    summary = "Delete generated content",
    params(("id" = uuid::Uuid, Path, description = "Content history id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
        (status = 404, description = "No such generation for this user", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_content(
    State(state): State<AppState>,
    current_user: CurrentUser,
    path: std::result::Result<Path<ContentId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = path?;
    if !state.store.delete_content(current_user.id, id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
