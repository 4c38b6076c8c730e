//! Brand profile presets of the signed-in user.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::{
        ApiResponse,
        profiles::{ProfileRequest, ProfileResponse},
    },
    auth::current_user::CurrentUser,
    db::store::{ProfileStore, UserStore},
    errors::{Error, Result},
    types::{ProfileId, UserId},
};

fn not_found(id: ProfileId) -> Error {
    Error::NotFound {
        resource: "Profile".to_string(),
        id: id.to_string(),
    }
}

async fn require_account(state: &AppState, user_id: UserId) -> Result<()> {
    match state.store.get_user(user_id).await? {
        Some(_) => Ok(()),
        None => Err(Error::NotFound {
            resource: "User".to_string(),
            id: user_id.to_string(),
        }),
    }
}

/// List saved profiles, most recently updated first
#[utoipa::path(
    get,
    path = "/api/profiles",
    tag = "profiles",
    summary = "List brand profiles",
    responses(
        (status = 200, description = "All profiles of the caller", body = ApiResponse<Vec<ProfileResponse>>),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn list_profiles(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<ApiResponse<Vec<ProfileResponse>>>> {
    let rows = state.store.list_profiles(current_user.id).await?;
    Ok(Json(ApiResponse::ok(rows.into_iter().map(ProfileResponse::from).collect())))
}

/// Save a new profile
#[utoipa::path(
    post,
    path = "/api/profiles",
    tag = "profiles",
    summary = "Create a brand profile",
    request_body = ProfileRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Missing name or brand", body = crate::errors::ErrorBody),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
        (status = 404, description = "User has not completed onboarding", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn create_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    payload: std::result::Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<ProfileResponse>>)> {
    let Json(request) = payload?;
    let request = request.validate()?;
    require_account(&state, current_user.id).await?;
    let row = state.store.create_profile(current_user.id, &request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(row.into()))))
}

#[utoipa::path(
    get,
    path = "/api/profiles/{id}",
    tag = "profiles",
    summary = "Get a brand profile",
    params(("id" = uuid::Uuid, Path, description = "Profile id")),
    responses(
        (status = 200, description = "The profile", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
        (status = 404, description = "No such profile for this user", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn get_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    path: std::result::Result<Path<ProfileId>, PathRejection>,
) -> Result<Json<ApiResponse<ProfileResponse>>> {
    let Path(id) = path?;
    let row = state.store.get_profile(current_user.id, id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::ok(row.into())))
}

/// Replace a profile
#[utoipa::path(
    put,
    path = "/api/profiles/{id}",
    tag = "profiles",
    summary = "Update a brand profile",
    params(("id" = uuid::Uuid, Path, description = "Profile id")),
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Updated", body = ApiResponse<ProfileResponse>),
        (status = 400, description = "Missing name or brand", body = crate::errors::ErrorBody),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
        (status = 404, description = "No such profile for this user", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    path: std::result::Result<Path<ProfileId>, PathRejection>,
    payload: std::result::Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ProfileResponse>>> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let request = request.validate()?;
    let row = state
        .store
        .update_profile(current_user.id, id, &request)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(ApiResponse::ok(row.into())))
}

#[utoipa::path(
    delete,
    path = "/api/profiles/{id}",
    tag = "profiles",
    summary = "Delete a brand profile",
    params(("id" = uuid::Uuid, Path, description = "Profile id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Missing or invalid access token", body = crate::errors::ErrorBody),
        (status = 404, description = "No such profile for this user", body = crate::errors::ErrorBody),
    ),
    security(("BearerAuth" = []))
)]
#[instrument(skip_all)]
pub async fn delete_profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
    path: std::result::Result<Path<ProfileId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = path?;
    if !state.store.delete_profile(current_user.id, id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
