use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::app::AppState;
use crate::filter::{FilterSelection, UserFilters};
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Deserialize)]
pub struct SaveUserFiltersRequest {
    pub filter_values: Vec<FilterSelection>,
}

/// GET /api/v1/user/filters - The caller's selections
pub async fn get(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<UserFilters> {
    Ok(ApiResponse::success(state.filters.user_filters(user.user_id).await?))
}

/// PUT /api/v1/user/filters - Upsert selections
///
/// Each `{filter_id, value}` creates the selection or overwrites the existing
/// one. Selections not named in the request are left alone.
pub async fn put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<SaveUserFiltersRequest>,
) -> ApiResult<UserFilters> {
    let saved = state.filters.save_user_filters(user.user_id, request.filter_values).await?;
    Ok(ApiResponse::success(saved))
}

/// DELETE /api/v1/user/filters - Drop every selection the caller has made
pub async fn delete(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<()> {
    state.filters.clear_user_filters(user.user_id).await?;
    Ok(ApiResponse::no_content())
}
