use axum::{extract::State, Extension};
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{Child, ChildInput, ChildList};
use crate::filter::{Association, FilterAssignment};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser};

#[derive(Debug, Default, Deserialize)]
pub struct ChildListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SaveChildFiltersRequest {
    pub filters: Vec<FilterAssignment>,
}

/// POST /api/v1/children
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiJson(input): ApiJson<ChildInput>,
) -> ApiResult<Child> {
    Ok(ApiResponse::created(state.children.create(user.user_id, input).await?))
}

/// GET /api/v1/children?limit=&offset=
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ChildListQuery>,
) -> ApiResult<ChildList> {
    let listed = state.children.list(user.user_id, query.limit, query.offset).await?;
    Ok(ApiResponse::success(listed))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Child> {
    Ok(ApiResponse::success(state.children.get(user.user_id, id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ChildInput>,
) -> ApiResult<Child> {
    Ok(ApiResponse::success(state.children.update(user.user_id, id, input).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    state.children.delete(user.user_id, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/v1/children/:id/filters
pub async fn filters_get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Vec<Association>> {
    Ok(ApiResponse::success(state.children.filters(user.user_id, id).await?))
}

/// PUT /api/v1/children/:id/filters - Replace the child's filter set
///
/// ```json
/// { "filters": [ { "filter_id": 1, "from": "2019-01-01", "to": "2019-12-31" } ] }
/// ```
///
/// An empty `filters` list clears the set.
pub async fn filters_put(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(request): ApiJson<SaveChildFiltersRequest>,
) -> ApiResult<Vec<Association>> {
    let saved = state.children.save_filters(user.user_id, id, request.filters).await?;
    Ok(ApiResponse::success(saved))
}
