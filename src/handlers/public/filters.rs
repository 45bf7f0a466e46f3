use axum::{extract::State, http::HeaderMap};
use serde::Deserialize;

use crate::app::AppState;
use crate::filter::FilterDefinition;
use crate::middleware::{optional_user, ApiPath, ApiQuery, ApiResponse, ApiResult};
use crate::services::FilterListing;

#[derive(Debug, Default, Deserialize)]
pub struct FilterListQuery {
    pub search: Option<String>,
}

/// GET /api/v1/filters?search= - List filter definitions
///
/// With a valid bearer token each entry carries the caller's `selected_value`.
///
/// ```json
/// {
///   "success": true,
///   "data": [
///     { "id": 1, "name": "Age", "hint": null, "type": "NUMBER_RANGE", "values": [] },
///     { "id": 2, "name": "Region", "hint": "Where you live", "type": "STRING_RANGE",
///       "values": ["north", "south"], "selected_value": "north" }
///   ]
/// }
/// ```
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<FilterListQuery>,
) -> ApiResult<Vec<FilterListing>> {
    let user = optional_user(&headers, &state.config.security.jwt_secret);
    let listed = state
        .filters
        .list(query.search.as_deref(), user.map(|u| u.user_id))
        .await?;
    Ok(ApiResponse::success(listed))
}

/// GET /api/v1/filters/:id
pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<FilterDefinition> {
    Ok(ApiResponse::success(state.filters.get(id).await?))
}
