use axum::extract::State;

use crate::app::AppState;
use crate::filter::{FilterDefinition, FilterDefinitionInput};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult};

/// POST /api/v1/admin/filters
///
/// ```json
/// { "name": "Age", "type": "NUMBER_RANGE", "hint": "Years", "values": [] }
/// ```
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<FilterDefinitionInput>,
) -> ApiResult<FilterDefinition> {
    Ok(ApiResponse::created(state.filters.create(input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<FilterDefinitionInput>,
) -> ApiResult<FilterDefinition> {
    Ok(ApiResponse::success(state.filters.update(id, input).await?))
}

/// DELETE /api/v1/admin/filters/:id - also removes every association using it
pub async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<()> {
    state.filters.delete(id).await?;
    Ok(ApiResponse::no_content())
}
