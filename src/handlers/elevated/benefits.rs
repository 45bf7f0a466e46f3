use axum::extract::State;

use crate::app::AppState;
use crate::database::models::{Benefit, BenefitInput};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult};

/// POST /api/v1/admin/benefits
///
/// ```json
/// {
///   "title": "Child allowance",
///   "content": "...",
///   "bonus": "...",
///   "filters": [ { "filter_id": 1, "from": "0", "to": "6" } ],
///   "categories": [ 3 ]
/// }
/// ```
pub async fn create(State(state): State<AppState>, ApiJson(input): ApiJson<BenefitInput>) -> ApiResult<Benefit> {
    Ok(ApiResponse::created(state.benefits.create(input).await?))
}

/// PUT /api/v1/admin/benefits/:id - filters are replaced; categories only when sent
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<BenefitInput>,
) -> ApiResult<Benefit> {
    Ok(ApiResponse::success(state.benefits.update(id, input).await?))
}

pub async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<()> {
    state.benefits.delete(id).await?;
    Ok(ApiResponse::no_content())
}
