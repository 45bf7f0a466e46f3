use axum::extract::State;

use crate::app::AppState;
use crate::database::models::{Benefit, BenefitList};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult};
use crate::services::SearchRequest;

/// POST /api/v1/benefits/search - Search the catalogue
///
/// ```json
/// {
///   "search": "allowance",
///   "filters": [
///     { "filter_id": 1, "from": "18", "to": "25" },
///     { "filter_id": 2, "value": "north" }
///   ],
///   "limit": 20,
///   "offset": 0
/// }
/// ```
///
/// Responds with `{ benefits: [...], total }` where `total` counts every match
/// before paging.
pub async fn search(State(state): State<AppState>, ApiJson(request): ApiJson<SearchRequest>) -> ApiResult<BenefitList> {
    let page = state.benefits.search(request).await?;
    Ok(ApiResponse::success(page.into()))
}

/// GET /api/v1/benefits/:id
pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Benefit> {
    Ok(ApiResponse::success(state.benefits.get(id).await?))
}
