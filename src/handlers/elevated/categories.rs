use axum::extract::State;

use crate::app::AppState;
use crate::database::models::{Category, CategoryInput};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult};

pub async fn create(State(state): State<AppState>, ApiJson(input): ApiJson<CategoryInput>) -> ApiResult<Category> {
    Ok(ApiResponse::created(state.categories.create(input).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Category> {
    Ok(ApiResponse::success(state.categories.update(id, input).await?))
}

pub async fn delete(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<()> {
    state.categories.delete(id).await?;
    Ok(ApiResponse::no_content())
}
