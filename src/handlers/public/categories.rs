use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::{Category, CategoryList};
use crate::middleware::{ApiPath, ApiQuery, ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CategoryListQuery>,
) -> ApiResult<CategoryList> {
    let listed = state
        .categories
        .list(query.search.as_deref(), query.limit, query.offset)
        .await?;
    Ok(ApiResponse::success(listed))
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Category> {
    Ok(ApiResponse::success(state.categories.get(id).await?))
}
