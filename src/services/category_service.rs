use super::{non_negative, ServiceError, ServiceResult};
use crate::database::models::{Category, CategoryInput, CategoryList};
use crate::database::DynStore;
use crate::filter::Window;

#[derive(Clone)]
pub struct CategoryService {
    store: DynStore,
}

impl CategoryService {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: CategoryInput) -> ServiceResult<Category> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::validation("Category name cannot be empty"));
        }
        Ok(self.store.create_category(&input).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Category> {
        Ok(self.store.get_category(id).await?)
    }

    pub async fn list(
        &self,
        search: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ServiceResult<CategoryList> {
        let window = Window::new(non_negative("limit", limit, 0)?, non_negative("offset", offset, 0)?);
        let (categories, total) = self.store.list_categories(search, window).await?;
        Ok(CategoryList { categories, total })
    }

    pub async fn update(&self, id: i64, input: CategoryInput) -> ServiceResult<Category> {
        if input.name.trim().is_empty() {
            return Err(ServiceError::validation("Category name cannot be empty"));
        }
        Ok(self.store.update_category(id, &input).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        Ok(self.store.delete_category(id).await?)
    }
}
