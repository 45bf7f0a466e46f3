use async_trait::async_trait;
use std::sync::Arc;

use super::manager::DatabaseError;
use super::models::{Benefit, BenefitInput, Category, CategoryInput, Child, ChildInput};
use crate::filter::{
    Association, FilterAssignment, FilterDefinition, FilterDefinitionInput, FilterValue, OwnerKind, Window,
};

pub type StoreResult<T> = Result<T, DatabaseError>;

/// Filter definitions
#[async_trait]
pub trait FilterStore: Send + Sync {
    async fn create_filter(&self, input: &FilterDefinitionInput) -> StoreResult<FilterDefinition>;

    async fn get_filter(&self, id: i64) -> StoreResult<FilterDefinition>;

    /// Case-sensitive substring match on name, ordered by id
    async fn list_filters(&self, search: Option<&str>) -> StoreResult<Vec<FilterDefinition>>;

    async fn update_filter(&self, id: i64, input: &FilterDefinitionInput) -> StoreResult<FilterDefinition>;

    /// Removes the definition and every association that references it
    async fn delete_filter(&self, id: i64) -> StoreResult<()>;
}

/// Per-owner filter associations, one table per `OwnerKind`
#[async_trait]
pub trait AssociationStore: Send + Sync {
    async fn get_association(&self, kind: OwnerKind, owner_id: i64, filter_id: i64) -> StoreResult<Association>;

    async fn list_associations(&self, kind: OwnerKind, owner_id: i64) -> StoreResult<Vec<Association>>;

    async fn create_association(
        &self,
        kind: OwnerKind,
        owner_id: i64,
        filter_id: i64,
        value: &FilterValue,
    ) -> StoreResult<Association>;

    async fn update_association(
        &self,
        kind: OwnerKind,
        owner_id: i64,
        filter_id: i64,
        value: &FilterValue,
    ) -> StoreResult<Association>;

    /// Drop every association of the owner and insert the new set atomically
    async fn replace_all(
        &self,
        kind: OwnerKind,
        owner_id: i64,
        assignments: &[FilterAssignment],
    ) -> StoreResult<Vec<Association>>;

    async fn delete_all(&self, kind: OwnerKind, owner_id: i64) -> StoreResult<u64>;
}

#[async_trait]
pub trait BenefitStore: Send + Sync {
    /// Benefit row, filters and category links in one transaction
    async fn create_benefit(&self, input: &BenefitInput) -> StoreResult<Benefit>;

    async fn get_benefit(&self, id: i64) -> StoreResult<Benefit>;

    /// Every benefit with filters and categories attached, ordered by id
    async fn list_benefits(&self) -> StoreResult<Vec<Benefit>>;

    async fn update_benefit(&self, id: i64, input: &BenefitInput) -> StoreResult<Benefit>;

    async fn delete_benefit(&self, id: i64) -> StoreResult<()>;
}

#[async_trait]
pub trait ChildStore: Send + Sync {
    async fn create_child(&self, user_id: i64, input: &ChildInput) -> StoreResult<Child>;

    async fn get_child(&self, id: i64) -> StoreResult<Child>;

    async fn list_children(&self, user_id: i64, window: Window) -> StoreResult<(Vec<Child>, usize)>;

    async fn update_child(&self, id: i64, input: &ChildInput) -> StoreResult<Child>;

    /// Also removes the child's filter associations
    async fn delete_child(&self, id: i64) -> StoreResult<()>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn create_category(&self, input: &CategoryInput) -> StoreResult<Category>;

    async fn get_category(&self, id: i64) -> StoreResult<Category>;

    async fn list_categories(&self, search: Option<&str>, window: Window) -> StoreResult<(Vec<Category>, usize)>;

    async fn update_category(&self, id: i64, input: &CategoryInput) -> StoreResult<Category>;

    async fn delete_category(&self, id: i64) -> StoreResult<()>;
}

/// Everything the services need from a backend
#[async_trait]
pub trait Store: FilterStore + AssociationStore + BenefitStore + ChildStore + CategoryStore {
    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> StoreResult<()>;
}

pub type DynStore = Arc<dyn Store>;
