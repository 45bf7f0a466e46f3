use tracing::info;

use super::{index_definitions, non_negative, OwnerLocks, ServiceError, ServiceResult};
use crate::database::models::{Child, ChildInput, ChildList};
use crate::database::DynStore;
use crate::filter::{validate_assignments, Association, FilterAssignment, OwnerKind, Window};

/// Child profiles and their replace-all filter sets
#[derive(Clone)]
pub struct ChildService {
    store: DynStore,
    locks: OwnerLocks,
}

fn validate(input: &ChildInput) -> ServiceResult<()> {
    if input.first_name.trim().is_empty() {
        return Err(ServiceError::validation("first_name cannot be empty"));
    }
    if input.last_name.trim().is_empty() {
        return Err(ServiceError::validation("last_name cannot be empty"));
    }
    Ok(())
}

impl ChildService {
    pub fn new(store: DynStore, locks: OwnerLocks) -> Self {
        Self { store, locks }
    }

    pub async fn create(&self, user_id: i64, input: ChildInput) -> ServiceResult<Child> {
        validate(&input)?;
        let child = self.store.create_child(user_id, &input).await?;
        info!(child_id = child.id, user_id, "Created child");
        Ok(child)
    }

    /// A child belonging to someone else is reported as missing
    pub async fn get(&self, user_id: i64, id: i64) -> ServiceResult<Child> {
        let child = self.store.get_child(id).await?;
        if child.user_id != user_id {
            return Err(ServiceError::NotFound(format!("child {}", id)));
        }
        Ok(child)
    }

    pub async fn list(&self, user_id: i64, limit: Option<i64>, offset: Option<i64>) -> ServiceResult<ChildList> {
        let window = Window::new(non_negative("limit", limit, 0)?, non_negative("offset", offset, 0)?);
        let (children, total) = self.store.list_children(user_id, window).await?;
        Ok(ChildList { children, total })
    }

    pub async fn update(&self, user_id: i64, id: i64, input: ChildInput) -> ServiceResult<Child> {
        validate(&input)?;
        self.get(user_id, id).await?;
        Ok(self.store.update_child(id, &input).await?)
    }

    pub async fn delete(&self, user_id: i64, id: i64) -> ServiceResult<()> {
        self.get(user_id, id).await?;
        let _guard = self.locks.lock(OwnerKind::Child, id).await;
        self.store.delete_child(id).await?;
        info!(child_id = id, user_id, "Deleted child");
        Ok(())
    }

    /// Replace the child's whole filter set. An empty set clears it.
    pub async fn save_filters(
        &self,
        user_id: i64,
        child_id: i64,
        assignments: Vec<FilterAssignment>,
    ) -> ServiceResult<Vec<Association>> {
        self.get(user_id, child_id).await?;
        let definitions = index_definitions(self.store.list_filters(None).await?);
        validate_assignments(&assignments, &definitions)?;

        let _guard = self.locks.lock(OwnerKind::Child, child_id).await;
        let saved = self.store.replace_all(OwnerKind::Child, child_id, &assignments).await?;
        info!(child_id, count = saved.len(), "Replaced child filters");
        Ok(saved)
    }

    pub async fn filters(&self, user_id: i64, child_id: i64) -> ServiceResult<Vec<Association>> {
        self.get(user_id, child_id).await?;
        Ok(self.store.list_associations(OwnerKind::Child, child_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterError, FilterValue};
    use crate::testing::TestContext;
    use chrono::NaiveDate;

    fn ada() -> ChildInput {
        ChildInput {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            birth_date: NaiveDate::from_ymd_opt(2019, 12, 10).unwrap(),
        }
    }

    #[tokio::test]
    async fn replace_all_with_empty_set_clears() {
        let ctx = TestContext::seeded().await;
        let child = ctx.children.create(1, ada()).await.unwrap();

        let set = vec![
            FilterAssignment::new(ctx.age_id, FilterValue::range(Some("3"), Some("4"))),
            FilterAssignment::new(ctx.region_id, FilterValue::exact("north")),
        ];
        assert_eq!(ctx.children.save_filters(1, child.id, set).await.unwrap().len(), 2);

        let cleared = ctx.children.save_filters(1, child.id, vec![]).await.unwrap();
        assert!(cleared.is_empty());
        assert!(ctx.children.filters(1, child.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_all_swaps_the_set() {
        let ctx = TestContext::seeded().await;
        let child = ctx.children.create(1, ada()).await.unwrap();

        ctx.children
            .save_filters(1, child.id, vec![FilterAssignment::new(ctx.region_id, FilterValue::exact("north"))])
            .await
            .unwrap();
        let toddler = FilterAssignment::new(ctx.age_id, FilterValue::range(Some("3"), Some("4")));
        ctx.children.save_filters(1, child.id, vec![toddler]).await.unwrap();

        let stored = ctx.children.filters(1, child.id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].filter_id, ctx.age_id);
    }

    #[tokio::test]
    async fn duplicate_filter_in_set_is_rejected() {
        let ctx = TestContext::seeded().await;
        let child = ctx.children.create(1, ada()).await.unwrap();
        let set = vec![
            FilterAssignment::new(ctx.region_id, FilterValue::exact("north")),
            FilterAssignment::new(ctx.region_id, FilterValue::exact("south")),
        ];
        let result = ctx.children.save_filters(1, child.id, set).await;
        assert!(matches!(result, Err(ServiceError::Filter(FilterError::DuplicateFilter { .. }))));
    }

    #[tokio::test]
    async fn other_users_child_is_not_found() {
        let ctx = TestContext::seeded().await;
        let child = ctx.children.create(1, ada()).await.unwrap();

        assert!(matches!(ctx.children.get(2, child.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            ctx.children.save_filters(2, child.id, vec![]).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(ctx.children.delete(2, child.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let ctx = TestContext::seeded().await;
        ctx.children.create(1, ada()).await.unwrap();
        ctx.children.create(1, ada()).await.unwrap();
        ctx.children.create(2, ada()).await.unwrap();

        let mine = ctx.children.list(1, None, None).await.unwrap();
        assert_eq!(mine.total, 2);
        let page = ctx.children.list(1, Some(1), Some(1)).await.unwrap();
        assert_eq!(page.children.len(), 1);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn deleting_child_drops_its_filters() {
        let ctx = TestContext::seeded().await;
        let child = ctx.children.create(1, ada()).await.unwrap();
        ctx.children
            .save_filters(1, child.id, vec![FilterAssignment::new(ctx.region_id, FilterValue::exact("north"))])
            .await
            .unwrap();
        ctx.children.delete(1, child.id).await.unwrap();
        assert!(ctx.store.list_associations(OwnerKind::Child, child.id).await.unwrap().is_empty());
    }
}
