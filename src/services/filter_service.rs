use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use super::{OwnerLocks, ServiceError, ServiceResult};
use crate::database::{DatabaseError, DynStore};
use crate::filter::{FilterDefinition, FilterDefinitionInput, FilterSelection, FilterValue, OwnerKind, UserFilters};

/// A definition as shown to a caller, with their own selection when known
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterListing {
    #[serde(flatten)]
    pub filter: FilterDefinition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_value: Option<String>,
}

/// Filter definitions plus the per-user upsert workflow
#[derive(Clone)]
pub struct FilterService {
    store: DynStore,
    locks: OwnerLocks,
}

impl FilterService {
    pub fn new(store: DynStore, locks: OwnerLocks) -> Self {
        Self { store, locks }
    }

    pub async fn create(&self, input: FilterDefinitionInput) -> ServiceResult<FilterDefinition> {
        input.validate()?;
        let filter = self.store.create_filter(&input).await?;
        info!(filter_id = filter.id, "Created {} filter '{}'", filter.filter_type, filter.name);
        Ok(filter)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<FilterDefinition> {
        Ok(self.store.get_filter(id).await?)
    }

    /// List definitions, annotating each with the user's selected value when a
    /// user is given
    pub async fn list(&self, search: Option<&str>, user_id: Option<i64>) -> ServiceResult<Vec<FilterListing>> {
        let filters = self.store.list_filters(search).await?;

        let selections: HashMap<i64, String> = match user_id {
            Some(user_id) => self
                .store
                .list_associations(OwnerKind::User, user_id)
                .await?
                .into_iter()
                .filter_map(|a| a.value.value.map(|v| (a.filter_id, v)))
                .collect(),
            None => HashMap::new(),
        };

        Ok(filters
            .into_iter()
            .map(|filter| {
                let selected_value = selections.get(&filter.id).cloned();
                FilterListing { filter, selected_value }
            })
            .collect())
    }

    pub async fn update(&self, id: i64, input: FilterDefinitionInput) -> ServiceResult<FilterDefinition> {
        input.validate()?;
        Ok(self.store.update_filter(id, &input).await?)
    }

    /// Deletes the definition and every association referencing it
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.store.delete_filter(id).await?;
        info!(filter_id = id, "Deleted filter and its associations");
        Ok(())
    }

    /// Upsert each selection: create when the user has no value for the
    /// filter yet, otherwise overwrite it. The first failure aborts.
    pub async fn save_user_filters(
        &self,
        user_id: i64,
        selections: Vec<FilterSelection>,
    ) -> ServiceResult<UserFilters> {
        let _guard = self.locks.lock(OwnerKind::User, user_id).await;

        let mut values = Vec::with_capacity(selections.len());
        for selection in selections {
            // Unknown filters surface as NotFound before anything is written for them
            self.store.get_filter(selection.filter_id).await?;

            let value = FilterValue::exact(selection.value);
            let saved = match self
                .store
                .get_association(OwnerKind::User, user_id, selection.filter_id)
                .await
            {
                Ok(_) => {
                    self.store
                        .update_association(OwnerKind::User, user_id, selection.filter_id, &value)
                        .await?
                }
                Err(DatabaseError::NotFound(_)) => {
                    self.store
                        .create_association(OwnerKind::User, user_id, selection.filter_id, &value)
                        .await?
                }
                Err(e) => return Err(ServiceError::from(e)),
            };
            debug!(user_id, filter_id = saved.filter_id, "Saved user filter");

            values.push(FilterSelection {
                filter_id: saved.filter_id,
                value: saved.value.value.unwrap_or_default(),
            });
        }

        Ok(UserFilters { user_id, values })
    }

    /// Remove every selection the user has made, returning how many went away
    pub async fn clear_user_filters(&self, user_id: i64) -> ServiceResult<u64> {
        let _guard = self.locks.lock(OwnerKind::User, user_id).await;
        let removed = self.store.delete_all(OwnerKind::User, user_id).await?;
        info!(user_id, removed, "Cleared user filters");
        Ok(removed)
    }

    pub async fn user_filters(&self, user_id: i64) -> ServiceResult<UserFilters> {
        let values = self
            .store
            .list_associations(OwnerKind::User, user_id)
            .await?
            .into_iter()
            .map(|a| FilterSelection {
                filter_id: a.filter_id,
                value: a.value.value.unwrap_or_default(),
            })
            .collect();
        Ok(UserFilters { user_id, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterError, FilterType};
    use crate::testing::TestContext;

    fn selection(filter_id: i64, value: &str) -> FilterSelection {
        FilterSelection { filter_id, value: value.into() }
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let ctx = TestContext::new();
        let result = ctx
            .filters
            .create(FilterDefinitionInput {
                name: "".into(),
                filter_type: FilterType::StringRange,
                hint: None,
                values: vec![],
            })
            .await;
        assert!(matches!(result, Err(ServiceError::Filter(FilterError::EmptyName))));
    }

    #[tokio::test]
    async fn list_search_is_case_sensitive_substring() {
        let ctx = TestContext::seeded().await;
        let all = ctx.filters.list(None, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let hits = ctx.filters.list(Some("Reg"), None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filter.name, "Region");
        assert!(ctx.filters.list(Some("reg"), None).await.unwrap().is_empty());

        let ids: Vec<i64> = all.iter().map(|l| l.filter.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn upsert_twice_keeps_one_row_per_filter() {
        let ctx = TestContext::seeded().await;
        let region = ctx.region_id;

        ctx.filters.save_user_filters(5, vec![selection(region, "north")]).await.unwrap();
        let saved = ctx.filters.save_user_filters(5, vec![selection(region, "south")]).await.unwrap();
        assert_eq!(saved.values, vec![selection(region, "south")]);

        let stored = ctx.store.list_associations(OwnerKind::User, 5).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].value.value.as_deref(), Some("south"));
    }

    #[tokio::test]
    async fn unknown_filter_aborts_save() {
        let ctx = TestContext::seeded().await;
        let result = ctx
            .filters
            .save_user_filters(5, vec![selection(ctx.region_id, "north"), selection(404, "x")])
            .await;
        assert!(matches!(result, Err(ServiceError::Database(DatabaseError::NotFound(_)))));
    }

    #[tokio::test]
    async fn listing_carries_selected_value_for_user() {
        let ctx = TestContext::seeded().await;
        ctx.filters
            .save_user_filters(5, vec![selection(ctx.region_id, "north")])
            .await
            .unwrap();

        let listed = ctx.filters.list(None, Some(5)).await.unwrap();
        let region = listed.iter().find(|l| l.filter.id == ctx.region_id).unwrap();
        assert_eq!(region.selected_value.as_deref(), Some("north"));
        let age = listed.iter().find(|l| l.filter.id == ctx.age_id).unwrap();
        assert!(age.selected_value.is_none());

        let anonymous = ctx.filters.list(None, None).await.unwrap();
        assert!(anonymous.iter().all(|l| l.selected_value.is_none()));
    }

    #[tokio::test]
    async fn delete_cascades_to_user_selections() {
        let ctx = TestContext::seeded().await;
        ctx.filters
            .save_user_filters(5, vec![selection(ctx.region_id, "north")])
            .await
            .unwrap();
        ctx.filters.delete(ctx.region_id).await.unwrap();

        assert!(ctx.filters.user_filters(5).await.unwrap().values.is_empty());
        assert!(matches!(
            ctx.filters.get(ctx.region_id).await,
            Err(ServiceError::Database(DatabaseError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn clearing_removes_only_that_users_selections() {
        let ctx = TestContext::seeded().await;
        ctx.filters
            .save_user_filters(5, vec![selection(ctx.region_id, "north"), selection(ctx.age_id, "30")])
            .await
            .unwrap();
        ctx.filters.save_user_filters(6, vec![selection(ctx.region_id, "south")]).await.unwrap();

        assert_eq!(ctx.filters.clear_user_filters(5).await.unwrap(), 2);
        assert!(ctx.filters.user_filters(5).await.unwrap().values.is_empty());
        assert_eq!(ctx.filters.user_filters(6).await.unwrap().values, vec![selection(ctx.region_id, "south")]);

        assert_eq!(ctx.filters.clear_user_filters(5).await.unwrap(), 0);
    }
}
