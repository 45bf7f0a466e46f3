use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{DynStore, MemoryStore};
use crate::filter::{FilterDefinitionInput, FilterType};
use crate::services::{BenefitService, CategoryService, ChildService, FilterService, OwnerLocks};

/// Services wired over a fresh in-memory store
pub struct TestContext {
    pub store: DynStore,
    pub filters: FilterService,
    pub benefits: BenefitService,
    pub children: ChildService,
    pub categories: CategoryService,
    pub age_id: i64,
    pub region_id: i64,
    pub birth_id: i64,
}

impl TestContext {
    pub fn new() -> Self {
        let store: DynStore = Arc::new(MemoryStore::new());
        let locks = OwnerLocks::new();
        let config = AppConfig::default();

        Self {
            filters: FilterService::new(store.clone(), locks.clone()),
            benefits: BenefitService::new(store.clone(), locks.clone(), config.catalogue),
            children: ChildService::new(store.clone(), locks),
            categories: CategoryService::new(store.clone()),
            store,
            age_id: 0,
            region_id: 0,
            birth_id: 0,
        }
    }

    /// Context with three filters: Age (NUMBER_RANGE), Region (STRING_RANGE,
    /// values north/south) and Birth date (DATE_RANGE)
    pub async fn seeded() -> Self {
        let mut ctx = Self::new();
        ctx.age_id = ctx.define("Age", FilterType::NumberRange, &[]).await;
        ctx.region_id = ctx.define("Region", FilterType::StringRange, &["north", "south"]).await;
        ctx.birth_id = ctx.define("Birth date", FilterType::DateRange, &[]).await;
        ctx
    }

    async fn define(&self, name: &str, filter_type: FilterType, values: &[&str]) -> i64 {
        self.filters
            .create(FilterDefinitionInput {
                name: name.into(),
                filter_type,
                hint: None,
                values: values.iter().map(|v| v.to_string()).collect(),
            })
            .await
            .expect("seed filter")
            .id
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
