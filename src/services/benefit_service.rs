use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{index_definitions, non_negative, OwnerLocks, ServiceError, ServiceResult};
use crate::config::CatalogueConfig;
use crate::database::models::{Benefit, BenefitInput};
use crate::database::DynStore;
use crate::filter::{self, resolve_criteria, validate_assignments, FilterCriterion, OwnerKind, Page, Window};

/// Body of `POST /api/v1/benefits/search`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterCriterion>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Clone)]
pub struct BenefitService {
    store: DynStore,
    locks: OwnerLocks,
    catalogue: CatalogueConfig,
}

impl BenefitService {
    pub fn new(store: DynStore, locks: OwnerLocks, catalogue: CatalogueConfig) -> Self {
        Self { store, locks, catalogue }
    }

    async fn validate(&self, input: &BenefitInput) -> ServiceResult<()> {
        if input.title.trim().is_empty() {
            return Err(ServiceError::validation("Benefit title cannot be empty"));
        }
        let definitions = index_definitions(self.store.list_filters(None).await?);
        validate_assignments(&input.filters, &definitions)?;
        if let Some(categories) = &input.categories {
            for id in categories {
                self.store.get_category(*id).await?;
            }
        }
        Ok(())
    }

    pub async fn create(&self, input: BenefitInput) -> ServiceResult<Benefit> {
        self.validate(&input).await?;
        let benefit = self.store.create_benefit(&input).await?;
        info!(benefit_id = benefit.id, filters = benefit.filters.len(), "Created benefit");
        Ok(benefit)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Benefit> {
        Ok(self.store.get_benefit(id).await?)
    }

    /// Replace fields and filters; categories only when the input carries them
    pub async fn update(&self, id: i64, input: BenefitInput) -> ServiceResult<Benefit> {
        self.validate(&input).await?;
        let _guard = self.locks.lock(OwnerKind::Benefit, id).await;
        Ok(self.store.update_benefit(id, &input).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let _guard = self.locks.lock(OwnerKind::Benefit, id).await;
        self.store.delete_benefit(id).await?;
        info!(benefit_id = id, "Deleted benefit");
        Ok(())
    }

    /// Full scan of the catalogue narrowed by text and criteria, ordered by id
    pub async fn search(&self, request: SearchRequest) -> ServiceResult<Page<Benefit>> {
        // A missing or zero limit returns everything from the offset on
        let limit = non_negative("limit", request.limit, 0)?;
        let offset = non_negative("offset", request.offset, 0)?;
        let window = Window::new(limit, offset);

        let criteria = if request.filters.is_empty() {
            Vec::new()
        } else {
            let definitions = index_definitions(self.store.list_filters(None).await?);
            resolve_criteria(&request.filters, &definitions)?
        };

        let candidates = self.store.list_benefits().await?;
        let scanned = candidates.len();
        let page = filter::search(candidates, request.search.as_deref(), &criteria, window);

        if self.catalogue.debug_logging {
            debug!(
                scanned,
                matched = page.total,
                returned = page.items.len(),
                criteria = criteria.len(),
                "Catalogue search"
            );
        }
        Ok(page)
    }
}
