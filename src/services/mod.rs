pub mod benefit_service;
pub mod category_service;
pub mod child_service;
pub mod filter_service;

pub use benefit_service::{BenefitService, SearchRequest};
pub use category_service::CategoryService;
pub use child_service::ChildService;
pub use filter_service::{FilterListing, FilterService};

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::database::DatabaseError;
use crate::filter::{FilterDefinition, FilterError, OwnerKind};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Keyed async mutex serializing association writes per owner.
///
/// Entries are dropped once nobody holds or waits on them.
#[derive(Clone, Default)]
pub struct OwnerLocks {
    inner: Arc<Mutex<HashMap<(OwnerKind, i64), Arc<AsyncMutex<()>>>>>,
}

impl OwnerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, kind: OwnerKind, owner_id: i64) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            map.retain(|_, slot| Arc::strong_count(slot) > 1);
            map.entry((kind, owner_id)).or_default().clone()
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }
}

/// Index definitions by id for criterion resolution and assignment checks
pub(crate) fn index_definitions(definitions: Vec<FilterDefinition>) -> HashMap<i64, FilterDefinition> {
    definitions.into_iter().map(|d| (d.id, d)).collect()
}

/// Convert a non-negative request integer into a paging size
pub(crate) fn non_negative(field: &str, value: Option<i64>, default: usize) -> ServiceResult<usize> {
    match value {
        None => Ok(default),
        Some(v) if v < 0 => Err(ServiceError::validation(format!("{} must not be negative", field))),
        Some(v) => Ok(v as usize),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_owner_waits_for_the_holder() {
        let locks = OwnerLocks::new();
        let guard = locks.lock(OwnerKind::Child, 1).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _g = contender.lock(OwnerKind::Child, 1).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        waiting.await.unwrap();
    }

    #[tokio::test]
    async fn different_owners_do_not_contend() {
        let locks = OwnerLocks::new();
        let _a = locks.lock(OwnerKind::Child, 1).await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock(OwnerKind::Child, 2))
            .await
            .expect("second owner should lock immediately");
        let _c = tokio::time::timeout(Duration::from_millis(100), locks.lock(OwnerKind::User, 1))
            .await
            .expect("same id, different kind should lock immediately");
    }

    #[tokio::test]
    async fn released_slots_are_pruned() {
        let locks = OwnerLocks::new();
        for id in 0..10 {
            let _g = locks.lock(OwnerKind::User, id).await;
        }
        let _last = locks.lock(OwnerKind::User, 99).await;
        assert_eq!(locks.tracked(), 1);
    }

    #[test]
    fn negative_paging_is_rejected() {
        assert!(non_negative("limit", Some(-1), 10).is_err());
        assert_eq!(non_negative("limit", None, 10).unwrap(), 10);
        assert_eq!(non_negative("offset", Some(3), 0).unwrap(), 3);
    }
}
