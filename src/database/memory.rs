use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tokio::sync::RwLock;

use super::manager::DatabaseError;
use super::models::{Benefit, BenefitInput, BenefitRow, Category, CategoryInput, Child, ChildInput};
use super::store::{AssociationStore, BenefitStore, CategoryStore, ChildStore, FilterStore, Store, StoreResult};
use crate::filter::{
    paginate, Association, FilterAssignment, FilterDefinition, FilterDefinitionInput, FilterValue, OwnerKind,
    Window,
};

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    filters: BTreeMap<i64, FilterDefinition>,
    categories: BTreeMap<i64, Category>,
    benefits: BTreeMap<i64, BenefitRow>,
    benefit_categories: BTreeSet<(i64, i64)>,
    children: BTreeMap<i64, Child>,
    associations: BTreeMap<OwnerKind, BTreeMap<i64, Association>>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn owner_exists(&self, kind: OwnerKind, owner_id: i64) -> bool {
        match kind {
            // Users live in the identity provider, not in this store
            OwnerKind::User => true,
            OwnerKind::Child => self.children.contains_key(&owner_id),
            OwnerKind::Benefit => self.benefits.contains_key(&owner_id),
        }
    }

    fn associations_of(&self, kind: OwnerKind, owner_id: i64) -> Vec<Association> {
        self.associations
            .get(&kind)
            .map(|table| table.values().filter(|a| a.owner_id == owner_id).cloned().collect())
            .unwrap_or_default()
    }

    fn find_association_id(&self, kind: OwnerKind, owner_id: i64, filter_id: i64) -> Option<i64> {
        self.associations.get(&kind).and_then(|table| {
            table
                .values()
                .find(|a| a.owner_id == owner_id && a.filter_id == filter_id)
                .map(|a| a.id)
        })
    }

    /// Reject a set that would break foreign keys or the (owner, filter) uniqueness
    fn check_assignments(&self, kind: OwnerKind, owner_id: i64, assignments: &[FilterAssignment]) -> StoreResult<()> {
        if !self.owner_exists(kind, owner_id) {
            return Err(DatabaseError::not_found(format!("{} {}", kind, owner_id)));
        }
        let mut seen = HashSet::new();
        for assignment in assignments {
            if !self.filters.contains_key(&assignment.filter_id) {
                return Err(DatabaseError::not_found(format!("filter {}", assignment.filter_id)));
            }
            if !seen.insert(assignment.filter_id) {
                return Err(DatabaseError::conflict(format!(
                    "{} {} already has filter {}",
                    kind, owner_id, assignment.filter_id
                )));
            }
        }
        Ok(())
    }

    fn insert_association(
        &mut self,
        kind: OwnerKind,
        owner_id: i64,
        filter_id: i64,
        value: &FilterValue,
    ) -> Association {
        let association = Association {
            id: self.next_id(),
            owner_id,
            filter_id,
            value: value.clone(),
        };
        self.associations
            .entry(kind)
            .or_default()
            .insert(association.id, association.clone());
        association
    }

    fn remove_associations(&mut self, kind: OwnerKind, owner_id: i64) -> u64 {
        let Some(table) = self.associations.get_mut(&kind) else {
            return 0;
        };
        let before = table.len();
        table.retain(|_, a| a.owner_id != owner_id);
        (before - table.len()) as u64
    }

    fn check_categories(&self, ids: &[i64]) -> StoreResult<()> {
        match ids.iter().find(|id| !self.categories.contains_key(id)) {
            Some(missing) => Err(DatabaseError::not_found(format!("category {}", missing))),
            None => Ok(()),
        }
    }

    fn set_categories(&mut self, benefit_id: i64, ids: &[i64]) {
        self.benefit_categories.retain(|(b, _)| *b != benefit_id);
        for id in ids {
            self.benefit_categories.insert((benefit_id, *id));
        }
    }

    fn benefit_view(&self, id: i64) -> Option<Benefit> {
        let row = self.benefits.get(&id)?.clone();
        let categories = self
            .benefit_categories
            .iter()
            .filter(|(b, _)| *b == id)
            .filter_map(|(_, c)| self.categories.get(c).cloned())
            .collect();
        Some(row.into_benefit(self.associations_of(OwnerKind::Benefit, id), categories))
    }
}

fn row_from_input(id: i64, input: &BenefitInput) -> BenefitRow {
    BenefitRow {
        id,
        title: input.title.clone(),
        content: input.content.clone(),
        bonus: input.bonus.clone(),
        video_url: input.video_url.clone(),
        source_url: input.source_url.clone(),
    }
}

/// In-process store used by tests and `STORAGE_BACKEND=memory`
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FilterStore for MemoryStore {
    async fn create_filter(&self, input: &FilterDefinitionInput) -> StoreResult<FilterDefinition> {
        let mut state = self.state.write().await;
        let filter = FilterDefinition {
            id: state.next_id(),
            name: input.name.clone(),
            hint: input.hint.clone(),
            filter_type: input.filter_type,
            values: input.values.clone(),
        };
        state.filters.insert(filter.id, filter.clone());
        Ok(filter)
    }

    async fn get_filter(&self, id: i64) -> StoreResult<FilterDefinition> {
        let state = self.state.read().await;
        state
            .filters
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::not_found(format!("filter {}", id)))
    }

    async fn list_filters(&self, search: Option<&str>) -> StoreResult<Vec<FilterDefinition>> {
        let state = self.state.read().await;
        let search = search.filter(|s| !s.is_empty());
        Ok(state
            .filters
            .values()
            .filter(|f| search.map_or(true, |s| f.name.contains(s)))
            .cloned()
            .collect())
    }

    async fn update_filter(&self, id: i64, input: &FilterDefinitionInput) -> StoreResult<FilterDefinition> {
        let mut state = self.state.write().await;
        let filter = state
            .filters
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found(format!("filter {}", id)))?;
        filter.name = input.name.clone();
        filter.hint = input.hint.clone();
        filter.filter_type = input.filter_type;
        filter.values = input.values.clone();
        Ok(filter.clone())
    }

    async fn delete_filter(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.filters.remove(&id).is_none() {
            return Err(DatabaseError::not_found(format!("filter {}", id)));
        }
        for table in state.associations.values_mut() {
            table.retain(|_, a| a.filter_id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl AssociationStore for MemoryStore {
    async fn get_association(&self, kind: OwnerKind, owner_id: i64, filter_id: i64) -> StoreResult<Association> {
        let state = self.state.read().await;
        state
            .associations
            .get(&kind)
            .and_then(|table| {
                table
                    .values()
                    .find(|a| a.owner_id == owner_id && a.filter_id == filter_id)
                    .cloned()
            })
            .ok_or_else(|| DatabaseError::not_found(format!("{} {} filter {}", kind, owner_id, filter_id)))
    }

    async fn list_associations(&self, kind: OwnerKind, owner_id: i64) -> StoreResult<Vec<Association>> {
        Ok(self.state.read().await.associations_of(kind, owner_id))
    }

    async fn create_association(
        &self,
        kind: OwnerKind,
        owner_id: i64,
        filter_id: i64,
        value: &FilterValue,
    ) -> StoreResult<Association> {
        let mut state = self.state.write().await;
        let assignment = FilterAssignment::new(filter_id, value.clone());
        state.check_assignments(kind, owner_id, std::slice::from_ref(&assignment))?;
        if state.find_association_id(kind, owner_id, filter_id).is_some() {
            return Err(DatabaseError::conflict(format!(
                "{} {} already has filter {}",
                kind, owner_id, filter_id
            )));
        }
        Ok(state.insert_association(kind, owner_id, filter_id, value))
    }

    async fn update_association(
        &self,
        kind: OwnerKind,
        owner_id: i64,
        filter_id: i64,
        value: &FilterValue,
    ) -> StoreResult<Association> {
        let mut state = self.state.write().await;
        let id = state
            .find_association_id(kind, owner_id, filter_id)
            .ok_or_else(|| DatabaseError::not_found(format!("{} {} filter {}", kind, owner_id, filter_id)))?;
        let association = state
            .associations
            .get_mut(&kind)
            .and_then(|table| table.get_mut(&id))
            .ok_or_else(|| DatabaseError::not_found(format!("association {}", id)))?;
        association.value = value.clone();
        Ok(association.clone())
    }

    async fn replace_all(
        &self,
        kind: OwnerKind,
        owner_id: i64,
        assignments: &[FilterAssignment],
    ) -> StoreResult<Vec<Association>> {
        let mut state = self.state.write().await;
        // All checks happen before the first mutation, so a failure leaves the old set intact
        state.check_assignments(kind, owner_id, assignments)?;
        state.remove_associations(kind, owner_id);
        Ok(assignments
            .iter()
            .map(|a| state.insert_association(kind, owner_id, a.filter_id, &a.value))
            .collect())
    }

    async fn delete_all(&self, kind: OwnerKind, owner_id: i64) -> StoreResult<u64> {
        Ok(self.state.write().await.remove_associations(kind, owner_id))
    }
}

#[async_trait]
impl BenefitStore for MemoryStore {
    async fn create_benefit(&self, input: &BenefitInput) -> StoreResult<Benefit> {
        let mut state = self.state.write().await;
        let categories = input.categories.clone().unwrap_or_default();
        state.check_categories(&categories)?;

        let id = state.next_id();
        state.benefits.insert(id, row_from_input(id, input));
        if let Err(e) = state.check_assignments(OwnerKind::Benefit, id, &input.filters) {
            state.benefits.remove(&id);
            return Err(e);
        }
        for assignment in &input.filters {
            state.insert_association(OwnerKind::Benefit, id, assignment.filter_id, &assignment.value);
        }
        state.set_categories(id, &categories);

        state
            .benefit_view(id)
            .ok_or_else(|| DatabaseError::not_found(format!("benefit {}", id)))
    }

    async fn get_benefit(&self, id: i64) -> StoreResult<Benefit> {
        self.state
            .read()
            .await
            .benefit_view(id)
            .ok_or_else(|| DatabaseError::not_found(format!("benefit {}", id)))
    }

    async fn list_benefits(&self) -> StoreResult<Vec<Benefit>> {
        let state = self.state.read().await;
        Ok(state.benefits.keys().filter_map(|id| state.benefit_view(*id)).collect())
    }

    async fn update_benefit(&self, id: i64, input: &BenefitInput) -> StoreResult<Benefit> {
        let mut state = self.state.write().await;
        if !state.benefits.contains_key(&id) {
            return Err(DatabaseError::not_found(format!("benefit {}", id)));
        }
        if let Some(categories) = &input.categories {
            state.check_categories(categories)?;
        }
        state.check_assignments(OwnerKind::Benefit, id, &input.filters)?;

        state.benefits.insert(id, row_from_input(id, input));
        state.remove_associations(OwnerKind::Benefit, id);
        for assignment in &input.filters {
            state.insert_association(OwnerKind::Benefit, id, assignment.filter_id, &assignment.value);
        }
        if let Some(categories) = &input.categories {
            state.set_categories(id, categories);
        }

        state
            .benefit_view(id)
            .ok_or_else(|| DatabaseError::not_found(format!("benefit {}", id)))
    }

    async fn delete_benefit(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.benefits.remove(&id).is_none() {
            return Err(DatabaseError::not_found(format!("benefit {}", id)));
        }
        state.remove_associations(OwnerKind::Benefit, id);
        state.set_categories(id, &[]);
        Ok(())
    }
}

#[async_trait]
impl ChildStore for MemoryStore {
    async fn create_child(&self, user_id: i64, input: &ChildInput) -> StoreResult<Child> {
        let mut state = self.state.write().await;
        let child = Child {
            id: state.next_id(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            birth_date: input.birth_date,
            user_id,
            created_at: Utc::now(),
        };
        state.children.insert(child.id, child.clone());
        Ok(child)
    }

    async fn get_child(&self, id: i64) -> StoreResult<Child> {
        self.state
            .read()
            .await
            .children
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::not_found(format!("child {}", id)))
    }

    async fn list_children(&self, user_id: i64, window: Window) -> StoreResult<(Vec<Child>, usize)> {
        let state = self.state.read().await;
        let owned: Vec<Child> = state.children.values().filter(|c| c.user_id == user_id).cloned().collect();
        let page = paginate(owned, window);
        Ok((page.items, page.total))
    }

    async fn update_child(&self, id: i64, input: &ChildInput) -> StoreResult<Child> {
        let mut state = self.state.write().await;
        let child = state
            .children
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found(format!("child {}", id)))?;
        child.first_name = input.first_name.clone();
        child.last_name = input.last_name.clone();
        child.birth_date = input.birth_date;
        Ok(child.clone())
    }

    async fn delete_child(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.children.remove(&id).is_none() {
            return Err(DatabaseError::not_found(format!("child {}", id)));
        }
        state.remove_associations(OwnerKind::Child, id);
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn create_category(&self, input: &CategoryInput) -> StoreResult<Category> {
        let mut state = self.state.write().await;
        let category = Category {
            id: state.next_id(),
            name: input.name.clone(),
            description: input.description.clone(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn get_category(&self, id: i64) -> StoreResult<Category> {
        self.state
            .read()
            .await
            .categories
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::not_found(format!("category {}", id)))
    }

    async fn list_categories(&self, search: Option<&str>, window: Window) -> StoreResult<(Vec<Category>, usize)> {
        let state = self.state.read().await;
        let search = search.filter(|s| !s.is_empty());
        let matching: Vec<Category> = state
            .categories
            .values()
            .filter(|c| {
                search.map_or(true, |s| {
                    c.name.contains(s) || c.description.as_deref().map_or(false, |d| d.contains(s))
                })
            })
            .cloned()
            .collect();
        let page = paginate(matching, window);
        Ok((page.items, page.total))
    }

    async fn update_category(&self, id: i64, input: &CategoryInput) -> StoreResult<Category> {
        let mut state = self.state.write().await;
        let category = state
            .categories
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::not_found(format!("category {}", id)))?;
        category.name = input.name.clone();
        category.description = input.description.clone();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: i64) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.categories.remove(&id).is_none() {
            return Err(DatabaseError::not_found(format!("category {}", id)));
        }
        state.benefit_categories.retain(|(_, c)| *c != id);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}
