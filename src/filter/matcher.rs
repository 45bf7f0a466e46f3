use tracing::warn;

use super::criterion::{MatchMode, ResolvedCriterion};
use super::types::Association;

/// Anything that carries filter associations and can be tested against criteria
pub trait Tagged {
    fn associations(&self) -> &[Association];
}

impl Tagged for [Association] {
    fn associations(&self) -> &[Association] {
        self
    }
}

impl Tagged for Vec<Association> {
    fn associations(&self) -> &[Association] {
        self
    }
}

/// Decide whether an entity satisfies one criterion.
///
/// An entity with no association for the criterion's filter passes. When
/// several associations exist for the filter, any one satisfying it is enough.
pub fn matches<T: Tagged + ?Sized>(entity: &T, criterion: &ResolvedCriterion) -> bool {
    let mut relevant = entity
        .associations()
        .iter()
        .filter(|a| a.filter_id == criterion.filter_id)
        .peekable();

    if relevant.peek().is_none() {
        return true;
    }

    relevant.any(|association| association_satisfies(association, criterion))
}

/// Conjunction over all criteria
pub fn matches_all<T: Tagged + ?Sized>(entity: &T, criteria: &[ResolvedCriterion]) -> bool {
    criteria.iter().all(|criterion| matches(entity, criterion))
}

fn association_satisfies(association: &Association, criterion: &ResolvedCriterion) -> bool {
    match &criterion.mode {
        MatchMode::Exact(wanted) => association.value.value.as_deref() == Some(wanted.as_str()),
        MatchMode::Range { from, to } => {
            let (Some(raw_from), Some(raw_to)) = (&association.value.from, &association.value.to) else {
                return false;
            };

            let filter_type = criterion.filter_type;
            let (Some(stored_from), Some(stored_to)) =
                (filter_type.parse_bound(raw_from), filter_type.parse_bound(raw_to))
            else {
                warn!(
                    association_id = association.id,
                    filter_id = association.filter_id,
                    "stored range [{}, {}] does not parse as {}",
                    raw_from,
                    raw_to,
                    filter_type
                );
                return false;
            };

            match (from, to) {
                (Some(from), Some(to)) => !(stored_to < *from || stored_from > *to),
                (Some(from), None) => stored_to >= *from,
                (None, Some(to)) => stored_from <= *to,
                (None, None) => false,
            }
        }
    }
}
