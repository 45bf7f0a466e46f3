use std::collections::{HashMap, HashSet};

use super::domain::Bound;
use super::error::FilterError;
use super::types::{FilterAssignment, FilterCriterion, FilterDefinition, FilterType, FilterValue};

/// How a criterion is tested against a stored association
#[derive(Debug, Clone, PartialEq)]
pub enum MatchMode {
    Exact(String),
    Range { from: Option<Bound>, to: Option<Bound> },
}

/// A criterion checked against its filter definition, with bounds parsed
/// into the filter's domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCriterion {
    pub filter_id: i64,
    pub filter_type: FilterType,
    pub mode: MatchMode,
}

impl ResolvedCriterion {
    pub fn resolve(criterion: &FilterCriterion, definition: &FilterDefinition) -> Result<Self, FilterError> {
        let filter_id = criterion.filter_id;
        let filter_type = definition.filter_type;

        // An exact value takes precedence over any range supplied alongside it
        if let Some(value) = &criterion.value.value {
            return Ok(Self { filter_id, filter_type, mode: MatchMode::Exact(value.clone()) });
        }

        if !criterion.value.has_range() {
            return Err(FilterError::EmptyCriterion(filter_id));
        }

        let from = parse_required(filter_id, filter_type, criterion.value.from.as_deref())?;
        let to = parse_required(filter_id, filter_type, criterion.value.to.as_deref())?;

        Ok(Self { filter_id, filter_type, mode: MatchMode::Range { from, to } })
    }
}

fn parse_required(filter_id: i64, filter_type: FilterType, raw: Option<&str>) -> Result<Option<Bound>, FilterError> {
    match raw {
        None => Ok(None),
        Some(raw) => filter_type
            .parse_bound(raw)
            .map(Some)
            .ok_or_else(|| FilterError::InvalidBound {
                filter_id,
                filter_type,
                value: raw.to_string(),
            }),
    }
}

/// Resolve every criterion against the known definitions. The first bad
/// criterion aborts resolution.
pub fn resolve_criteria(
    criteria: &[FilterCriterion],
    definitions: &HashMap<i64, FilterDefinition>,
) -> Result<Vec<ResolvedCriterion>, FilterError> {
    criteria
        .iter()
        .map(|criterion| {
            let definition = definitions
                .get(&criterion.filter_id)
                .ok_or(FilterError::UnknownFilter(criterion.filter_id))?;
            ResolvedCriterion::resolve(criterion, definition)
        })
        .collect()
}

/// Validate a set of assignments destined for one owner: each filter id
/// appears once, refers to a known definition, carries a payload, and any
/// range bounds parse in the filter's domain.
pub fn validate_assignments(
    assignments: &[FilterAssignment],
    definitions: &HashMap<i64, FilterDefinition>,
) -> Result<(), FilterError> {
    let mut seen = HashSet::with_capacity(assignments.len());
    for assignment in assignments {
        let filter_id = assignment.filter_id;
        if !seen.insert(filter_id) {
            return Err(FilterError::DuplicateFilter { filter_id });
        }
        let definition = definitions
            .get(&filter_id)
            .ok_or(FilterError::UnknownFilter(filter_id))?;
        validate_value(filter_id, definition.filter_type, &assignment.value)?;
    }
    Ok(())
}

fn validate_value(filter_id: i64, filter_type: FilterType, value: &FilterValue) -> Result<(), FilterError> {
    if value.is_empty() {
        return Err(FilterError::EmptyCriterion(filter_id));
    }
    parse_required(filter_id, filter_type, value.from.as_deref())?;
    parse_required(filter_id, filter_type, value.to.as_deref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defs() -> HashMap<i64, FilterDefinition> {
        let mut map = HashMap::new();
        map.insert(1, FilterDefinition {
            id: 1,
            name: "Age".into(),
            hint: None,
            filter_type: FilterType::NumberRange,
            values: vec![],
        });
        map.insert(2, FilterDefinition {
            id: 2,
            name: "Region".into(),
            hint: Some("Where the family lives".into()),
            filter_type: FilterType::StringRange,
            values: vec!["north".into(), "south".into()],
        });
        map
    }

    #[test]
    fn empty_criterion_is_rejected() {
        let c = FilterCriterion { filter_id: 1, value: FilterValue::default() };
        assert_eq!(resolve_criteria(&[c], &defs()), Err(FilterError::EmptyCriterion(1)));
    }

    #[test]
    fn unknown_filter_is_reported() {
        let c = FilterCriterion::exact(99, "x");
        assert_eq!(resolve_criteria(&[c], &defs()), Err(FilterError::UnknownFilter(99)));
    }

    #[test]
    fn unparsable_number_bound_is_rejected() {
        let c = FilterCriterion::range(1, Some("eighteen"), None);
        let err = resolve_criteria(&[c], &defs()).unwrap_err();
        assert!(matches!(err, FilterError::InvalidBound { filter_id: 1, .. }));
    }

    #[test]
    fn value_wins_over_range() {
        let c = FilterCriterion {
            filter_id: 2,
            value: FilterValue { value: Some("north".into()), from: Some("a".into()), to: None },
        };
        let resolved = resolve_criteria(&[c], &defs()).unwrap();
        assert_eq!(resolved[0].mode, MatchMode::Exact("north".into()));
    }

    #[test]
    fn half_open_range_resolves() {
        let c = FilterCriterion::range(1, None, Some("30"));
        let resolved = resolve_criteria(&[c], &defs()).unwrap();
        match &resolved[0].mode {
            MatchMode::Range { from, to } => {
                assert!(from.is_none());
                assert!(to.is_some());
            }
            other => panic!("unexpected mode: {:?}", other),
        }
    }

    #[test]
    fn duplicate_assignment_is_rejected() {
        let set = vec![
            FilterAssignment::new(1, FilterValue::range(Some("1"), Some("2"))),
            FilterAssignment::new(1, FilterValue::exact("3")),
        ];
        assert_eq!(
            validate_assignments(&set, &defs()),
            Err(FilterError::DuplicateFilter { filter_id: 1 })
        );
    }

    #[test]
    fn assignment_bounds_must_parse() {
        let set = vec![FilterAssignment::new(1, FilterValue::range(Some("x"), None::<String>))];
        assert!(validate_assignments(&set, &defs()).is_err());

        let ok = vec![FilterAssignment::new(1, FilterValue::range(Some("0"), Some("17")))];
        assert!(validate_assignments(&ok, &defs()).is_ok());
    }
}
