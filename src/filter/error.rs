use thiserror::Error;

use super::types::FilterType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Filter name cannot be empty")]
    EmptyName,

    #[error("Invalid filter type: {0}")]
    InvalidFilterType(String),

    #[error("Filter {0} not found")]
    UnknownFilter(i64),

    #[error("Criterion for filter {0} must supply a value or a from/to range")]
    EmptyCriterion(i64),

    #[error("Filter {filter_id} appears more than once")]
    DuplicateFilter { filter_id: i64 },

    #[error("Invalid {filter_type} bound for filter {filter_id}: {value}")]
    InvalidBound {
        filter_id: i64,
        filter_type: FilterType,
        value: String,
    },
}
