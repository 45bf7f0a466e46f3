pub mod criterion;
pub mod domain;
pub mod error;
pub mod matcher;
pub mod search;
pub mod types;

pub use criterion::{resolve_criteria, validate_assignments, MatchMode, ResolvedCriterion};
pub use domain::Bound;
pub use error::FilterError;
pub use matcher::{matches, matches_all, Tagged};
pub use search::{paginate, search, Page, Searchable, Window};
pub use types::*;
