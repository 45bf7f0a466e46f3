// Public handlers: no authentication required. Filter listing accepts an
// optional bearer token to annotate the caller's selections.
pub mod benefits;
pub mod categories;
pub mod filters;
