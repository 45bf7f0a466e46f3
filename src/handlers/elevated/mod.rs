// Elevated handlers: bearer token with the admin role. Catalogue reference
// data (filters, benefits, categories) is only written through here.
pub mod benefits;
pub mod categories;
pub mod filters;
