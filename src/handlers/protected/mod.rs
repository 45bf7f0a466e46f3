// Protected handlers: a valid bearer token is required and the caller arrives
// as an `AuthUser` request extension.
pub mod children;
pub mod user_filters;
