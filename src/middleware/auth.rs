use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::app::AppState;
use crate::auth::{validate_jwt, Claims, ADMIN_ROLE};
use crate::error::ApiError;

/// Authenticated caller extracted from the bearer token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token, &state.config.security.jwt_secret)
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Layered inside `jwt_auth_middleware`; rejects callers without the admin role
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.is_admin() {
        warn!(user_id = user.user_id, "Non-admin attempted an admin route");
        return Err(ApiError::forbidden("Admin role required"));
    }

    Ok(next.run(request).await)
}

/// Identity for routes where a token is optional. A missing header yields
/// `None`; an unusable token is logged and ignored.
pub fn optional_user(headers: &HeaderMap, secret: &str) -> Option<AuthUser> {
    if !headers.contains_key("authorization") {
        return None;
    }

    match extract_jwt_from_headers(headers).and_then(|token| validate_jwt(&token, secret).map_err(|e| e.to_string())) {
        Ok(claims) => Some(AuthUser::from(claims)),
        Err(reason) => {
            warn!("Ignoring optional bearer token: {}", reason);
            None
        }
    }
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_jwt, USER_ROLE};
    use axum::http::HeaderValue;

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert!(extract_jwt_from_headers(&with_auth("Token abc")).is_err());
        assert!(extract_jwt_from_headers(&with_auth("Bearer ")).is_err());
        assert_eq!(extract_jwt_from_headers(&with_auth("Bearer abc")).unwrap(), "abc");
    }

    #[test]
    fn optional_user_ignores_bad_tokens() {
        assert_eq!(optional_user(&HeaderMap::new(), "secret"), None);
        assert_eq!(optional_user(&with_auth("Bearer garbage"), "secret"), None);

        let token = generate_jwt(&Claims::new(9, USER_ROLE, 1), "secret").unwrap();
        let user = optional_user(&with_auth(&format!("Bearer {}", token)), "secret").unwrap();
        assert_eq!(user.user_id, 9);
        assert!(!user.is_admin());
    }
}
