use std::sync::Arc;

use axum::{
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::AppConfig;
use crate::database::DynStore;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, require_admin};
use crate::services::{BenefitService, CategoryService, ChildService, FilterService, OwnerLocks};

/// Shared handler state. Services share one set of owner locks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: DynStore,
    pub filters: FilterService,
    pub benefits: BenefitService,
    pub children: ChildService,
    pub categories: CategoryService,
}

impl AppState {
    pub fn new(config: AppConfig, store: DynStore) -> Self {
        let locks = OwnerLocks::new();
        Self {
            filters: FilterService::new(store.clone(), locks.clone()),
            benefits: BenefitService::new(store.clone(), locks.clone(), config.catalogue.clone()),
            children: ChildService::new(store.clone(), locks),
            categories: CategoryService::new(store.clone()),
            config: Arc::new(config),
            store,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Bearer token required
        .merge(protected_routes(state.clone()))
        // Bearer token with the admin role
        .merge(admin_routes(state.clone()))
        .with_state(state)
        // Global middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router<AppState> {
    use public::{benefits, categories, filters};

    Router::new()
        .route("/api/v1/filters", get(filters::list))
        .route("/api/v1/filters/:id", get(filters::get))
        .route("/api/v1/benefits/search", post(benefits::search))
        .route("/api/v1/benefits/:id", get(benefits::get))
        .route("/api/v1/categories", get(categories::list))
        .route("/api/v1/categories/:id", get(categories::get))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{children, user_filters};

    Router::new()
        .route(
            "/api/v1/user/filters",
            get(user_filters::get).put(user_filters::put).delete(user_filters::delete),
        )
        .route("/api/v1/children", get(children::list).post(children::create))
        .route(
            "/api/v1/children/:id",
            get(children::get).put(children::update).delete(children::delete),
        )
        .route(
            "/api/v1/children/:id/filters",
            get(children::filters_get).put(children::filters_put),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    use elevated::{benefits, categories, filters};

    Router::new()
        .route("/api/v1/admin/filters", post(filters::create))
        .route("/api/v1/admin/filters/:id", put(filters::update).delete(filters::delete))
        .route("/api/v1/admin/benefits", post(benefits::create))
        .route("/api/v1/admin/benefits/:id", put(benefits::update).delete(benefits::delete))
        .route("/api/v1/admin/categories", post(categories::create))
        .route(
            "/api/v1/admin/categories/:id",
            put(categories::update).delete(categories::delete),
        )
        // Layers run outside-in: authenticate first, then check the role
        .route_layer(from_fn(require_admin))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let security = &config.security;
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Skipping invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Benefits API",
            "version": version,
            "description": "Family-benefits catalogue with attribute filters",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "filters": "/api/v1/filters[/:id] (public, optional token)",
                "benefits": "/api/v1/benefits/search, /api/v1/benefits/:id (public)",
                "categories": "/api/v1/categories[/:id] (public)",
                "user": "/api/v1/user/filters (protected)",
                "children": "/api/v1/children[/:id[/filters]] (protected)",
                "admin": "/api/v1/admin/{filters,benefits,categories} (admin)",
            }
        }
    }))
}

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.store.backend();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": backend
                }
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "storage unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "storage": backend
                    }
                })),
            )
        }
    }
}
