use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::{middleware::from_fn_with_state, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::acl::{AccessPolicy, PermissionTable};
use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{CatalogServices, CatalogSettings, Repositories};

/// Shared by every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub services: CatalogServices,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    /// Wire the interactors against `repos` with the built-in permission table
    pub fn new(repos: Repositories, config: &AppConfig) -> Self {
        let policy = AccessPolicy::new(Arc::new(PermissionTable::catalog_default()));
        Self {
            services: CatalogServices::new(repos, policy, CatalogSettings::from(&config.catalog)),
            jwt_secret: Arc::from(config.security.jwt_secret.as_str()),
        }
    }
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let mut app = Router::new()
        // Public
        .route("/health", get(public::health))
        // Protected
        .merge(catalog_routes(state.clone()))
        .with_state(state)
        // Global middleware
        .layer(RequestBodyLimitLayer::new(config.api.max_request_size_bytes))
        .layer(TimeoutLayer::new(config.api.request_timeout()));

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security.cors_origins));
    }

    app.layer(TraceLayer::new_for_http())
}

fn catalog_routes(state: AppState) -> Router<AppState> {
    use protected::{category, product, restaurant};

    Router::new()
        .route(
            "/v1/catalog/restaurants",
            post(restaurant::create).get(restaurant::list),
        )
        .route(
            "/v1/catalog/restaurants/:restaurant_id",
            get(restaurant::get).delete(restaurant::delete),
        )
        .route(
            "/v1/catalog/restaurants/:restaurant_id/status",
            put(restaurant::set_status),
        )
        .route(
            "/v1/catalog/restaurants/:restaurant_id/products",
            get(product::list_by_restaurant),
        )
        .route("/v1/catalog/categories", post(category::create))
        .route(
            "/v1/catalog/categories/:category_id",
            get(category::get).delete(category::delete),
        )
        .route("/v1/catalog/products", post(product::create))
        .route(
            "/v1/catalog/products/:product_id",
            get(product::get).delete(product::delete),
        )
        .route(
            "/v1/catalog/products/:product_id/variants",
            post(product::add_variant),
        )
        .route(
            "/v1/catalog/products/:product_id/variants/:variant_id",
            axum::routing::delete(product::remove_variant),
        )
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let config = AppConfig::from_lookup(|_| None);
        let state = AppState::new(Repositories::from_store(MemoryStore::new()), &config);
        router(state, &config)
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn catalog_requires_a_token() {
        let response = app()
            .oneshot(
                Request::get("/v1/catalog/restaurants?latitude=0&longitude=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
