pub mod category_service;
pub mod health_service;
pub mod product_service;
pub mod restaurant_service;

use std::sync::Arc;

use uuid::Uuid;

pub use category_service::CategoryService;
pub use health_service::HealthService;
pub use product_service::ProductService;
pub use restaurant_service::RestaurantService;

use crate::acl::AccessPolicy;
use crate::catalog::{CatalogError, CatalogResult, Restaurant};
use crate::config::CatalogConfig;
use crate::database::{CategoryRepository, HealthRepository, ProductRepository, RestaurantRepository};

/// Catalog tunables handed to the services at construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogSettings {
    pub restaurant_page_size: u64,
    pub product_page_size: u64,
    pub max_page_size: u64,
    pub search_radius_meters: f64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            restaurant_page_size: 10,
            product_page_size: 50,
            max_page_size: 100,
            search_radius_meters: 10_000.0,
        }
    }
}

impl From<&CatalogConfig> for CatalogSettings {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            restaurant_page_size: config.restaurant_page_size,
            product_page_size: config.product_page_size,
            max_page_size: config.max_page_size,
            search_radius_meters: config.search_radius_meters,
        }
    }
}

/// One handle per storage concern, all possibly backed by the same store
#[derive(Clone)]
pub struct Repositories {
    pub restaurants: Arc<dyn RestaurantRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub health: Arc<dyn HealthRepository>,
}

impl Repositories {
    pub fn from_store<S>(store: S) -> Self
    where
        S: RestaurantRepository + CategoryRepository + ProductRepository + HealthRepository + 'static,
    {
        let store = Arc::new(store);
        Self {
            restaurants: store.clone(),
            categories: store.clone(),
            products: store.clone(),
            health: store,
        }
    }
}

/// Every interactor wired against the same repositories and policy
#[derive(Clone)]
pub struct CatalogServices {
    pub restaurants: RestaurantService,
    pub categories: CategoryService,
    pub products: ProductService,
    pub health: HealthService,
}

impl CatalogServices {
    pub fn new(repos: Repositories, policy: AccessPolicy, settings: CatalogSettings) -> Self {
        Self {
            restaurants: RestaurantService::new(repos.clone(), policy.clone(), settings),
            categories: CategoryService::new(repos.clone(), policy.clone()),
            products: ProductService::new(repos.clone(), policy, settings),
            health: HealthService::new(repos.health),
        }
    }
}

/// Parent lookup shared by the interactors; absent is `NotFound`
pub(crate) async fn find_restaurant(
    restaurants: &dyn RestaurantRepository,
    id: Uuid,
) -> CatalogResult<Restaurant> {
    restaurants
        .get_by_id(id)
        .await?
        .ok_or(CatalogError::NotFound("restaurant"))
}
