// Narrow per-entity storage interfaces consumed by the services.
//
// Lookups return `Option` so that an absent record is never confused with a
// populated one. Implementations must not cascade: deleting a parent only
// deletes the rows named by the call.

use async_trait::async_trait;
use uuid::Uuid;

use super::manager::DatabaseError;
use crate::catalog::{
    Category, Product, ProductFilter, Restaurant, RestaurantFilter, RestaurantStatus, Variant,
};

#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    async fn create(&self, restaurant: &Restaurant) -> Result<(), DatabaseError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Restaurant>, DatabaseError>;
    async fn update_status(
        &self,
        id: Uuid,
        status: RestaurantStatus,
    ) -> Result<Option<Restaurant>, DatabaseError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<(), DatabaseError>;
    async fn list(&self, filter: &RestaurantFilter) -> Result<Vec<Restaurant>, DatabaseError>;
    async fn count(&self, filter: &RestaurantFilter) -> Result<u64, DatabaseError>;
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: &Category) -> Result<(), DatabaseError>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Category>, DatabaseError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<(), DatabaseError>;
    async fn delete_by_restaurant_id(&self, restaurant_id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Persists the product together with its variants
    async fn create(&self, product: &Product) -> Result<(), DatabaseError>;
    /// Product with its variants populated
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>, DatabaseError>;
    async fn delete_by_id(&self, id: Uuid) -> Result<(), DatabaseError>;
    /// Removes every product of the restaurant along with their variants
    async fn delete_by_restaurant_id(&self, restaurant_id: Uuid) -> Result<(), DatabaseError>;
    /// Removes every product of the category along with their variants
    async fn delete_by_category_id(&self, category_id: Uuid) -> Result<(), DatabaseError>;
    async fn list_by_restaurant(&self, filter: &ProductFilter) -> Result<Vec<Product>, DatabaseError>;
    async fn count_by_restaurant(&self, filter: &ProductFilter) -> Result<u64, DatabaseError>;

    async fn create_variant(&self, variant: &Variant) -> Result<(), DatabaseError>;
    async fn get_variant(&self, id: Uuid) -> Result<Option<Variant>, DatabaseError>;
    async fn delete_variant(&self, id: Uuid) -> Result<(), DatabaseError>;
    async fn delete_variants_by_product_id(&self, product_id: Uuid) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait HealthRepository: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}
