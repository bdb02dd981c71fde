use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{find_restaurant, Repositories};
use crate::acl::{AccessPolicy, Action, Identity};
use crate::catalog::{CatalogError, CatalogResult, Category, NewCategory, Restaurant};
use crate::database::{CategoryRepository, ProductRepository, RestaurantRepository};

#[derive(Clone)]
pub struct CategoryService {
    restaurants: Arc<dyn RestaurantRepository>,
    categories: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
    policy: AccessPolicy,
}

impl CategoryService {
    pub fn new(repos: Repositories, policy: AccessPolicy) -> Self {
        Self {
            restaurants: repos.restaurants,
            categories: repos.categories,
            products: repos.products,
            policy,
        }
    }

    /// Add a category under an existing restaurant, as its merchant
    pub async fn create(&self, identity: &Identity, new: NewCategory) -> CatalogResult<Category> {
        new.validate()?;
        let restaurant = find_restaurant(self.restaurants.as_ref(), new.restaurant_id).await?;
        self.policy
            .require(identity, Action::Write, Some(&restaurant.merchant_id))?;

        let category = new.into_category(Utc::now());
        self.categories.create(&category).await?;

        info!(category_id = %category.id, restaurant_id = %category.restaurant_id, "category created");
        Ok(category)
    }

    pub async fn get_by_id(&self, identity: &Identity, id: Uuid) -> CatalogResult<Category> {
        let (category, restaurant) = self.resolve(id).await?;
        self.policy
            .require(identity, Action::Read, Some(&restaurant.merchant_id))?;
        Ok(category)
    }

    /// Delete the category after removing its products
    pub async fn delete_by_id(&self, identity: &Identity, id: Uuid) -> CatalogResult<()> {
        let (category, restaurant) = self.resolve(id).await?;
        self.policy
            .require(identity, Action::Write, Some(&restaurant.merchant_id))?;

        if let Err(err) = self.products.delete_by_category_id(category.id).await {
            warn!(category_id = %id, step = "products", "category cascade aborted");
            return Err(err.into());
        }
        self.categories.delete_by_id(category.id).await?;

        info!(category_id = %id, "category deleted");
        Ok(())
    }

    async fn resolve(&self, id: Uuid) -> CatalogResult<(Category, Restaurant)> {
        let category = self
            .categories
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound("category"))?;
        let restaurant = find_restaurant(self.restaurants.as_ref(), category.restaurant_id).await?;
        Ok((category, restaurant))
    }
}
