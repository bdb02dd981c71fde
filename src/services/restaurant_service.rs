use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{find_restaurant, CatalogSettings, Repositories};
use crate::acl::{AccessPolicy, Action, Identity};
use crate::catalog::{
    CatalogError, CatalogResult, Conflict, ListRestaurantsQuery, NewRestaurant, Paginated, Restaurant,
    RestaurantStatus,
};
use crate::database::{CategoryRepository, ProductRepository, RestaurantRepository};
use crate::task_group::TaskGroup;

#[derive(Clone)]
pub struct RestaurantService {
    restaurants: Arc<dyn RestaurantRepository>,
    categories: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
    policy: AccessPolicy,
    settings: CatalogSettings,
}

impl RestaurantService {
    pub fn new(repos: Repositories, policy: AccessPolicy, settings: CatalogSettings) -> Self {
        Self {
            restaurants: repos.restaurants,
            categories: repos.categories,
            products: repos.products,
            policy,
            settings,
        }
    }

    /// Register a restaurant for `new.merchant_id`; it starts out closed
    pub async fn create(&self, identity: &Identity, new: NewRestaurant) -> CatalogResult<Restaurant> {
        new.validate()?;
        self.policy
            .require(identity, Action::Write, Some(&new.merchant_id))?;

        let restaurant = new.into_restaurant(Utc::now());
        self.restaurants.create(&restaurant).await?;

        info!(restaurant_id = %restaurant.id, merchant_id = %restaurant.merchant_id, "restaurant created");
        Ok(restaurant)
    }

    pub async fn get_by_id(&self, identity: &Identity, id: Uuid) -> CatalogResult<Restaurant> {
        let restaurant = find_restaurant(self.restaurants.as_ref(), id).await?;
        self.policy
            .require(identity, Action::Read, Some(&restaurant.merchant_id))?;
        Ok(restaurant)
    }

    /// Open or close a restaurant
    pub async fn set_status(
        &self,
        identity: &Identity,
        id: Uuid,
        status: RestaurantStatus,
    ) -> CatalogResult<Restaurant> {
        let restaurant = find_restaurant(self.restaurants.as_ref(), id).await?;
        self.policy
            .require(identity, Action::Write, Some(&restaurant.merchant_id))?;

        let updated = self
            .restaurants
            .update_status(id, status)
            .await?
            .ok_or(CatalogError::NotFound("restaurant"))?;

        info!(restaurant_id = %id, status = status.as_str(), "restaurant status changed");
        Ok(updated)
    }

    /// Tear down a closed restaurant together with its categories and products.
    ///
    /// Children go first: categories, then products (with their variants),
    /// then the restaurant row. Nothing is rolled back; the first failing
    /// step aborts the remaining ones and its error is returned.
    pub async fn delete_by_id(&self, identity: &Identity, id: Uuid) -> CatalogResult<()> {
        let restaurant = find_restaurant(self.restaurants.as_ref(), id).await?;
        if restaurant.is_open() {
            return Err(Conflict::RestaurantOpen.into());
        }
        self.policy
            .require(identity, Action::Write, Some(&restaurant.merchant_id))?;

        if let Err(err) = self.categories.delete_by_restaurant_id(id).await {
            warn!(restaurant_id = %id, step = "categories", "restaurant cascade aborted");
            return Err(err.into());
        }
        if let Err(err) = self.products.delete_by_restaurant_id(id).await {
            warn!(restaurant_id = %id, step = "products", "restaurant cascade aborted");
            return Err(err.into());
        }
        self.restaurants.delete_by_id(id).await?;

        info!(restaurant_id = %id, "restaurant deleted");
        Ok(())
    }

    /// Restaurants around a point, optionally narrowed to one merchant
    pub async fn list(
        &self,
        identity: &Identity,
        query: ListRestaurantsQuery,
    ) -> CatalogResult<Paginated<Restaurant>> {
        let filter = query.resolve(
            self.settings.restaurant_page_size,
            self.settings.max_page_size,
            self.settings.search_radius_meters,
        )?;
        self.policy
            .require(identity, Action::Read, filter.merchant_id.as_deref())?;

        debug!(?filter, "listing restaurants");

        let mut group: TaskGroup<CatalogError> = TaskGroup::new();
        let items = {
            let (repo, filter) = (self.restaurants.clone(), filter.clone());
            group.spawn(async move { Ok(repo.list(&filter).await?) })
        };
        let total = {
            let (repo, filter) = (self.restaurants.clone(), filter.clone());
            group.spawn(async move { Ok(repo.count(&filter).await?) })
        };
        group.wait().await?;

        Ok(Paginated::new(filter.page, total.take::<CatalogError>()?, items.take::<CatalogError>()?))
    }
}
