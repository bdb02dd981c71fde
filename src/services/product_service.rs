use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{find_restaurant, CatalogSettings, Repositories};
use crate::acl::{AccessPolicy, Action, Identity};
use crate::catalog::{
    CatalogError, CatalogResult, Conflict, NewProduct, NewVariant, PageQuery, Paginated, Product,
    ProductFilter, Restaurant, Variant,
};
use crate::database::{CategoryRepository, ProductRepository, RestaurantRepository};
use crate::task_group::TaskGroup;

/// Products and their variants.
///
/// A product has no owner of its own: every check is made against the
/// merchant of the restaurant it belongs to.
#[derive(Clone)]
pub struct ProductService {
    restaurants: Arc<dyn RestaurantRepository>,
    categories: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
    policy: AccessPolicy,
    settings: CatalogSettings,
}

impl ProductService {
    pub fn new(repos: Repositories, policy: AccessPolicy, settings: CatalogSettings) -> Self {
        Self {
            restaurants: repos.restaurants,
            categories: repos.categories,
            products: repos.products,
            policy,
            settings,
        }
    }

    pub async fn create(&self, identity: &Identity, new: NewProduct) -> CatalogResult<Product> {
        new.validate()?;
        let restaurant = find_restaurant(self.restaurants.as_ref(), new.restaurant_id).await?;
        let category = self
            .categories
            .get_by_id(new.category_id)
            .await?
            .ok_or(CatalogError::NotFound("category"))?;
        if category.restaurant_id != restaurant.id {
            return Err(Conflict::CategoryNotInRestaurant.into());
        }
        self.policy
            .require(identity, Action::Write, Some(&restaurant.merchant_id))?;

        let product = new.into_product(Utc::now());
        self.products.create(&product).await?;

        info!(
            product_id = %product.id,
            restaurant_id = %product.restaurant_id,
            variants = product.variants.len(),
            "product created"
        );
        Ok(product)
    }

    pub async fn get_by_id(&self, identity: &Identity, id: Uuid) -> CatalogResult<Product> {
        let (product, restaurant) = self.resolve(id).await?;
        self.policy
            .require(identity, Action::Read, Some(&restaurant.merchant_id))?;
        Ok(product)
    }

    /// Variants go first, then the product row
    pub async fn delete_by_id(&self, identity: &Identity, id: Uuid) -> CatalogResult<()> {
        let (product, restaurant) = self.resolve(id).await?;
        self.policy
            .require(identity, Action::Write, Some(&restaurant.merchant_id))?;

        self.products.delete_variants_by_product_id(product.id).await?;
        self.products.delete_by_id(product.id).await?;

        info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// One page of a restaurant's products
    pub async fn list_by_restaurant(
        &self,
        identity: &Identity,
        restaurant_id: Uuid,
        query: PageQuery,
    ) -> CatalogResult<Paginated<Product>> {
        let page = query.resolve(self.settings.product_page_size, self.settings.max_page_size)?;
        let restaurant = find_restaurant(self.restaurants.as_ref(), restaurant_id).await?;
        self.policy
            .require(identity, Action::Read, Some(&restaurant.merchant_id))?;

        let filter = ProductFilter {
            restaurant_id,
            page,
        };
        debug!(?filter, "listing products");

        let mut group: TaskGroup<CatalogError> = TaskGroup::new();
        let items = {
            let (repo, filter) = (self.products.clone(), filter.clone());
            group.spawn(async move { Ok(repo.list_by_restaurant(&filter).await?) })
        };
        let total = {
            let (repo, filter) = (self.products.clone(), filter.clone());
            group.spawn(async move { Ok(repo.count_by_restaurant(&filter).await?) })
        };
        group.wait().await?;

        Ok(Paginated::new(page, total.take::<CatalogError>()?, items.take::<CatalogError>()?))
    }

    pub async fn add_variant(
        &self,
        identity: &Identity,
        product_id: Uuid,
        new: NewVariant,
    ) -> CatalogResult<Variant> {
        new.validate()?;
        let (product, restaurant) = self.resolve(product_id).await?;
        self.policy
            .require(identity, Action::Write, Some(&restaurant.merchant_id))?;

        let variant = new.into_variant(product.id, Utc::now());
        self.products.create_variant(&variant).await?;

        info!(product_id = %product.id, variant_id = %variant.id, "variant added");
        Ok(variant)
    }

    pub async fn remove_variant(
        &self,
        identity: &Identity,
        product_id: Uuid,
        variant_id: Uuid,
    ) -> CatalogResult<()> {
        let (product, restaurant) = self.resolve(product_id).await?;
        self.policy
            .require(identity, Action::Write, Some(&restaurant.merchant_id))?;

        let variant = self
            .products
            .get_variant(variant_id)
            .await?
            .ok_or(CatalogError::NotFound("variant"))?;
        if variant.product_id != product.id {
            return Err(Conflict::VariantNotInProduct.into());
        }
        self.products.delete_variant(variant.id).await?;

        info!(product_id = %product.id, variant_id = %variant_id, "variant removed");
        Ok(())
    }

    async fn resolve(&self, id: Uuid) -> CatalogResult<(Product, Restaurant)> {
        let product = self
            .products
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound("product"))?;
        let restaurant = find_restaurant(self.restaurants.as_ref(), product.restaurant_id).await?;
        Ok((product, restaurant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::ops;
    use crate::testing::{self, TestContext};

    #[tokio::test]
    async fn create_persists_product_with_variants() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        let category = ctx.seed_category(&restaurant).await;

        let product = ctx
            .services
            .products
            .create(&testing::merchant("m-1"), testing::new_product(restaurant.id, category.id))
            .await
            .unwrap();

        assert_eq!(product.variants.len(), 2);
        assert!(product.variants.iter().all(|v| v.product_id == product.id));

        let fetched = ctx
            .services
            .products
            .get_by_id(&testing::customer("c-1"), product.id)
            .await
            .unwrap();
        assert_eq!(fetched, product);
    }

    #[tokio::test]
    async fn category_of_another_restaurant_is_a_conflict() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        let elsewhere = ctx.seed_restaurant("m-1").await;
        let foreign = ctx.seed_category(&elsewhere).await;

        for identity in [testing::merchant("m-1"), testing::admin("a-1")] {
            let err = ctx
                .services
                .products
                .create(&identity, testing::new_product(restaurant.id, foreign.id))
                .await
                .unwrap_err();
            assert_eq!(err, CatalogError::Conflict(Conflict::CategoryNotInRestaurant));
        }
        assert_eq!(ctx.store.call_count(ops::PRODUCT_CREATE), 0);
    }

    #[tokio::test]
    async fn missing_parents_are_not_found() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        let merchant = testing::merchant("m-1");

        let no_restaurant = ctx
            .services
            .products
            .create(&merchant, testing::new_product(Uuid::new_v4(), Uuid::new_v4()))
            .await;
        assert_eq!(no_restaurant.unwrap_err(), CatalogError::NotFound("restaurant"));

        let no_category = ctx
            .services
            .products
            .create(&merchant, testing::new_product(restaurant.id, Uuid::new_v4()))
            .await;
        assert_eq!(no_category.unwrap_err(), CatalogError::NotFound("category"));
        assert_eq!(ctx.store.call_count(ops::PRODUCT_CREATE), 0);
    }

    #[tokio::test]
    async fn product_without_variants_is_rejected() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        let category = ctx.seed_category(&restaurant).await;
        let mut new = testing::new_product(restaurant.id, category.id);
        new.variants.clear();

        let err = ctx
            .services
            .products
            .create(&testing::merchant("m-1"), new)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation { ref field, .. } if field == "variants"));
    }

    #[tokio::test]
    async fn delete_removes_variants_then_product() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        let category = ctx.seed_category(&restaurant).await;
        let product = ctx.seed_product(&restaurant, &category).await;
        ctx.store.clear_calls();

        ctx.services
            .products
            .delete_by_id(&testing::merchant("m-1"), product.id)
            .await
            .unwrap();

        assert_eq!(
            ctx.store.calls(),
            vec![
                ops::PRODUCT_GET,
                ops::RESTAURANT_GET,
                ops::VARIANT_DELETE_BY_PRODUCT,
                ops::PRODUCT_DELETE,
            ]
        );
        assert_eq!(ctx.store.variant_count().await, 0);
        assert_eq!(ctx.store.product_count().await, 0);
    }

    #[tokio::test]
    async fn failed_variant_cleanup_keeps_product() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        let category = ctx.seed_category(&restaurant).await;
        let product = ctx.seed_product(&restaurant, &category).await;
        ctx.store.fail_on(ops::VARIANT_DELETE_BY_PRODUCT);

        let err = ctx
            .services
            .products
            .delete_by_id(&testing::merchant("m-1"), product.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Upstream(_)));
        assert_eq!(ctx.store.call_count(ops::PRODUCT_DELETE), 0);
    }

    #[tokio::test]
    async fn list_by_restaurant_paginates() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        let category = ctx.seed_category(&restaurant).await;
        for _ in 0..7 {
            ctx.seed_product(&restaurant, &category).await;
        }

        let page = ctx
            .services
            .products
            .list_by_restaurant(
                &testing::merchant("m-1"),
                restaurant.id,
                PageQuery { page_number: 2, page_size: 5 },
            )
            .await
            .unwrap();

        assert_eq!(page.total, 7);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|p| p.variants.len() == 2));
    }

    #[tokio::test]
    async fn failing_page_fetch_fails_the_list() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        ctx.store.fail_on(ops::PRODUCT_LIST);

        let err = ctx
            .services
            .products
            .list_by_restaurant(&testing::customer("c-1"), restaurant.id, PageQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Upstream(_)));
    }

    #[tokio::test]
    async fn variants_can_be_added_and_removed() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        let category = ctx.seed_category(&restaurant).await;
        let product = ctx.seed_product(&restaurant, &category).await;
        let merchant = testing::merchant("m-1");

        let added = ctx
            .services
            .products
            .add_variant(&merchant, product.id, testing::new_variant("Family size"))
            .await
            .unwrap();
        assert_eq!(added.product_id, product.id);

        let fetched = ctx.services.products.get_by_id(&merchant, product.id).await.unwrap();
        assert_eq!(fetched.variants.last().map(|v| v.id), Some(added.id));

        ctx.services
            .products
            .remove_variant(&merchant, product.id, added.id)
            .await
            .unwrap();
        let fetched = ctx.services.products.get_by_id(&merchant, product.id).await.unwrap();
        assert_eq!(fetched.variants.len(), 2);
    }

    #[tokio::test]
    async fn variant_of_another_product_is_a_conflict() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        let category = ctx.seed_category(&restaurant).await;
        let product = ctx.seed_product(&restaurant, &category).await;
        let other = ctx.seed_product(&restaurant, &category).await;

        let err = ctx
            .services
            .products
            .remove_variant(&testing::merchant("m-1"), product.id, other.variants[0].id)
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::Conflict(Conflict::VariantNotInProduct));
        assert_eq!(ctx.store.call_count(ops::VARIANT_DELETE), 0);

        let missing = ctx
            .services
            .products
            .remove_variant(&testing::merchant("m-1"), product.id, Uuid::new_v4())
            .await;
        assert_eq!(missing.unwrap_err(), CatalogError::NotFound("variant"));
    }

    #[tokio::test]
    async fn customer_cannot_add_variants() {
        let ctx = TestContext::new();
        let restaurant = ctx.seed_restaurant("m-1").await;
        let category = ctx.seed_category(&restaurant).await;
        let product = ctx.seed_product(&restaurant, &category).await;

        let err = ctx
            .services
            .products
            .add_variant(&testing::customer("c-1"), product.id, testing::new_variant("Family size"))
            .await
            .unwrap_err();
        assert_eq!(err, CatalogError::Forbidden);
        assert_eq!(ctx.store.call_count(ops::VARIANT_CREATE), 0);
    }
}
