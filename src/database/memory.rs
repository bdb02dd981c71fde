//! In-process storage gateway.
//!
//! Used when no `DATABASE_URL` is configured and by the test suites. A
//! recording store appends every call to a journal (in call order) so that
//! callers can assert on which storage operations ran. Any operation can be
//! made to fail outright or to stall until its call deadline expires.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::bounded;
use super::manager::DatabaseError;
use super::repository::{CategoryRepository, HealthRepository, ProductRepository, RestaurantRepository};
use crate::catalog::{
    Category, Product, ProductFilter, Restaurant, RestaurantFilter, RestaurantStatus, Variant,
};

pub mod ops {
    pub const RESTAURANT_CREATE: &str = "restaurant.create";
    pub const RESTAURANT_GET: &str = "restaurant.get_by_id";
    pub const RESTAURANT_UPDATE_STATUS: &str = "restaurant.update_status";
    pub const RESTAURANT_DELETE: &str = "restaurant.delete_by_id";
    pub const RESTAURANT_LIST: &str = "restaurant.list";
    pub const RESTAURANT_COUNT: &str = "restaurant.count";

    pub const CATEGORY_CREATE: &str = "category.create";
    pub const CATEGORY_GET: &str = "category.get_by_id";
    pub const CATEGORY_DELETE: &str = "category.delete_by_id";
    pub const CATEGORY_DELETE_BY_RESTAURANT: &str = "category.delete_by_restaurant_id";

    pub const PRODUCT_CREATE: &str = "product.create";
    pub const PRODUCT_GET: &str = "product.get_by_id";
    pub const PRODUCT_DELETE: &str = "product.delete_by_id";
    pub const PRODUCT_DELETE_BY_RESTAURANT: &str = "product.delete_by_restaurant_id";
    pub const PRODUCT_DELETE_BY_CATEGORY: &str = "product.delete_by_category_id";
    pub const PRODUCT_LIST: &str = "product.list_by_restaurant";
    pub const PRODUCT_COUNT: &str = "product.count_by_restaurant";

    pub const VARIANT_CREATE: &str = "variant.create";
    pub const VARIANT_GET: &str = "variant.get_by_id";
    pub const VARIANT_DELETE: &str = "variant.delete_by_id";
    pub const VARIANT_DELETE_BY_PRODUCT: &str = "variant.delete_by_product_id";

    pub const HEALTH_PING: &str = "health.ping";
}

use ops::*;

#[derive(Debug, Clone, Copy)]
enum Fault {
    Unavailable,
    Stall,
}

struct Tables {
    restaurants: RwLock<HashMap<Uuid, Restaurant>>,
    categories: RwLock<HashMap<Uuid, Category>>,
    // products are kept without their variants
    products: RwLock<HashMap<Uuid, Product>>,
    variants: RwLock<HashMap<Uuid, (u64, Variant)>>,
    variant_seq: AtomicU64,
    // only present on recording stores
    journal: Option<Mutex<Vec<&'static str>>>,
    failures: Mutex<HashMap<&'static str, Fault>>,
    call_timeout: Duration,
}

impl Tables {
    fn new(journal: Option<Mutex<Vec<&'static str>>>) -> Self {
        Self {
            restaurants: RwLock::default(),
            categories: RwLock::default(),
            products: RwLock::default(),
            variants: RwLock::default(),
            variant_seq: AtomicU64::new(0),
            journal,
            failures: Mutex::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Store without a call journal, for serving
    pub fn new() -> Self {
        Self {
            tables: Arc::new(Tables::new(None)),
        }
    }

    /// Store that journals every call; `calls` stays empty otherwise
    pub fn recording() -> Self {
        Self {
            tables: Arc::new(Tables::new(Some(Mutex::default()))),
        }
    }

    /// Every storage call made so far, oldest first
    pub fn calls(&self) -> Vec<&'static str> {
        match &self.tables.journal {
            Some(journal) => journal.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            None => Vec::new(),
        }
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls().into_iter().filter(|call| *call == op).count()
    }

    pub fn clear_calls(&self) {
        if let Some(journal) = &self.tables.journal {
            journal.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Make every later call of `op` fail as an unavailable store would
    pub fn fail_on(&self, op: &'static str) {
        self.inject(op, Fault::Unavailable);
    }

    /// Make every later call of `op` hang until the per-call deadline fires
    pub fn stall_on(&self, op: &'static str) {
        self.inject(op, Fault::Stall);
    }

    fn inject(&self, op: &'static str, fault: Fault) {
        self.tables
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op, fault);
    }

    pub fn clear_failures(&self) {
        self.tables
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub async fn restaurant_count(&self) -> usize {
        self.tables.restaurants.read().await.len()
    }

    pub async fn category_count(&self) -> usize {
        self.tables.categories.read().await.len()
    }

    pub async fn product_count(&self) -> usize {
        self.tables.products.read().await.len()
    }

    pub async fn variant_count(&self) -> usize {
        self.tables.variants.read().await.len()
    }

    async fn enter(&self, op: &'static str) -> Result<(), DatabaseError> {
        if let Some(journal) = &self.tables.journal {
            journal.lock().unwrap_or_else(PoisonError::into_inner).push(op);
        }

        let fault = self
            .tables
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(op)
            .copied();
        match fault {
            None => Ok(()),
            Some(Fault::Unavailable) => Err(DatabaseError::Injected(op.to_string())),
            Some(Fault::Stall) => bounded(self.tables.call_timeout, std::future::pending()).await,
        }
    }

    async fn insert_variant(&self, variant: &Variant) {
        let seq = self.tables.variant_seq.fetch_add(1, Ordering::Relaxed);
        self.tables
            .variants
            .write()
            .await
            .insert(variant.id, (seq, variant.clone()));
    }

    async fn with_variants(&self, mut product: Product) -> Product {
        let variants = self.tables.variants.read().await;
        let mut owned: Vec<&(u64, Variant)> = variants
            .values()
            .filter(|(_, variant)| variant.product_id == product.id)
            .collect();
        owned.sort_by_key(|(seq, _)| *seq);
        product.variants = owned.into_iter().map(|(_, variant)| variant.clone()).collect();
        product
    }

    async fn delete_products_matching<P>(&self, matches: P)
    where
        P: Fn(&Product) -> bool,
    {
        let mut products = self.tables.products.write().await;
        let doomed: HashSet<Uuid> = products
            .values()
            .filter(|product| matches(product))
            .map(|product| product.id)
            .collect();

        self.tables
            .variants
            .write()
            .await
            .retain(|_, (_, variant)| !doomed.contains(&variant.product_id));
        products.retain(|id, _| !doomed.contains(id));
    }
}

#[async_trait]
impl RestaurantRepository for MemoryStore {
    async fn create(&self, restaurant: &Restaurant) -> Result<(), DatabaseError> {
        self.enter(RESTAURANT_CREATE).await?;
        self.tables
            .restaurants
            .write()
            .await
            .insert(restaurant.id, restaurant.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Restaurant>, DatabaseError> {
        self.enter(RESTAURANT_GET).await?;
        Ok(self.tables.restaurants.read().await.get(&id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: RestaurantStatus,
    ) -> Result<Option<Restaurant>, DatabaseError> {
        self.enter(RESTAURANT_UPDATE_STATUS).await?;
        let mut restaurants = self.tables.restaurants.write().await;
        Ok(restaurants.get_mut(&id).map(|restaurant| {
            restaurant.status = status;
            restaurant.updated_at = Utc::now();
            restaurant.clone()
        }))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.enter(RESTAURANT_DELETE).await?;
        self.tables.restaurants.write().await.remove(&id);
        Ok(())
    }

    async fn list(&self, filter: &RestaurantFilter) -> Result<Vec<Restaurant>, DatabaseError> {
        self.enter(RESTAURANT_LIST).await?;
        let restaurants = self.tables.restaurants.read().await;
        let mut matching: Vec<&Restaurant> = restaurants.values().filter(|r| filter.matches(r)).collect();
        matching.sort_by_key(|r| (r.created_at, r.id));
        Ok(matching
            .into_iter()
            .skip(filter.page.offset() as usize)
            .take(filter.page.page_size as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &RestaurantFilter) -> Result<u64, DatabaseError> {
        self.enter(RESTAURANT_COUNT).await?;
        let restaurants = self.tables.restaurants.read().await;
        Ok(restaurants.values().filter(|r| filter.matches(r)).count() as u64)
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn create(&self, category: &Category) -> Result<(), DatabaseError> {
        self.enter(CATEGORY_CREATE).await?;
        self.tables
            .categories
            .write()
            .await
            .insert(category.id, category.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Category>, DatabaseError> {
        self.enter(CATEGORY_GET).await?;
        Ok(self.tables.categories.read().await.get(&id).cloned())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.enter(CATEGORY_DELETE).await?;
        self.tables.categories.write().await.remove(&id);
        Ok(())
    }

    async fn delete_by_restaurant_id(&self, restaurant_id: Uuid) -> Result<(), DatabaseError> {
        self.enter(CATEGORY_DELETE_BY_RESTAURANT).await?;
        self.tables
            .categories
            .write()
            .await
            .retain(|_, category| category.restaurant_id != restaurant_id);
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn create(&self, product: &Product) -> Result<(), DatabaseError> {
        self.enter(PRODUCT_CREATE).await?;
        let mut stored = product.clone();
        let variants = std::mem::take(&mut stored.variants);
        self.tables.products.write().await.insert(stored.id, stored);
        for variant in &variants {
            self.insert_variant(variant).await;
        }
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>, DatabaseError> {
        self.enter(PRODUCT_GET).await?;
        let product = self.tables.products.read().await.get(&id).cloned();
        match product {
            Some(product) => Ok(Some(self.with_variants(product).await)),
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.enter(PRODUCT_DELETE).await?;
        self.tables.products.write().await.remove(&id);
        Ok(())
    }

    async fn delete_by_restaurant_id(&self, restaurant_id: Uuid) -> Result<(), DatabaseError> {
        self.enter(PRODUCT_DELETE_BY_RESTAURANT).await?;
        self.delete_products_matching(|p| p.restaurant_id == restaurant_id).await;
        Ok(())
    }

    async fn delete_by_category_id(&self, category_id: Uuid) -> Result<(), DatabaseError> {
        self.enter(PRODUCT_DELETE_BY_CATEGORY).await?;
        self.delete_products_matching(|p| p.category_id == category_id).await;
        Ok(())
    }

    async fn list_by_restaurant(&self, filter: &ProductFilter) -> Result<Vec<Product>, DatabaseError> {
        self.enter(PRODUCT_LIST).await?;
        let page: Vec<Product> = {
            let products = self.tables.products.read().await;
            let mut matching: Vec<&Product> = products
                .values()
                .filter(|p| p.restaurant_id == filter.restaurant_id)
                .collect();
            matching.sort_by_key(|p| (p.created_at, p.id));
            matching
                .into_iter()
                .skip(filter.page.offset() as usize)
                .take(filter.page.page_size as usize)
                .cloned()
                .collect()
        };

        let mut out = Vec::with_capacity(page.len());
        for product in page {
            out.push(self.with_variants(product).await);
        }
        Ok(out)
    }

    async fn count_by_restaurant(&self, filter: &ProductFilter) -> Result<u64, DatabaseError> {
        self.enter(PRODUCT_COUNT).await?;
        let products = self.tables.products.read().await;
        Ok(products
            .values()
            .filter(|p| p.restaurant_id == filter.restaurant_id)
            .count() as u64)
    }

    async fn create_variant(&self, variant: &Variant) -> Result<(), DatabaseError> {
        self.enter(VARIANT_CREATE).await?;
        self.insert_variant(variant).await;
        Ok(())
    }

    async fn get_variant(&self, id: Uuid) -> Result<Option<Variant>, DatabaseError> {
        self.enter(VARIANT_GET).await?;
        Ok(self
            .tables
            .variants
            .read()
            .await
            .get(&id)
            .map(|(_, variant)| variant.clone()))
    }

    async fn delete_variant(&self, id: Uuid) -> Result<(), DatabaseError> {
        self.enter(VARIANT_DELETE).await?;
        self.tables.variants.write().await.remove(&id);
        Ok(())
    }

    async fn delete_variants_by_product_id(&self, product_id: Uuid) -> Result<(), DatabaseError> {
        self.enter(VARIANT_DELETE_BY_PRODUCT).await?;
        self.tables
            .variants
            .write()
            .await
            .retain(|_, (_, variant)| variant.product_id != product_id);
        Ok(())
    }
}

#[async_trait]
impl HealthRepository for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.enter(HEALTH_PING).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn journal_records_calls_in_order_including_failures() {
        let store = MemoryStore::recording();
        store.fail_on(CATEGORY_DELETE_BY_RESTAURANT);

        let id = Uuid::new_v4();
        assert!(RestaurantRepository::get_by_id(&store, id).await.unwrap().is_none());
        assert!(CategoryRepository::delete_by_restaurant_id(&store, id).await.is_err());

        assert_eq!(store.calls(), vec![RESTAURANT_GET, CATEGORY_DELETE_BY_RESTAURANT]);
        assert_eq!(store.call_count(RESTAURANT_GET), 1);

        store.clear_failures();
        assert!(CategoryRepository::delete_by_restaurant_id(&store, id).await.is_ok());
    }

    #[tokio::test]
    async fn ping_can_be_failed() {
        let store = MemoryStore::new();
        assert!(store.ping().await.is_ok());
        store.fail_on(HEALTH_PING);
        assert!(matches!(store.ping().await, Err(DatabaseError::Injected(_))));
    }

    #[tokio::test]
    async fn serving_store_keeps_no_journal() {
        let store = MemoryStore::new();
        for _ in 0..1_000 {
            store.ping().await.unwrap();
        }
        assert!(store.calls().is_empty());
        assert_eq!(store.call_count(HEALTH_PING), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_call_hits_its_deadline() {
        let store = MemoryStore::recording();
        store.stall_on(RESTAURANT_GET);

        let result = RestaurantRepository::get_by_id(&store, Uuid::new_v4()).await;
        assert!(matches!(result, Err(DatabaseError::Timeout(limit)) if limit == DEFAULT_CALL_TIMEOUT));
        assert_eq!(store.calls(), vec![RESTAURANT_GET]);
    }
}
