use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::acl::{AccessPolicy, Identity, PermissionTable, ROLE_ADMIN, ROLE_CUSTOMER, ROLE_MERCHANT};
use crate::catalog::{
    Address, Category, GeoPoint, NewCategory, NewProduct, NewRestaurant, NewVariant, Price,
    Product, Restaurant, RestaurantStatus,
};
use crate::database::MemoryStore;
use crate::services::{CatalogServices, CatalogSettings, Repositories};

/// Services wired against a fresh in-memory store
pub struct TestContext {
    pub store: MemoryStore,
    pub services: CatalogServices,
}

impl TestContext {
    pub fn new() -> Self {
        let store = MemoryStore::recording();
        let policy = AccessPolicy::new(Arc::new(PermissionTable::catalog_default()));
        let services = CatalogServices::new(
            Repositories::from_store(store.clone()),
            policy,
            CatalogSettings::default(),
        );
        Self { store, services }
    }

    pub async fn seed_restaurant(&self, merchant_id: &str) -> Restaurant {
        self.services
            .restaurants
            .create(&admin("seeder"), new_restaurant(merchant_id))
            .await
            .expect("seed restaurant")
    }

    pub async fn seed_category(&self, restaurant: &Restaurant) -> Category {
        self.services
            .categories
            .create(&admin("seeder"), new_category(restaurant.id))
            .await
            .expect("seed category")
    }

    pub async fn seed_product(&self, restaurant: &Restaurant, category: &Category) -> Product {
        self.services
            .products
            .create(&admin("seeder"), new_product(restaurant.id, category.id))
            .await
            .expect("seed product")
    }

    pub async fn open(&self, restaurant: &Restaurant) {
        self.services
            .restaurants
            .set_status(&admin("seeder"), restaurant.id, RestaurantStatus::Open)
            .await
            .expect("open restaurant");
    }
}

pub fn merchant(user_id: &str) -> Identity {
    Identity::new(user_id, ROLE_MERCHANT, "test-client")
}

pub fn customer(user_id: &str) -> Identity {
    Identity::new(user_id, ROLE_CUSTOMER, "test-client")
}

pub fn admin(user_id: &str) -> Identity {
    Identity::new(user_id, ROLE_ADMIN, "test-client")
}

pub fn new_restaurant(merchant_id: &str) -> NewRestaurant {
    NewRestaurant {
        merchant_id: merchant_id.to_string(),
        name: "Spice Route".to_string(),
        description: "South Indian kitchen".to_string(),
        address: Address {
            street: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            country: "India".to_string(),
            pincode: "560001".to_string(),
            location: GeoPoint {
                longitude: 77.5946,
                latitude: 12.9716,
            },
        },
    }
}

pub fn new_category(restaurant_id: Uuid) -> NewCategory {
    NewCategory {
        restaurant_id,
        name: "Dosas".to_string(),
        description: String::new(),
    }
}

pub fn new_variant(name: &str) -> NewVariant {
    NewVariant {
        name: name.to_string(),
        description: String::new(),
        price: Price {
            amount: Decimal::new(12_50, 2),
            currency: "INR".to_string(),
        },
        in_stock: true,
    }
}

pub fn new_product(restaurant_id: Uuid, category_id: Uuid) -> NewProduct {
    NewProduct {
        restaurant_id,
        category_id,
        name: "Masala Dosa".to_string(),
        description: "Crisp rice crepe".to_string(),
        is_veg: true,
        variants: vec![new_variant("Regular plate"), new_variant("Large plate")],
    }
}
