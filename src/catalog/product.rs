use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{CatalogError, CatalogResult};
use super::pagination::PageRequest;
use super::validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub is_veg: bool,
    pub variants: Vec<Variant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVariant {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub in_stock: bool,
}

impl NewVariant {
    pub fn validate(&self) -> CatalogResult<()> {
        self.validate_at("")
    }

    fn validate_at(&self, prefix: &str) -> CatalogResult<()> {
        validate::required(&format!("{prefix}name"), &self.name)?;
        validate::length(&format!("{prefix}name"), &self.name, 6, 30)?;
        validate::max_length(&format!("{prefix}description"), &self.description, 120)?;
        validate::price_amount(&format!("{prefix}price.amount"), self.price.amount)?;
        validate::currency_code(&format!("{prefix}price.currency"), &self.price.currency)
    }

    pub fn into_variant(self, product_id: Uuid, now: DateTime<Utc>) -> Variant {
        Variant {
            id: Uuid::new_v4(),
            product_id,
            name: self.name,
            description: self.description,
            price: self.price,
            in_stock: self.in_stock,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub restaurant_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_veg: bool,
    pub variants: Vec<NewVariant>,
}

impl NewProduct {
    pub fn validate(&self) -> CatalogResult<()> {
        validate::required("name", &self.name)?;
        validate::length("name", &self.name, 6, 30)?;
        validate::max_length("description", &self.description, 120)?;
        if self.variants.is_empty() {
            return Err(CatalogError::validation("variants", "at least one variant is required"));
        }
        for (index, variant) in self.variants.iter().enumerate() {
            variant.validate_at(&format!("variants[{index}]."))?;
        }
        Ok(())
    }

    /// Assigns the product id and stamps every variant with it
    pub fn into_product(self, now: DateTime<Utc>) -> Product {
        let id = Uuid::new_v4();
        Product {
            id,
            restaurant_id: self.restaurant_id,
            category_id: self.category_id,
            name: self.name,
            description: self.description,
            is_veg: self.is_veg,
            variants: self
                .variants
                .into_iter()
                .map(|variant| variant.into_variant(id, now))
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Resolved filter shared by the page fetch and the count query
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFilter {
    pub restaurant_id: Uuid,
    pub page: PageRequest,
}
