use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

use super::bounded;
use super::manager::DatabaseError;
use super::repository::{CategoryRepository, HealthRepository, ProductRepository, RestaurantRepository};
use crate::catalog::{
    Address, Category, GeoPoint, Price, Product, ProductFilter, Restaurant, RestaurantFilter,
    RestaurantStatus, Variant,
};

const RESTAURANT_COLUMNS: &str = "id, merchant_id, name, description, street, city, state, country, \
     pincode, longitude, latitude, status, created_at, updated_at";

const PRODUCT_COLUMNS: &str =
    "id, restaurant_id, category_id, name, description, is_veg, created_at, updated_at";

const VARIANT_COLUMNS: &str =
    "id, product_id, name, description, amount, currency, in_stock, created_at, updated_at";

// $1 latitude, $2 longitude, $3 radius in meters, $4 optional merchant
const RESTAURANT_FILTER: &str = "(2 * 6371000 * asin(least(1, sqrt(\
     power(sin(radians(latitude - $1) / 2), 2) + \
     cos(radians($1)) * cos(radians(latitude)) * power(sin(radians(longitude - $2) / 2), 2))))) <= $3 \
     AND ($4::text IS NULL OR merchant_id = $4::text)";

/// Storage gateway backed by Postgres. Every statement is bounded by `query_timeout`.
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
    query_timeout: Duration,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }
}

#[derive(FromRow)]
struct RestaurantRow {
    id: Uuid,
    merchant_id: String,
    name: String,
    description: String,
    street: String,
    city: String,
    state: String,
    country: String,
    pincode: String,
    longitude: f64,
    latitude: f64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RestaurantRow> for Restaurant {
    type Error = DatabaseError;

    fn try_from(row: RestaurantRow) -> Result<Self, Self::Error> {
        let status = RestaurantStatus::parse(&row.status).ok_or_else(|| {
            DatabaseError::QueryError(format!("unknown restaurant status '{}'", row.status))
        })?;
        Ok(Restaurant {
            id: row.id,
            merchant_id: row.merchant_id,
            name: row.name,
            description: row.description,
            address: Address {
                street: row.street,
                city: row.city,
                state: row.state,
                country: row.country,
                pincode: row.pincode,
                location: GeoPoint {
                    longitude: row.longitude,
                    latitude: row.latitude,
                },
            },
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CategoryRow {
    id: Uuid,
    restaurant_id: Uuid,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            restaurant_id: row.restaurant_id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct ProductRow {
    id: Uuid,
    restaurant_id: Uuid,
    category_id: Uuid,
    name: String,
    description: String,
    is_veg: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, variants: Vec<Variant>) -> Product {
        Product {
            id: self.id,
            restaurant_id: self.restaurant_id,
            category_id: self.category_id,
            name: self.name,
            description: self.description,
            is_veg: self.is_veg,
            variants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct VariantRow {
    id: Uuid,
    product_id: Uuid,
    name: String,
    description: String,
    amount: Decimal,
    currency: String,
    in_stock: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VariantRow> for Variant {
    fn from(row: VariantRow) -> Self {
        Variant {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            description: row.description,
            price: Price {
                amount: row.amount,
                currency: row.currency,
            },
            in_stock: row.in_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

async fn insert_variant<'e, E>(executor: E, variant: &Variant) -> Result<(), DatabaseError>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO variants (id, product_id, name, description, amount, currency, in_stock, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(variant.id)
    .bind(variant.product_id)
    .bind(&variant.name)
    .bind(&variant.description)
    .bind(variant.price.amount)
    .bind(&variant.price.currency)
    .bind(variant.in_stock)
    .bind(variant.created_at)
    .bind(variant.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

impl PgCatalogStore {
    async fn variants_for(&self, product_ids: &[Uuid]) -> Result<Vec<Variant>, DatabaseError> {
        if product_ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(
            "SELECT {VARIANT_COLUMNS} FROM variants WHERE product_id = ANY($1) ORDER BY seq"
        );
        let rows: Vec<VariantRow> = bounded(self.query_timeout, async {
            Ok(sqlx::query_as(&sql).bind(product_ids).fetch_all(&self.pool).await?)
        })
        .await?;
        Ok(rows.into_iter().map(Variant::from).collect())
    }

    async fn insert_variant(&self, variant: &Variant) -> Result<(), DatabaseError> {
        bounded(self.query_timeout, insert_variant(&self.pool, variant)).await
    }

    /// Deletes the products matched by `column = id` and, first, their variants
    async fn delete_products_where(&self, column: &'static str, id: Uuid) -> Result<(), DatabaseError> {
        let variants_sql = format!(
            "DELETE FROM variants WHERE product_id IN (SELECT id FROM products WHERE {column} = $1)"
        );
        bounded(self.query_timeout, async {
            sqlx::query(&variants_sql).bind(id).execute(&self.pool).await?;
            Ok(())
        })
        .await?;

        let products_sql = format!("DELETE FROM products WHERE {column} = $1");
        bounded(self.query_timeout, async {
            sqlx::query(&products_sql).bind(id).execute(&self.pool).await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl RestaurantRepository for PgCatalogStore {
    async fn create(&self, restaurant: &Restaurant) -> Result<(), DatabaseError> {
        let address = &restaurant.address;
        bounded(self.query_timeout, async {
            sqlx::query(
                "INSERT INTO restaurants (id, merchant_id, name, description, street, city, state, country, \
                 pincode, longitude, latitude, status, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            )
            .bind(restaurant.id)
            .bind(&restaurant.merchant_id)
            .bind(&restaurant.name)
            .bind(&restaurant.description)
            .bind(&address.street)
            .bind(&address.city)
            .bind(&address.state)
            .bind(&address.country)
            .bind(&address.pincode)
            .bind(address.location.longitude)
            .bind(address.location.latitude)
            .bind(restaurant.status.as_str())
            .bind(restaurant.created_at)
            .bind(restaurant.updated_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Restaurant>, DatabaseError> {
        let sql = format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1");
        let row: Option<RestaurantRow> = bounded(self.query_timeout, async {
            Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
        })
        .await?;
        row.map(Restaurant::try_from).transpose()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: RestaurantStatus,
    ) -> Result<Option<Restaurant>, DatabaseError> {
        let sql = format!(
            "UPDATE restaurants SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {RESTAURANT_COLUMNS}"
        );
        let row: Option<RestaurantRow> = bounded(self.query_timeout, async {
            Ok(sqlx::query_as(&sql)
                .bind(id)
                .bind(status.as_str())
                .bind(Utc::now())
                .fetch_optional(&self.pool)
                .await?)
        })
        .await?;
        row.map(Restaurant::try_from).transpose()
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), DatabaseError> {
        bounded(self.query_timeout, async {
            sqlx::query("DELETE FROM restaurants WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn list(&self, filter: &RestaurantFilter) -> Result<Vec<Restaurant>, DatabaseError> {
        let sql = format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE {RESTAURANT_FILTER} \
             ORDER BY created_at, id LIMIT $5 OFFSET $6"
        );
        let rows: Vec<RestaurantRow> = bounded(self.query_timeout, async {
            Ok(sqlx::query_as(&sql)
                .bind(filter.center.latitude)
                .bind(filter.center.longitude)
                .bind(filter.radius_meters)
                .bind(filter.merchant_id.as_deref())
                .bind(to_i64(filter.page.page_size))
                .bind(to_i64(filter.page.offset()))
                .fetch_all(&self.pool)
                .await?)
        })
        .await?;
        rows.into_iter().map(Restaurant::try_from).collect()
    }

    async fn count(&self, filter: &RestaurantFilter) -> Result<u64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM restaurants WHERE {RESTAURANT_FILTER}");
        let (count,): (i64,) = bounded(self.query_timeout, async {
            Ok(sqlx::query_as(&sql)
                .bind(filter.center.latitude)
                .bind(filter.center.longitude)
                .bind(filter.radius_meters)
                .bind(filter.merchant_id.as_deref())
                .fetch_one(&self.pool)
                .await?)
        })
        .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl CategoryRepository for PgCatalogStore {
    async fn create(&self, category: &Category) -> Result<(), DatabaseError> {
        bounded(self.query_timeout, async {
            sqlx::query(
                "INSERT INTO categories (id, restaurant_id, name, description, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(category.id)
            .bind(category.restaurant_id)
            .bind(&category.name)
            .bind(&category.description)
            .bind(category.created_at)
            .bind(category.updated_at)
            .execute(&self.pool)
            .await?;
            Ok(())
        })
        .await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Category>, DatabaseError> {
        let row: Option<CategoryRow> = bounded(self.query_timeout, async {
            Ok(sqlx::query_as(
                "SELECT id, restaurant_id, name, description, created_at, updated_at \
                 FROM categories WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
        })
        .await?;
        Ok(row.map(Category::from))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), DatabaseError> {
        bounded(self.query_timeout, async {
            sqlx::query("DELETE FROM categories WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn delete_by_restaurant_id(&self, restaurant_id: Uuid) -> Result<(), DatabaseError> {
        bounded(self.query_timeout, async {
            sqlx::query("DELETE FROM categories WHERE restaurant_id = $1")
                .bind(restaurant_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ProductRepository for PgCatalogStore {
    /// Product row and variants commit together or not at all
    async fn create(&self, product: &Product) -> Result<(), DatabaseError> {
        bounded(self.query_timeout, async {
            let mut tx = self.pool.begin().await?;
            sqlx::query(
                "INSERT INTO products (id, restaurant_id, category_id, name, description, is_veg, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(product.id)
            .bind(product.restaurant_id)
            .bind(product.category_id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.is_veg)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&mut *tx)
            .await?;

            for variant in &product.variants {
                insert_variant(&mut *tx, variant).await?;
            }
            tx.commit().await?;
            Ok(())
        })
        .await
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Product>, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row: Option<ProductRow> = bounded(self.query_timeout, async {
            Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
        })
        .await?;

        match row {
            Some(row) => {
                let variants = self.variants_for(&[row.id]).await?;
                Ok(Some(row.into_product(variants)))
            }
            None => Ok(None),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), DatabaseError> {
        bounded(self.query_timeout, async {
            sqlx::query("DELETE FROM products WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn delete_by_restaurant_id(&self, restaurant_id: Uuid) -> Result<(), DatabaseError> {
        self.delete_products_where("restaurant_id", restaurant_id).await
    }

    async fn delete_by_category_id(&self, category_id: Uuid) -> Result<(), DatabaseError> {
        self.delete_products_where("category_id", category_id).await
    }

    async fn list_by_restaurant(&self, filter: &ProductFilter) -> Result<Vec<Product>, DatabaseError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE restaurant_id = $1 \
             ORDER BY created_at, id LIMIT $2 OFFSET $3"
        );
        let rows: Vec<ProductRow> = bounded(self.query_timeout, async {
            Ok(sqlx::query_as(&sql)
                .bind(filter.restaurant_id)
                .bind(to_i64(filter.page.page_size))
                .bind(to_i64(filter.page.offset()))
                .fetch_all(&self.pool)
                .await?)
        })
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut by_product: HashMap<Uuid, Vec<Variant>> = HashMap::new();
        for variant in self.variants_for(&ids).await? {
            by_product.entry(variant.product_id).or_default().push(variant);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let variants = by_product.remove(&row.id).unwrap_or_default();
                row.into_product(variants)
            })
            .collect())
    }

    async fn count_by_restaurant(&self, filter: &ProductFilter) -> Result<u64, DatabaseError> {
        let (count,): (i64,) = bounded(self.query_timeout, async {
            Ok(sqlx::query_as("SELECT COUNT(*) FROM products WHERE restaurant_id = $1")
                .bind(filter.restaurant_id)
                .fetch_one(&self.pool)
                .await?)
        })
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn create_variant(&self, variant: &Variant) -> Result<(), DatabaseError> {
        self.insert_variant(variant).await
    }

    async fn get_variant(&self, id: Uuid) -> Result<Option<Variant>, DatabaseError> {
        let sql = format!("SELECT {VARIANT_COLUMNS} FROM variants WHERE id = $1");
        let row: Option<VariantRow> = bounded(self.query_timeout, async {
            Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
        })
        .await?;
        Ok(row.map(Variant::from))
    }

    async fn delete_variant(&self, id: Uuid) -> Result<(), DatabaseError> {
        bounded(self.query_timeout, async {
            sqlx::query("DELETE FROM variants WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }

    async fn delete_variants_by_product_id(&self, product_id: Uuid) -> Result<(), DatabaseError> {
        bounded(self.query_timeout, async {
            sqlx::query("DELETE FROM variants WHERE product_id = $1")
                .bind(product_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl HealthRepository for PgCatalogStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        bounded(self.query_timeout, async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
        .await
    }
}
