pub mod manager;
pub mod memory;
pub mod postgres;
pub mod repository;

use std::future::Future;
use std::time::Duration;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use postgres::PgCatalogStore;
pub use repository::{CategoryRepository, HealthRepository, ProductRepository, RestaurantRepository};

/// Run one storage call under its own deadline, independent of the request deadline
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, DatabaseError>
where
    F: Future<Output = Result<T, DatabaseError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DatabaseError::Timeout(limit)),
    }
}
