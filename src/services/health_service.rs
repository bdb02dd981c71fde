use std::sync::Arc;

use crate::catalog::CatalogResult;
use crate::database::HealthRepository;

#[derive(Clone)]
pub struct HealthService {
    store: Arc<dyn HealthRepository>,
}

impl HealthService {
    pub fn new(store: Arc<dyn HealthRepository>) -> Self {
        Self { store }
    }

    /// Succeeds when the storage gateway answers
    pub async fn check(&self) -> CatalogResult<()> {
        self.store.ping().await?;
        Ok(())
    }
}
