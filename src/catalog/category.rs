use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::CatalogResult;
use super::validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub restaurant_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewCategory {
    pub fn validate(&self) -> CatalogResult<()> {
        validate::required("name", &self.name)?;
        validate::length("name", &self.name, 2, 30)?;
        validate::max_length("description", &self.description, 120)
    }

    pub fn into_category(self, now: DateTime<Utc>) -> Category {
        Category {
            id: Uuid::new_v4(),
            restaurant_id: self.restaurant_id,
            name: self.name,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}
