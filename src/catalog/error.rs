use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::task_group::Cancelled;

/// Cross-entity consistency violations discovered mid-operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("Category does not belong to the restaurant")]
    CategoryNotInRestaurant,

    #[error("Variant is not part of the provided product")]
    VariantNotInProduct,

    #[error("Restaurant in open state cannot be deleted")]
    RestaurantOpen,
}

/// Failure taxonomy for every catalog operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("Invalid value for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Unable to find {0}")]
    NotFound(&'static str),

    #[error("Forbidden")]
    Forbidden,

    #[error(transparent)]
    Conflict(#[from] Conflict),

    #[error("Storage unavailable: {0}")]
    Upstream(String),
}

impl CatalogError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<DatabaseError> for CatalogError {
    fn from(err: DatabaseError) -> Self {
        tracing::error!("Storage gateway failure: {}", err);
        CatalogError::Upstream(err.to_string())
    }
}

impl From<Cancelled> for CatalogError {
    fn from(_: Cancelled) -> Self {
        CatalogError::Upstream("operation cancelled".to_string())
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
