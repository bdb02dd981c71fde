pub mod category;
pub mod error;
pub mod pagination;
pub mod product;
pub mod restaurant;
pub mod validate;

pub use category::{Category, NewCategory};
pub use error::{CatalogError, CatalogResult, Conflict};
pub use pagination::{PageQuery, PageRequest, Paginated};
pub use product::{NewProduct, NewVariant, Price, Product, ProductFilter, Variant};
pub use restaurant::{
    Address, GeoPoint, ListRestaurantsQuery, NewRestaurant, Restaurant, RestaurantFilter,
    RestaurantStatus, StatusChange,
};
