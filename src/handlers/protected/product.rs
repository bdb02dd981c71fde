use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::acl::Identity;
use crate::catalog::{NewProduct, NewVariant, PageQuery, Paginated, Product, Variant};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// POST /v1/catalog/products
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<Product> {
    let Json(new) = payload?;
    let product = state.services.products.create(&identity, new).await?;
    Ok(ApiResponse::created(product))
}

/// GET /v1/catalog/products/:product_id
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Product> {
    let Path(id) = id?;
    let product = state.services.products.get_by_id(&identity, id).await?;
    Ok(ApiResponse::success(product))
}

/// DELETE /v1/catalog/products/:product_id
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    state.services.products.delete_by_id(&identity, id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /v1/catalog/restaurants/:restaurant_id/products
pub async fn list_by_restaurant(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    restaurant_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Paginated<Product>> {
    let Path(restaurant_id) = restaurant_id?;
    let Query(query) = query?;
    let page = state
        .services
        .products
        .list_by_restaurant(&identity, restaurant_id, query)
        .await?;
    Ok(ApiResponse::success(page))
}

/// POST /v1/catalog/products/:product_id/variants
pub async fn add_variant(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    product_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<NewVariant>, JsonRejection>,
) -> ApiResult<Variant> {
    let Path(product_id) = product_id?;
    let Json(new) = payload?;
    let variant = state
        .services
        .products
        .add_variant(&identity, product_id, new)
        .await?;
    Ok(ApiResponse::created(variant))
}

/// DELETE /v1/catalog/products/:product_id/variants/:variant_id
pub async fn remove_variant(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<()> {
    let Path((product_id, variant_id)) = ids?;
    state
        .services
        .products
        .remove_variant(&identity, product_id, variant_id)
        .await?;
    Ok(ApiResponse::no_content())
}
