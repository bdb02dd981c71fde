use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::acl::Identity;
use crate::catalog::{ListRestaurantsQuery, NewRestaurant, Paginated, Restaurant, StatusChange};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// POST /v1/catalog/restaurants
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<NewRestaurant>, JsonRejection>,
) -> ApiResult<Restaurant> {
    let Json(new) = payload?;
    let restaurant = state.services.restaurants.create(&identity, new).await?;
    Ok(ApiResponse::created(restaurant))
}

/// GET /v1/catalog/restaurants?latitude&longitude[&merchant_id][&page_number][&page_size]
pub async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<ListRestaurantsQuery>, QueryRejection>,
) -> ApiResult<Paginated<Restaurant>> {
    let Query(query) = query?;
    let page = state.services.restaurants.list(&identity, query).await?;
    Ok(ApiResponse::success(page))
}

/// GET /v1/catalog/restaurants/:restaurant_id
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Restaurant> {
    let Path(id) = id?;
    let restaurant = state.services.restaurants.get_by_id(&identity, id).await?;
    Ok(ApiResponse::success(restaurant))
}

/// PUT /v1/catalog/restaurants/:restaurant_id/status
pub async fn set_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusChange>, JsonRejection>,
) -> ApiResult<Restaurant> {
    let Path(id) = id?;
    let Json(change) = payload?;
    let restaurant = state
        .services
        .restaurants
        .set_status(&identity, id, change.status)
        .await?;
    Ok(ApiResponse::success(restaurant))
}

/// DELETE /v1/catalog/restaurants/:restaurant_id
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    state.services.restaurants.delete_by_id(&identity, id).await?;
    Ok(ApiResponse::no_content())
}
