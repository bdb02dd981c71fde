use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::{Extension, Json};
use uuid::Uuid;

use crate::acl::Identity;
use crate::catalog::{Category, NewCategory};
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;

/// POST /v1/catalog/categories
pub async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> ApiResult<Category> {
    let Json(new) = payload?;
    let category = state.services.categories.create(&identity, new).await?;
    Ok(ApiResponse::created(category))
}

/// GET /v1/catalog/categories/:category_id
pub async fn get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Category> {
    let Path(id) = id?;
    let category = state.services.categories.get_by_id(&identity, id).await?;
    Ok(ApiResponse::success(category))
}

/// DELETE /v1/catalog/categories/:category_id
pub async fn delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    let Path(id) = id?;
    state.services.categories.delete_by_id(&identity, id).await?;
    Ok(ApiResponse::no_content())
}
