//! Dish API Handlers

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentAdmin;
use crate::catalog;
use crate::core::ServerState;
use crate::inventory;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_non_negative, validate_positive, validate_required_text,
    validate_text,
};
use crate::utils::AppResult;
use shared::models::{Dish, DishCreate, StockAdjust};

#[derive(Debug, Deserialize)]
pub struct DishQuery {
    pub kind: Option<i64>,
}

/// GET /api/dishes - 获取菜品 (可按品类过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<DishQuery>,
) -> AppResult<Json<Vec<Dish>>> {
    let dishes = catalog::list_dishes(&state.pool, query.kind).await?;
    Ok(Json(dishes))
}

/// GET /api/dishes/:id - 获取单个菜品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Dish>> {
    Ok(Json(catalog::get_dish(&state.pool, id).await?))
}

/// POST /api/dishes - 创建菜品
pub async fn create(
    State(state): State<ServerState>,
    Extension(admin): Extension<CurrentAdmin>,
    Json(payload): Json<DishCreate>,
) -> AppResult<Json<Dish>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_non_negative(payload.quantity, "quantity")?;

    let dish = catalog::create_dish(&state.pool, payload).await?;
    tracing::info!(admin = %admin.username, dish_id = dish.id, "Dish created via API");
    Ok(Json(dish))
}

/// DELETE /api/dishes/:id - 删除菜品 (已被订单引用时拒绝)
pub async fn delete(
    State(state): State<ServerState>,
    Extension(admin): Extension<CurrentAdmin>,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    catalog::delete_dish(&state.pool, id).await?;
    tracing::info!(admin = %admin.username, dish_id = id, "Dish deleted via API");
    Ok(Json(true))
}

/// POST /api/dishes/:id/add - 补货
pub async fn add(
    State(state): State<ServerState>,
    Extension(admin): Extension<CurrentAdmin>,
    Path(id): Path<i64>,
    Json(payload): Json<StockAdjust>,
) -> AppResult<Json<Dish>> {
    validate_positive(payload.delta, "delta")?;
    inventory::add_dish(&state.pool, id, payload.delta).await?;
    tracing::info!(admin = %admin.username, dish_id = id, delta = payload.delta, "Stock added");
    Ok(Json(catalog::get_dish(&state.pool, id).await?))
}

/// POST /api/dishes/:id/sub - 核销 (库存不足时拒绝，不做部分扣减)
pub async fn sub(
    State(state): State<ServerState>,
    Extension(admin): Extension<CurrentAdmin>,
    Path(id): Path<i64>,
    Json(payload): Json<StockAdjust>,
) -> AppResult<Json<Dish>> {
    validate_positive(payload.delta, "delta")?;
    inventory::sub_dish(&state.pool, id, payload.delta).await?;
    tracing::info!(admin = %admin.username, dish_id = id, delta = payload.delta, "Stock written off");
    Ok(Json(catalog::get_dish(&state.pool, id).await?))
}
