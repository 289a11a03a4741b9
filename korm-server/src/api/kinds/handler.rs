//! Dish Kind API Handlers

use axum::{Json, extract::State};

use crate::catalog;
use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NAME_LEN, validate_non_negative, validate_required_text};
use shared::models::{DishKind, DishKindCreate};

/// GET /api/kinds - 获取所有品类
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<DishKind>>> {
    Ok(Json(catalog::list_kinds(&state.pool).await?))
}

/// POST /api/kinds - 创建品类
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DishKindCreate>,
) -> AppResult<Json<DishKind>> {
    validate_required_text(&payload.repr, "repr", MAX_NAME_LEN)?;
    validate_non_negative(payload.price, "price")?;
    Ok(Json(catalog::create_kind(&state.pool, payload).await?))
}
