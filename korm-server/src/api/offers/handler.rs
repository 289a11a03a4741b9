//! Offer API Handlers

use axum::{Json, extract::State};

use crate::core::ServerState;
use crate::db::repository::{RepoError, offer};
use crate::utils::validation::{
    MAX_NOTE_LEN, validate_non_negative, validate_positive, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{Offer, OfferCreate};
use shared::util::now_millis;

/// GET /api/offers - 未过期的优惠
pub async fn list_active(State(state): State<ServerState>) -> AppResult<Json<Vec<Offer>>> {
    Ok(Json(offer::find_active(&state.pool, now_millis()).await?))
}

/// POST /api/offers - 创建优惠 (含组成项)
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<OfferCreate>,
) -> AppResult<Json<i64>> {
    validate_required_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_non_negative(payload.price, "price")?;
    if payload.expires <= now_millis() {
        return Err(AppError::validation("expires must be in the future"));
    }
    for item in &payload.items {
        validate_positive(item.quantity, "quantity")?;
    }

    let id = offer::create(
        &state.pool,
        &payload.description,
        payload.price,
        payload.expires,
        &payload.items,
    )
    .await
    .map_err(|e| match e {
        // offer_item.kind 外键
        RepoError::InUse(_) => AppError::new(ErrorCode::DishKindNotFound),
        RepoError::Duplicate(_) => AppError::validation("offer lists the same kind twice"),
        other => other.into(),
    })?;
    tracing::info!(offer_id = id, "Offer created");
    Ok(Json(id))
}
