//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::core::ServerState;
use crate::db::repository::order;
use crate::orders::CheckedOrder;
use crate::utils::{AppError, AppResult, ErrorCode};
use shared::models::{Order, OrderOutcome, OrderRequest};

/// POST /api/orders - 登记订单
///
/// 请求先校验 (空订单、非正数量 → 400)，再进入订单队列。
/// 队列结果映射为 [`OrderOutcome`]：
///
/// | 结果 | HTTP |
/// |------|------|
/// | ok | 200 |
/// | unknown_dish | 404 |
/// | out_of_stock | 409 |
/// | internal_error | 500 / 503 |
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<OrderRequest>,
) -> AppResult<(StatusCode, Json<OrderOutcome>)> {
    let order = CheckedOrder::new(payload)?;
    let buyer_id = order.buyer_id();

    match state.orders.register_order(order).await {
        Ok(order_id) => Ok((StatusCode::OK, Json(OrderOutcome::Ok { order_id }))),
        Err(e) => {
            if e.is_client_fault() {
                tracing::debug!(buyer_id, error = %e, "Order rejected");
            } else {
                tracing::error!(buyer_id, error = %e, "Order registration failed");
            }
            Ok((e.code().http_status(), Json(e.to_outcome())))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuyerQuery {
    pub buyer_id: i64,
}

/// GET /api/orders?buyer_id= - 某用户的订单 (新的在前)
pub async fn list_by_buyer(
    State(state): State<ServerState>,
    Query(query): Query<BuyerQuery>,
) -> AppResult<Json<Vec<Order>>> {
    Ok(Json(order::find_by_buyer(&state.pool, query.buyer_id).await?))
}

/// GET /api/orders/:id - 订单详情
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    let found = order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound).with_detail("order_id", id))?;
    Ok(Json(found))
}
