//! Order Ledger
//!
//! 订单头、订单项与库存扣减在同一个事务中完成：任一项失败则整单回滚，
//! 不会留下部分写入的订单。

use super::{CheckedOrder, OrderError};
use crate::inventory::{self, StockConn};
use shared::util::now_millis;
use sqlx::{SqliteConnection, SqlitePool};

/// Record an order and debit its dishes atomically, returning the order id
///
/// Line items are applied in request order, one guarded debit each. Repeated
/// dish ids are not merged; each debit sees the ones before it.
pub async fn place_order(pool: &SqlitePool, order: &CheckedOrder) -> Result<i64, OrderError> {
    let mut tx = pool.begin().await?;

    match write_order(&mut *tx, order).await {
        Ok(order_id) => {
            tx.commit().await?;
            tracing::info!(
                order_id,
                buyer_id = order.buyer_id(),
                items = order.items().len(),
                "Order successfully made"
            );
            Ok(order_id)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "Failed to roll back order transaction");
            }
            if e.is_client_fault() {
                tracing::debug!(buyer_id = order.buyer_id(), error = %e, "Order rejected");
            } else {
                tracing::error!(buyer_id = order.buyer_id(), error = %e, "Order failed");
            }
            Err(e)
        }
    }
}

async fn write_order(tx: &mut SqliteConnection, order: &CheckedOrder) -> Result<i64, OrderError> {
    let order_id: i64 =
        sqlx::query_scalar("INSERT INTO orders (buyer_id, ordered_at) VALUES (?, ?) RETURNING id")
            .bind(order.buyer_id())
            .bind(now_millis())
            .fetch_one(&mut *tx)
            .await?;

    for item in order.items() {
        inventory::adjust_quantity(
            StockConn::InTransaction(&mut *tx),
            item.dish_id,
            -item.quantity,
        )
        .await?;

        sqlx::query("INSERT INTO order_item (order_id, dish_id, quantity) VALUES (?, ?, ?)")
            .bind(order_id)
            .bind(item.dish_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
    }

    Ok(order_id)
}
