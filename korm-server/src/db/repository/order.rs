//! Order Repository (read side)
//!
//! Orders are written only by [`crate::orders::ledger`].

use super::RepoResult;
use shared::models::{Order, OrderHeader, OrderItem};
use sqlx::SqlitePool;

async fn items_of(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT dish_id, quantity FROM order_item WHERE order_id = ? ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let header = sqlx::query_as::<_, OrderHeader>(
        "SELECT id, buyer_id, ordered_at FROM orders WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    let Some(header) = header else {
        return Ok(None);
    };
    let items = items_of(pool, header.id).await?;
    Ok(Some(Order {
        id: header.id,
        buyer_id: header.buyer_id,
        ordered_at: header.ordered_at,
        items,
    }))
}

/// Orders of one buyer, newest first
pub async fn find_by_buyer(pool: &SqlitePool, buyer_id: i64) -> RepoResult<Vec<Order>> {
    let headers = sqlx::query_as::<_, OrderHeader>(
        "SELECT id, buyer_id, ordered_at FROM orders WHERE buyer_id = ? ORDER BY id DESC",
    )
    .bind(buyer_id)
    .fetch_all(pool)
    .await?;

    let mut orders = Vec::with_capacity(headers.len());
    for header in headers {
        let items = items_of(pool, header.id).await?;
        orders.push(Order {
            id: header.id,
            buyer_id: header.buyer_id,
            ordered_at: header.ordered_at,
            items,
        });
    }
    Ok(orders)
}

/// Order header count, used by tests and health output
pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;
    Ok(n)
}
