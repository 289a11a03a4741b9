//! Inventory Store
//!
//! Dish quantities change only through a guarded conditional update:
//!
//! ```sql
//! UPDATE dish SET quantity = quantity + ?delta
//!  WHERE id = ?id AND quantity + ?delta >= 0 AND quantity <= ?max - ?delta
//! ```
//!
//! Check and write happen in one statement, so concurrent debits can never
//! drive a quantity below zero and restocks can never push it past
//! [`MAX_STOCK`]. Zero affected rows means the dish does not exist or the
//! adjustment crosses a bound; a follow-up existence probe tells them apart.

use shared::error::{AppError, ErrorCode};
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

/// Upper bound on the stock of one dish
///
/// SQLite turns integer overflow into REAL, so the bound is enforced
/// inside the guarded update rather than left to the column type.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// 库存调整错误
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("no such dish: {0}")]
    UnknownDish(i64),

    #[error("cannot subtract more portions of dish {0} than there is in stock")]
    OutOfStock(i64),

    #[error("dish {0} cannot hold more than {max} portions", max = MAX_STOCK)]
    StockLimit(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl InventoryError {
    /// Unknown dish and out-of-bounds adjustments are the caller's fault
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            Self::UnknownDish(_) | Self::OutOfStock(_) | Self::StockLimit(_)
        )
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::UnknownDish(id) => AppError::dish_not_found(id),
            InventoryError::OutOfStock(id) => AppError::out_of_stock(id),
            InventoryError::StockLimit(id) => {
                AppError::with_message(ErrorCode::ValueOutOfRange, err.to_string())
                    .with_detail("dish_id", id)
                    .with_detail("max", MAX_STOCK)
            }
            InventoryError::Database(e) => AppError::database(e.to_string()),
        }
    }
}

/// Where an adjustment runs
///
/// `Standalone` commits on its own; `InTransaction` joins the caller's
/// transaction and becomes visible only when that transaction commits.
pub enum StockConn<'a> {
    Standalone(&'a SqlitePool),
    InTransaction(&'a mut SqliteConnection),
}

/// Apply `delta` portions to a dish (negative = debit, positive = restock)
pub async fn adjust_quantity(
    conn: StockConn<'_>,
    dish_id: i64,
    delta: i64,
) -> Result<(), InventoryError> {
    match conn {
        StockConn::InTransaction(tx) => guarded_update(tx, dish_id, delta).await,
        StockConn::Standalone(pool) => {
            let mut conn = pool.acquire().await?;
            guarded_update(&mut *conn, dish_id, delta).await
        }
    }
}

async fn guarded_update(
    conn: &mut SqliteConnection,
    dish_id: i64,
    delta: i64,
) -> Result<(), InventoryError> {
    let result = sqlx::query(
        "UPDATE dish SET quantity = quantity + ?1 \
         WHERE id = ?2 AND quantity + ?1 >= 0 AND quantity <= ?3 - ?1",
    )
    .bind(delta)
    .bind(dish_id)
    .bind(MAX_STOCK)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        tracing::debug!(dish_id, delta, "Dish quantity adjusted");
        return Ok(());
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dish WHERE id = ?)")
        .bind(dish_id)
        .fetch_one(&mut *conn)
        .await?;
    match (exists, delta > 0) {
        (false, _) => Err(InventoryError::UnknownDish(dish_id)),
        (true, true) => Err(InventoryError::StockLimit(dish_id)),
        (true, false) => Err(InventoryError::OutOfStock(dish_id)),
    }
}

/// Restock a dish, independent of the order queue
pub async fn add_dish(pool: &SqlitePool, dish_id: i64, amount: i64) -> Result<(), InventoryError> {
    adjust_quantity(StockConn::Standalone(pool), dish_id, amount).await?;
    tracing::info!(dish_id, amount, "Dish restocked");
    Ok(())
}

/// Write off portions of a dish, independent of the order queue
pub async fn sub_dish(pool: &SqlitePool, dish_id: i64, amount: i64) -> Result<(), InventoryError> {
    adjust_quantity(StockConn::Standalone(pool), dish_id, -amount).await?;
    tracing::info!(dish_id, amount, "Dish portions written off");
    Ok(())
}

/// Current stock of a dish
pub async fn quantity_of(pool: &SqlitePool, dish_id: i64) -> Result<i64, InventoryError> {
    let quantity: Option<i64> = sqlx::query_scalar("SELECT quantity FROM dish WHERE id = ?")
        .bind(dish_id)
        .fetch_optional(pool)
        .await?;
    quantity.ok_or(InventoryError::UnknownDish(dish_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{dish, kind, test_db};
    use shared::models::{DishCreate, DishKindCreate};

    async fn seed_dish(pool: &SqlitePool, quantity: i64) -> i64 {
        let kind = kind::create(pool, DishKindCreate { repr: "Soup".into(), price: 100 })
            .await
            .unwrap();
        dish::create(
            pool,
            DishCreate {
                name: "Borscht".into(),
                description: "beetroot soup".into(),
                quantity,
                kind: kind.id,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_add_then_sub_past_stock() {
        let (_dir, pool) = test_db().await;
        let a = seed_dish(&pool, 0).await;

        add_dish(&pool, a, 10).await.unwrap();
        sub_dish(&pool, a, 4).await.unwrap();
        let err = sub_dish(&pool, a, 10).await.unwrap_err();

        assert!(matches!(err, InventoryError::OutOfStock(id) if id == a));
        assert!(err.is_client_fault());
        assert_eq!(quantity_of(&pool, a).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_debit_to_exactly_zero() {
        let (_dir, pool) = test_db().await;
        let a = seed_dish(&pool, 3).await;

        sub_dish(&pool, a, 3).await.unwrap();
        assert_eq!(quantity_of(&pool, a).await.unwrap(), 0);
        assert!(matches!(
            sub_dish(&pool, a, 1).await,
            Err(InventoryError::OutOfStock(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_dish_for_both_directions() {
        let (_dir, pool) = test_db().await;
        assert!(matches!(
            add_dish(&pool, 99999, 5).await,
            Err(InventoryError::UnknownDish(99999))
        ));
        assert!(matches!(
            sub_dish(&pool, 99999, 5).await,
            Err(InventoryError::UnknownDish(99999))
        ));
    }

    #[tokio::test]
    async fn test_in_transaction_follows_rollback() {
        let (_dir, pool) = test_db().await;
        let a = seed_dish(&pool, 5).await;

        let mut tx = pool.begin().await.unwrap();
        adjust_quantity(StockConn::InTransaction(&mut *tx), a, -2)
            .await
            .unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(quantity_of(&pool, a).await.unwrap(), 5);

        let mut tx = pool.begin().await.unwrap();
        adjust_quantity(StockConn::InTransaction(&mut *tx), a, -2)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        assert_eq!(quantity_of(&pool, a).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_restock_past_limit_is_rejected() {
        let (_dir, pool) = test_db().await;
        let a = seed_dish(&pool, 5).await;

        let err = add_dish(&pool, a, i64::MAX).await.unwrap_err();
        assert!(matches!(err, InventoryError::StockLimit(id) if id == a));
        assert!(err.is_client_fault());

        let stored_type: String = sqlx::query_scalar("SELECT typeof(quantity) FROM dish WHERE id = ?")
            .bind(a)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored_type, "integer");
        assert_eq!(quantity_of(&pool, a).await.unwrap(), 5);

        add_dish(&pool, a, MAX_STOCK - 5).await.unwrap();
        assert_eq!(quantity_of(&pool, a).await.unwrap(), MAX_STOCK);
        assert!(matches!(
            add_dish(&pool, a, 1).await,
            Err(InventoryError::StockLimit(_))
        ));

        // 上限处仍可正常扣减
        sub_dish(&pool, a, MAX_STOCK).await.unwrap();
        assert_eq!(quantity_of(&pool, a).await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_direct_debits_never_oversell() {
        let (_dir, pool) = test_db().await;
        let a = seed_dish(&pool, 10).await;

        let handles: Vec<_> = (0..25)
            .map(|_| {
                let pool = pool.clone();
                tokio::spawn(async move { sub_dish(&pool, a, 1).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(InventoryError::OutOfStock(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(ok, 10);
        assert_eq!(quantity_of(&pool, a).await.unwrap(), 0);
    }
}
