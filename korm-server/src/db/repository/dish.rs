//! Dish Repository (catalog side)
//!
//! Quantity changes go through [`crate::inventory`], never through here.

use super::{RepoError, RepoResult};
use crate::inventory::MAX_STOCK;
use shared::models::{Dish, DishCreate};
use sqlx::SqlitePool;

const DISH_COLUMNS: &str = "id, name, description, quantity, kind";

/// All dishes, grouped by kind then by id
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Dish>> {
    let dishes = sqlx::query_as::<_, Dish>(&format!(
        "SELECT {DISH_COLUMNS} FROM dish ORDER BY kind, id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(dishes)
}

pub async fn find_by_kind(pool: &SqlitePool, kind: i64) -> RepoResult<Vec<Dish>> {
    let dishes = sqlx::query_as::<_, Dish>(&format!(
        "SELECT {DISH_COLUMNS} FROM dish WHERE kind = ? ORDER BY id"
    ))
    .bind(kind)
    .fetch_all(pool)
    .await?;
    Ok(dishes)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Dish>> {
    let dish = sqlx::query_as::<_, Dish>(&format!(
        "SELECT {DISH_COLUMNS} FROM dish WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(dish)
}

pub async fn create(pool: &SqlitePool, data: DishCreate) -> RepoResult<Dish> {
    if !(0..=MAX_STOCK).contains(&data.quantity) {
        return Err(RepoError::Validation(format!(
            "quantity must be between 0 and {MAX_STOCK}"
        )));
    }
    let kind_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM dish_kind WHERE id = ?)")
        .bind(data.kind)
        .fetch_one(pool)
        .await?;
    if !kind_exists {
        return Err(RepoError::NotFound(format!("Dish kind {} not found", data.kind)));
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO dish (name, description, quantity, kind) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&data.name)
    .bind(&data.description)
    .bind(data.quantity)
    .bind(data.kind)
    .fetch_one(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create dish".into()))
}

/// Delete a dish; rejected while past order items still reference it
pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let result = sqlx::query("DELETE FROM dish WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| match RepoError::from(e) {
            RepoError::InUse(_) => {
                RepoError::InUse(format!("Dish {id} is referenced by recorded orders"))
            }
            other => other,
        })?;
    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Dish {id} not found")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{kind, test_db};
    use shared::models::DishKindCreate;

    async fn seed_kind(pool: &SqlitePool, repr: &str) -> i64 {
        kind::create(pool, DishKindCreate { repr: repr.into(), price: 100 })
            .await
            .unwrap()
            .id
    }

    fn dish(name: &str, kind: i64, quantity: i64) -> DishCreate {
        DishCreate {
            name: name.into(),
            description: String::new(),
            quantity,
            kind,
        }
    }

    #[tokio::test]
    async fn test_find_all_groups_by_kind() {
        let (_dir, pool) = test_db().await;
        let soups = seed_kind(&pool, "Soup").await;
        let mains = seed_kind(&pool, "Main").await;

        let steak = create(&pool, dish("Steak", mains, 3)).await.unwrap();
        let borscht = create(&pool, dish("Borscht", soups, 5)).await.unwrap();
        let ukha = create(&pool, dish("Ukha", soups, 0)).await.unwrap();

        let all = find_all(&pool).await.unwrap();
        let names: Vec<_> = all.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Borscht", "Ukha", "Steak"]);

        let only_soups = find_by_kind(&pool, soups).await.unwrap();
        assert_eq!(only_soups, vec![borscht, ukha]);
        assert_eq!(find_by_id(&pool, steak.id).await.unwrap(), Some(steak));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_kind_and_bad_stock() {
        let (_dir, pool) = test_db().await;
        assert!(matches!(
            create(&pool, dish("Ghost", 42, 1)).await,
            Err(RepoError::NotFound(_))
        ));

        let soups = seed_kind(&pool, "Soup").await;
        assert!(matches!(
            create(&pool, dish("Borscht", soups, -1)).await,
            Err(RepoError::Validation(_))
        ));
        assert!(matches!(
            create(&pool, dish("Borscht", soups, i64::MAX)).await,
            Err(RepoError::Validation(_))
        ));
        assert!(find_all(&pool).await.unwrap().is_empty());

        let full = create(&pool, dish("Borscht", soups, MAX_STOCK)).await.unwrap();
        assert_eq!(full.quantity, MAX_STOCK);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, pool) = test_db().await;
        let soups = seed_kind(&pool, "Soup").await;
        let borscht = create(&pool, dish("Borscht", soups, 5)).await.unwrap();

        delete(&pool, borscht.id).await.unwrap();
        assert_eq!(find_by_id(&pool, borscht.id).await.unwrap(), None);
        assert!(matches!(
            delete(&pool, borscht.id).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_rejected_when_ordered() {
        let (_dir, pool) = test_db().await;
        let soups = seed_kind(&pool, "Soup").await;
        let borscht = create(&pool, dish("Borscht", soups, 5)).await.unwrap();
        let order = crate::orders::CheckedOrder::new(shared::models::OrderRequest {
            buyer_id: 1,
            items: vec![shared::models::OrderItem::new(borscht.id, 1)],
        })
        .unwrap();
        crate::orders::ledger::place_order(&pool, &order).await.unwrap();

        assert!(matches!(
            delete(&pool, borscht.id).await,
            Err(RepoError::InUse(_))
        ));
        assert!(find_by_id(&pool, borscht.id).await.unwrap().is_some());
    }
}
