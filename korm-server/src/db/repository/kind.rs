//! Dish Kind Repository

use super::{RepoError, RepoResult};
use shared::models::{DishKind, DishKindCreate};
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<DishKind>> {
    let kinds = sqlx::query_as::<_, DishKind>("SELECT id, repr, price FROM dish_kind ORDER BY id")
        .fetch_all(pool)
        .await?;
    Ok(kinds)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<DishKind>> {
    let kind =
        sqlx::query_as::<_, DishKind>("SELECT id, repr, price FROM dish_kind WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(kind)
}

pub async fn create(pool: &SqlitePool, data: DishKindCreate) -> RepoResult<DishKind> {
    let id: i64 =
        sqlx::query_scalar("INSERT INTO dish_kind (repr, price) VALUES (?, ?) RETURNING id")
            .bind(&data.repr)
            .bind(data.price)
            .fetch_one(pool)
            .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create dish kind".into()))
}
