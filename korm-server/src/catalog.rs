//! Dish Catalog
//!
//! 菜品与品类的只读查询 (机器人菜单与管理后台共用)，以及管理端的新增/删除。
//! 库存数量只经由 [`crate::inventory`] 修改。

use shared::error::{AppError, ErrorCode};
use shared::models::{Dish, DishCreate, DishKind, DishKindCreate};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::repository::{RepoError, dish, kind};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no such dish: {0}")]
    UnknownDish(i64),

    #[error("no such dish kind: {0}")]
    UnknownKind(i64),

    #[error("dish {0} is referenced by recorded orders")]
    DishInUse(i64),

    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownDish(id) => AppError::dish_not_found(id),
            CatalogError::UnknownKind(id) => {
                AppError::new(ErrorCode::DishKindNotFound).with_detail("kind", id)
            }
            CatalogError::DishInUse(id) => {
                AppError::new(ErrorCode::DishInUse).with_detail("dish_id", id)
            }
            CatalogError::Invalid(msg) => AppError::validation(msg),
            CatalogError::Repo(e) => e.into(),
        }
    }
}

/// All dishes ordered by kind id, then dish id; optionally one kind only
pub async fn list_dishes(pool: &SqlitePool, kind: Option<i64>) -> Result<Vec<Dish>, CatalogError> {
    let dishes = match kind {
        Some(kind) => dish::find_by_kind(pool, kind).await?,
        None => dish::find_all(pool).await?,
    };
    Ok(dishes)
}

pub async fn get_dish(pool: &SqlitePool, id: i64) -> Result<Dish, CatalogError> {
    dish::find_by_id(pool, id)
        .await?
        .ok_or(CatalogError::UnknownDish(id))
}

/// All dish kinds ordered by id
pub async fn list_kinds(pool: &SqlitePool) -> Result<Vec<DishKind>, CatalogError> {
    Ok(kind::find_all(pool).await?)
}

pub async fn create_dish(pool: &SqlitePool, data: DishCreate) -> Result<Dish, CatalogError> {
    let kind = data.kind;
    let created = dish::create(pool, data).await.map_err(|e| match e {
        RepoError::NotFound(_) => CatalogError::UnknownKind(kind),
        RepoError::Validation(msg) => CatalogError::Invalid(msg),
        other => other.into(),
    })?;
    tracing::info!(dish_id = created.id, name = %created.name, kind, "Dish created");
    Ok(created)
}

pub async fn delete_dish(pool: &SqlitePool, id: i64) -> Result<(), CatalogError> {
    dish::delete(pool, id).await.map_err(|e| match e {
        RepoError::NotFound(_) => CatalogError::UnknownDish(id),
        RepoError::InUse(_) => CatalogError::DishInUse(id),
        other => other.into(),
    })?;
    tracing::info!(dish_id = id, "Dish deleted");
    Ok(())
}

pub async fn create_kind(pool: &SqlitePool, data: DishKindCreate) -> Result<DishKind, CatalogError> {
    if data.price < 0 {
        return Err(CatalogError::Invalid("price must not be negative".into()));
    }
    let created = kind::create(pool, data).await?;
    tracing::info!(kind = created.id, repr = %created.repr, "Dish kind created");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_db;

    async fn seed(pool: &SqlitePool) -> (DishKind, DishKind) {
        let soup = create_kind(pool, DishKindCreate { repr: "Soup".into(), price: 150 })
            .await
            .unwrap();
        let drink = create_kind(pool, DishKindCreate { repr: "Drink".into(), price: 50 })
            .await
            .unwrap();
        for (name, k) in [("Kvass", drink.id), ("Borscht", soup.id), ("Shchi", soup.id)] {
            create_dish(
                pool,
                DishCreate {
                    name: name.into(),
                    description: String::new(),
                    quantity: 3,
                    kind: k,
                },
            )
            .await
            .unwrap();
        }
        (soup, drink)
    }

    #[tokio::test]
    async fn test_list_is_ordered_and_filterable() {
        let (_dir, pool) = test_db().await;
        let (soup, drink) = seed(&pool).await;

        let all = list_dishes(&pool, None).await.unwrap();
        let names: Vec<_> = all.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["Borscht", "Shchi", "Kvass"]);

        let drinks = list_dishes(&pool, Some(drink.id)).await.unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].kind, drink.id);

        let kinds = list_kinds(&pool).await.unwrap();
        assert_eq!(kinds, vec![soup, drink]);
    }

    #[tokio::test]
    async fn test_list_is_repeatable() {
        let (_dir, pool) = test_db().await;
        seed(&pool).await;
        let first = list_dishes(&pool, None).await.unwrap();
        let second = list_dishes(&pool, None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_unknown_dish() {
        let (_dir, pool) = test_db().await;
        assert!(matches!(
            get_dish(&pool, 99999).await,
            Err(CatalogError::UnknownDish(99999))
        ));
        let err: AppError = CatalogError::UnknownDish(99999).into();
        assert_eq!(err.code, ErrorCode::DishNotFound);
    }

    #[tokio::test]
    async fn test_create_dish_with_unknown_kind() {
        let (_dir, pool) = test_db().await;
        let err = create_dish(
            &pool,
            DishCreate {
                name: "Ghost".into(),
                description: String::new(),
                quantity: 1,
                kind: 42,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownKind(42)));
    }

    #[tokio::test]
    async fn test_delete_dish() {
        let (_dir, pool) = test_db().await;
        seed(&pool).await;
        let first = list_dishes(&pool, None).await.unwrap()[0].id;

        delete_dish(&pool, first).await.unwrap();
        assert!(matches!(
            delete_dish(&pool, first).await,
            Err(CatalogError::UnknownDish(_))
        ));
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let (_dir, pool) = test_db().await;
        assert!(matches!(
            create_kind(&pool, DishKindCreate { repr: "Free".into(), price: -1 }).await,
            Err(CatalogError::Invalid(_))
        ));
    }
}
