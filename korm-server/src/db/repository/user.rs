//! Chat User Repository
//!
//! One row per person, keyed by the platform-side id in `tg_id` / `vk_id`.

use super::{RepoError, RepoResult};
use shared::models::{ChatUser, Platform, User};
use sqlx::SqlitePool;

fn id_column(platform: Platform) -> &'static str {
    match platform {
        Platform::Telegram => "tg_id",
        Platform::Vk => "vk_id",
    }
}

/// Look up the uid of a platform user, `None` if never seen
pub async fn find_uid(pool: &SqlitePool, platform: Platform, external_id: i64) -> RepoResult<Option<i64>> {
    let uid: Option<i64> = sqlx::query_scalar(&format!(
        "SELECT id FROM users WHERE {} = ?",
        id_column(platform)
    ))
    .bind(external_id)
    .fetch_optional(pool)
    .await?;
    tracing::debug!(%platform, external_id, found = uid.is_some(), "Checked chat user");
    Ok(uid)
}

pub async fn find_by_id(pool: &SqlitePool, uid: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, tg_id, vk_id, first_name, last_name FROM users WHERE id = ?",
    )
    .bind(uid)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

/// Register a platform user, returns the new uid
pub async fn register(pool: &SqlitePool, platform: Platform, user: &ChatUser) -> RepoResult<i64> {
    let uid: i64 = sqlx::query_scalar(&format!(
        "INSERT INTO users ({}, first_name, last_name) VALUES (?, ?, ?) RETURNING id",
        id_column(platform)
    ))
    .bind(user.external_id)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .fetch_one(pool)
    .await?;
    tracing::debug!(%platform, uid, "Added chat user");
    Ok(uid)
}

/// Find or register; the flag is `true` when the user was just created
pub async fn ensure(pool: &SqlitePool, platform: Platform, user: &ChatUser) -> RepoResult<(i64, bool)> {
    if let Some(uid) = find_uid(pool, platform, user.external_id).await? {
        return Ok((uid, false));
    }
    match register(pool, platform, user).await {
        Ok(uid) => Ok((uid, true)),
        // 并发注册同一用户：另一请求已插入
        Err(RepoError::Duplicate(_)) => find_uid(pool, platform, user.external_id)
            .await?
            .map(|uid| (uid, false))
            .ok_or_else(|| RepoError::Database("User vanished after duplicate insert".into())),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_db;

    fn ivan() -> ChatUser {
        ChatUser {
            external_id: 1001,
            first_name: "Ivan".into(),
            last_name: "Petrov".into(),
        }
    }

    #[tokio::test]
    async fn test_register_and_find() {
        let (_dir, pool) = test_db().await;
        assert_eq!(find_uid(&pool, Platform::Telegram, 1001).await.unwrap(), None);

        let uid = register(&pool, Platform::Telegram, &ivan()).await.unwrap();
        assert_eq!(find_uid(&pool, Platform::Telegram, 1001).await.unwrap(), Some(uid));
        // 同一数字在另一平台是另一个人
        assert_eq!(find_uid(&pool, Platform::Vk, 1001).await.unwrap(), None);

        let user = find_by_id(&pool, uid).await.unwrap().unwrap();
        assert_eq!(user.tg_id, Some(1001));
        assert_eq!(user.vk_id, None);
        assert_eq!(user.first_name, "Ivan");
    }

    #[tokio::test]
    async fn test_ensure_is_stable() {
        let (_dir, pool) = test_db().await;
        let (uid, created) = ensure(&pool, Platform::Vk, &ivan()).await.unwrap();
        assert!(created);
        let (again, created) = ensure(&pool, Platform::Vk, &ivan()).await.unwrap();
        assert!(!created);
        assert_eq!(uid, again);
    }
}
