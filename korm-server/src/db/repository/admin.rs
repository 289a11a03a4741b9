//! Admin Repository
//!
//! Admin panel accounts. Passwords are stored as argon2 PHC strings.

use super::{RepoError, RepoResult};
use sqlx::SqlitePool;

/// Hash password using argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(password_hash.to_string())
}

/// Verify password against a stored argon2 hash
pub fn verify_password(hash: &str, password: &str) -> Result<bool, argon2::password_hash::Error> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHash, PasswordVerifier},
    };

    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn create(pool: &SqlitePool, username: &str, password: &str, name: &str) -> RepoResult<()> {
    let hash = hash_password(password)
        .map_err(|e| RepoError::Database(format!("Failed to hash password: {e}")))?;
    sqlx::query("INSERT INTO admin (username, pass_hash, name) VALUES (?, ?, ?)")
        .bind(username)
        .bind(hash)
        .bind(name)
        .execute(pool)
        .await?;
    tracing::info!(username = %username, "Admin account created");
    Ok(())
}

/// Check admin credentials
///
/// Returns `Ok(false)` both for an unknown username and for a wrong password.
pub async fn check(pool: &SqlitePool, username: &str, password: &str) -> RepoResult<bool> {
    let hash: Option<String> = sqlx::query_scalar("SELECT pass_hash FROM admin WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    let Some(hash) = hash else {
        return Ok(false);
    };
    verify_password(&hash, password)
        .map_err(|e| RepoError::Database(format!("Stored hash for {username} is invalid: {e}")))
}

/// Display name of an admin
pub async fn find_name(pool: &SqlitePool, username: &str) -> RepoResult<Option<String>> {
    let name: Option<String> = sqlx::query_scalar("SELECT name FROM admin WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(name)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_db;

    #[tokio::test]
    async fn test_check_credentials() {
        let (_dir, pool) = test_db().await;
        create(&pool, "chef", "s3cret-pass", "Head Chef").await.unwrap();

        assert!(check(&pool, "chef", "s3cret-pass").await.unwrap());
        assert!(!check(&pool, "chef", "wrong").await.unwrap());
        assert!(!check(&pool, "nobody", "s3cret-pass").await.unwrap());
        assert_eq!(
            find_name(&pool, "chef").await.unwrap().as_deref(),
            Some("Head Chef")
        );
        assert_eq!(count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let (_dir, pool) = test_db().await;
        create(&pool, "chef", "a", "A").await.unwrap();
        assert!(matches!(
            create(&pool, "chef", "b", "B").await,
            Err(RepoError::Duplicate(_))
        ));
    }
}
