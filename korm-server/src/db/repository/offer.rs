//! Special Offer Repository

use super::RepoResult;
use shared::models::{Offer, OfferItem};
use sqlx::SqlitePool;

/// Offers that have not expired at `now` (epoch millis), with their items
pub async fn find_active(pool: &SqlitePool, now: i64) -> RepoResult<Vec<Offer>> {
    let mut offers = sqlx::query_as::<_, Offer>(
        "SELECT id, description, price, expires FROM offer WHERE expires > ? ORDER BY id",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    for offer in &mut offers {
        offer.items = sqlx::query_as::<_, OfferItem>(
            "SELECT kind, quantity FROM offer_item WHERE offer_id = ? ORDER BY kind",
        )
        .bind(offer.id)
        .fetch_all(pool)
        .await?;
    }
    Ok(offers)
}

/// Create an offer together with its items in one transaction
pub async fn create(
    pool: &SqlitePool,
    description: &str,
    price: i64,
    expires: i64,
    items: &[OfferItem],
) -> RepoResult<i64> {
    let mut tx = pool.begin().await?;
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO offer (description, price, expires) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(description)
    .bind(price)
    .bind(expires)
    .fetch_one(&mut *tx)
    .await?;
    for item in items {
        sqlx::query("INSERT INTO offer_item (offer_id, kind, quantity) VALUES (?, ?, ?)")
            .bind(id)
            .bind(item.kind)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(id)
}
